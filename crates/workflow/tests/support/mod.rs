//! Scripted collaborators and vendor documents for workflow tests.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use document::RawDocument;
use serde_json::{json, Value};
use workflow::{
    ImportConfig, Operation, Orchestrator, TerminalError, TerminalFactory, TerminalSession,
    Transport, TransportError, WorkflowConfig,
};

pub const PNR: &str = "PNR001";
pub const SEGMENT_LINE: &str = "1. OK OPEN Y  12JUN DOHODM NO1";

/// Answers each operation from its own queue, recording every call.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<HashMap<Operation, VecDeque<Result<RawDocument, TransportError>>>>,
    calls: Mutex<Vec<(Operation, Value)>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, operation: Operation, doc: Value) -> &Self {
        self.push(operation, Ok(RawDocument::new(doc)))
    }

    pub fn fault(&self, operation: Operation, doc: Value) -> &Self {
        self.push(operation, Err(TransportError::Fault(RawDocument::new(doc))))
    }

    pub fn push(
        &self,
        operation: Operation,
        response: Result<RawDocument, TransportError>,
    ) -> &Self {
        self.script
            .lock()
            .unwrap()
            .entry(operation)
            .or_default()
            .push_back(response);
        self
    }

    pub fn calls_to(&self, operation: Operation) -> usize {
        self.payloads(operation).len()
    }

    pub fn payloads(&self, operation: Operation) -> Vec<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(op, _)| *op == operation)
            .map(|(_, payload)| payload.clone())
            .collect()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn call(
        &self,
        operation: Operation,
        payload: Value,
    ) -> Result<RawDocument, TransportError> {
        self.calls.lock().unwrap().push((operation, payload));
        self.script
            .lock()
            .unwrap()
            .get_mut(&operation)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Err(TransportError::Other(format!("no scripted reply for {operation}")))
            })
    }
}

#[derive(Default)]
pub struct TerminalLog {
    screens: Mutex<VecDeque<Result<String, TerminalError>>>,
    commands: Mutex<Vec<String>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
    close_result: Mutex<Option<Result<bool, TerminalError>>>,
}

/// Terminal factory whose sessions replay a fixed list of screens.
#[derive(Clone, Default)]
pub struct ScriptedTerminals(Arc<TerminalLog>);

impl ScriptedTerminals {
    pub fn with_screens(screens: &[&str]) -> Self {
        let terminals = Self::default();
        for screen in screens {
            terminals.push(Ok(screen.to_string()));
        }
        terminals
    }

    pub fn push(&self, screen: Result<String, TerminalError>) {
        self.0.screens.lock().unwrap().push_back(screen);
    }

    pub fn close_with(&self, result: Result<bool, TerminalError>) {
        *self.0.close_result.lock().unwrap() = Some(result);
    }

    pub fn commands(&self) -> Vec<String> {
        self.0.commands.lock().unwrap().clone()
    }

    pub fn opened(&self) -> usize {
        self.0.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.0.closed.load(Ordering::SeqCst)
    }
}

struct ScriptedSession(Arc<TerminalLog>);

#[async_trait]
impl TerminalFactory for ScriptedTerminals {
    async fn open(&self) -> Result<Box<dyn TerminalSession>, TerminalError> {
        self.0.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession(Arc::clone(&self.0))))
    }
}

#[async_trait]
impl TerminalSession for ScriptedSession {
    async fn execute_command(&mut self, command: &str) -> Result<String, TerminalError> {
        self.0.commands.lock().unwrap().push(command.to_string());
        self.0
            .screens
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(String::new()))
    }

    async fn close_session(&mut self) -> Result<bool, TerminalError> {
        self.0.closed.fetch_add(1, Ordering::SeqCst);
        self.0.close_result.lock().unwrap().clone().unwrap_or(Ok(true))
    }
}

/// Orchestrator over the scripted collaborators, with the placeholder
/// segment pinned to 12 June 2024.
pub fn orchestrator(
    transport: &Arc<ScriptedTransport>,
    terminals: &ScriptedTerminals,
) -> Orchestrator {
    let config = WorkflowConfig {
        import: ImportConfig::default().with_date(NaiveDate::from_ymd_opt(2024, 6, 12).unwrap()),
        ..WorkflowConfig::default()
    };
    Orchestrator::new(transport.clone(), Arc::new(terminals.clone()))
        .with_config(config)
        .unwrap()
}

pub fn import_screens() -> Vec<String> {
    vec![
        format!("{PNR}/"),
        SEGMENT_LINE.to_string(),
        "true".to_string(),
        "true".to_string(),
        format!("{PNR}/\n{SEGMENT_LINE}"),
    ]
}

pub fn universal_record(pnr: &str, total_price: Option<&str>) -> Value {
    let mut reservation = json!({
        "LocatorCode": "AR0001",
        "CreateDate": "2024-04-10T10:00:00.000+00:00",
        "ModifiedDate": "2024-04-10T10:05:00.000+00:00",
        "common_v52_0:ProviderReservationInfoRef": { "Key": "PR1" },
        "air:AirSegment": {
            "Key": "S1",
            "Group": "0",
            "Carrier": "PS",
            "FlightNumber": "101",
            "Origin": "KBP",
            "Destination": "AMS",
            "DepartureTime": "2024-05-01T07:40:00.000+03:00",
            "ArrivalTime": "2024-05-01T09:55:00.000+02:00",
            "ClassOfService": "Y",
            "Status": "HK"
        }
    });
    if let Some(total) = total_price {
        reservation["air:AirPricingInfo"] = json!({
            "Key": "P1",
            "TotalPrice": total,
            "air:PassengerType": { "Code": "ADT", "BookingTravelerRef": "BT1" }
        });
    }
    json!({
        "universal:UniversalRecord": {
            "LocatorCode": "UR0001",
            "Version": "3",
            "common_v52_0:BookingTraveler": {
                "Key": "BT1",
                "TravelerType": "ADT",
                "common_v52_0:BookingTravelerName": { "First": "IVAN", "Last": "PETRENKO" }
            },
            "universal:ProviderReservationInfo": {
                "Key": "PR1",
                "ProviderCode": "1G",
                "LocatorCode": pnr
            },
            "air:AirReservation": reservation
        }
    })
}

pub fn booking() -> Value {
    universal_record(PNR, Some("UAH12000"))
}

/// `statuses` is a space-separated list of coupon status codes.
fn etr(number: &str, statuses: &str) -> Value {
    json!({
        "ProviderLocatorCode": PNR,
        "UniversalRecordLocatorCode": "UR0001",
        "TotalPrice": "UAH12000",
        "common_v52_0:BookingTraveler": {
            "Key": "BT1",
            "TravelerType": "ADT",
            "common_v52_0:BookingTravelerName": { "First": "IVAN", "Last": "PETRENKO" }
        },
        "air:Ticket": {
            "TicketNumber": number,
            "air:Coupon": statuses
                .split_whitespace()
                .enumerate()
                .map(|(i, status)| json!({
                    "CouponNumber": (i + 1).to_string(),
                    "Origin": "KBP",
                    "Destination": "AMS",
                    "Status": status
                }))
                .collect::<Vec<_>>()
        }
    })
}

/// A ticket list with one record per `(number, coupon statuses)` entry.
pub fn tickets(entries: &[(&str, &str)]) -> Value {
    json!({
        "air:ETR": entries
            .iter()
            .map(|(number, statuses)| etr(number, statuses))
            .collect::<Vec<_>>()
    })
}

pub fn single_ticket(number: &str) -> Value {
    json!({ "air:ETR": etr(number, "O") })
}

pub fn issued(number: &str) -> Value {
    single_ticket(number)
}

pub fn ticket_rejection(message: &str) -> Value {
    json!({ "air:TicketFailureInfo": { "Message": message } })
}

pub fn ack() -> Value {
    json!({ "universal:UniversalRecord": { "LocatorCode": "UR0001" } })
}

pub fn voided(number: &str) -> Value {
    json!({ "air:VoidResultInfo": { "DocumentNumber": number, "ResultType": "Success" } })
}

pub fn cancelled() -> Value {
    json!({ "universal:ProviderReservationStatus": { "LocatorCode": PNR, "Cancelled": "true" } })
}

pub fn fault(code: &str, text: &str) -> Value {
    json!({
        "SOAP:Fault": {
            "faultcode": "Server.Business",
            "faultstring": text,
            "detail": { "common_v52_0:ErrorInfo": { "common_v52_0:Code": code } }
        }
    })
}

/// A fault that also references the universal record it left behind.
pub fn fault_with_record(code: &str, text: &str) -> Value {
    let mut doc = fault(code, text);
    doc["SOAP:Fault"]["detail"]["universal:UniversalRecord"] =
        json!({ "LocatorCode": "UR0009", "Version": "0" });
    doc
}
