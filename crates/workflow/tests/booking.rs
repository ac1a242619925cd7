mod support;

use std::sync::{Arc, Mutex};

use classify::ErrorKind;
use serde_json::json;
use support::*;
use workflow::{set_workflow_metrics, Operation, TransportError, WorkflowMetrics, WorkflowRun};

fn request() -> serde_json::Value {
    json!({ "segments": [{ "from": "KBP", "to": "AMS", "date": "2024-05-01" }] })
}

#[tokio::test]
async fn created_booking_is_normalized() {
    let transport = ScriptedTransport::new();
    transport.reply(Operation::CreateReservation, booking());

    let bookings = orchestrator(&transport, &ScriptedTerminals::default())
        .create_booking(request(), false)
        .await
        .unwrap();
    assert_eq!(bookings[0].pnr, PNR);
    assert_eq!(transport.payloads(Operation::CreateReservation)[0], request());
}

#[tokio::test]
async fn waitlisted_segment_cancels_partial_record() {
    let transport = ScriptedTransport::new();
    transport
        .fault(
            Operation::CreateReservation,
            fault_with_record("3000", "Booking is not complete due to waitlisted segment"),
        )
        .reply(Operation::CancelRecord, cancelled());

    let err = orchestrator(&transport, &ScriptedTerminals::default())
        .create_booking(request(), true)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::SegmentBookingFailed);
    let payload = &transport.payloads(Operation::CancelRecord)[0];
    assert_eq!(payload["ur_locator"], "UR0009");
    assert_eq!(payload["version"], "0");
}

#[tokio::test]
async fn no_compensation_without_flag() {
    let transport = ScriptedTransport::new();
    transport.fault(
        Operation::CreateReservation,
        fault_with_record("3000", "No valid fare for input criteria"),
    );

    let err = orchestrator(&transport, &ScriptedTerminals::default())
        .create_booking(request(), false)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NoValidFare);
    assert_eq!(transport.calls_to(Operation::CancelRecord), 0);
}

#[tokio::test]
async fn other_kinds_never_compensate() {
    let transport = ScriptedTransport::new();
    transport.fault(
        Operation::CreateReservation,
        fault_with_record("20", "No seats available"),
    );

    let err = orchestrator(&transport, &ScriptedTerminals::default())
        .create_booking(request(), true)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NoSeatsAvailable);
    assert_eq!(transport.calls_to(Operation::CancelRecord), 0);
}

#[tokio::test]
async fn in_band_sell_failure_compensates() {
    let transport = ScriptedTransport::new();
    let mut response = booking();
    response["air:AirSegmentSellFailureInfo"] = json!({
        "air:AirSegmentError": { "air:ErrorMessage": "SEGMENT WAITLISTED" }
    });
    transport
        .reply(Operation::CreateReservation, response)
        .reply(Operation::CancelRecord, cancelled());

    let err = orchestrator(&transport, &ScriptedTerminals::default())
        .create_booking(request(), true)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::SegmentWaitlisted);
    assert_eq!(err.record.as_ref().map(|r| r.ur_locator.as_str()), Some("UR0001"));
    assert_eq!(transport.payloads(Operation::CancelRecord)[0]["ur_locator"], "UR0001");
}

#[tokio::test]
async fn compensation_failure_keeps_original_error() {
    let transport = ScriptedTransport::new();
    transport
        .fault(
            Operation::CreateReservation,
            fault_with_record("3000", "Segment sell failed"),
        )
        .push(
            Operation::CancelRecord,
            Err(TransportError::Other("connection reset".into())),
        );

    let err = orchestrator(&transport, &ScriptedTerminals::default())
        .create_booking(request(), true)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::SegmentBookingFailed);
    assert_eq!(transport.calls_to(Operation::CancelRecord), 1);
}

#[tokio::test]
async fn search_lists_records() {
    let transport = ScriptedTransport::new();
    transport.reply(
        Operation::SearchRecords,
        json!({
            "universal:UniversalRecordSearchResult": [
                { "UniversalRecordLocatorCode": "UR0001", "ProviderLocatorCode": "PNR001" },
                { "UniversalRecordLocatorCode": "UR0002", "ProviderLocatorCode": "PNR002" }
            ]
        }),
    );

    let entries = orchestrator(&transport, &ScriptedTerminals::default())
        .search_bookings(json!({ "last_name": "PETRENKO" }))
        .await
        .unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].pnr, "PNR002");
}

#[tokio::test]
async fn search_without_agreement_names_no_agreement() {
    let transport = ScriptedTransport::new();
    transport.fault(Operation::SearchRecords, fault("345", "Unable to list records"));

    let err = orchestrator(&transport, &ScriptedTerminals::default())
        .search_bookings(json!({}))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NoAgreement);
}

#[tokio::test]
async fn transport_failures_are_typed() {
    let transport = ScriptedTransport::new();
    let err = orchestrator(&transport, &ScriptedTerminals::default())
        .search_bookings(json!({}))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::TransportFailure);
}

#[derive(Default)]
struct RecordingMetrics(Mutex<Vec<(String, Option<ErrorKind>)>>);

impl WorkflowMetrics for RecordingMetrics {
    fn record_workflow(&self, run: &WorkflowRun<'_>) {
        self.0.lock().unwrap().push((run.workflow.to_string(), run.failure));
    }
}

#[tokio::test]
async fn workflows_report_to_the_metrics_hook() {
    let metrics = Arc::new(RecordingMetrics::default());
    set_workflow_metrics(Some(metrics.clone()));

    let transport = ScriptedTransport::new();
    transport.reply(Operation::CreateReservation, booking());
    orchestrator(&transport, &ScriptedTerminals::default())
        .create_booking(request(), false)
        .await
        .unwrap();
    orchestrator(&ScriptedTransport::new(), &ScriptedTerminals::default())
        .cancel(PNR, false)
        .await
        .unwrap_err();
    set_workflow_metrics(None);

    let recorded = metrics.0.lock().unwrap().clone();
    assert!(recorded.contains(&("create_booking".to_string(), None)));
    assert!(recorded.contains(&("cancel".to_string(), Some(ErrorKind::FailedToCancelPnr))));
}
