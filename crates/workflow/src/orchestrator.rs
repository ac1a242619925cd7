use std::sync::Arc;
use std::time::Instant;

use classify::{classify_as, ClassifiedError, ErrorKind, RecordRef, Verdict};
use document::RawDocument;
use normalize::{
    normalize_cancel, normalize_create_reservation, normalize_pnr_list, normalize_record_ack,
    normalize_ticket, normalize_ticketing, normalize_tickets, normalize_universal_record,
    normalize_void, CanonicalBooking, CanonicalTicket, PnrListEntry, RecordAck, TicketingOutcome,
};
use screen::extract_ticket_pnr;
use serde_json::{json, Value};
use tracing::{debug, info, warn, Instrument, Level};

use crate::cancel::CancellationPlan;
use crate::config::{ConfigError, WorkflowConfig};
use crate::error::{TerminalError, TransportError};
use crate::import::{ImportMachine, ImportStep};
use crate::metrics::{report, WorkflowRun};
use crate::ticketing::{TicketingEvent, TicketingMachine, TicketingState};
use crate::transport::{Operation, TerminalFactory, TerminalSession, Transport};

/// Drives booking workflows over a [`Transport`] and a [`TerminalFactory`].
///
/// Every public method is one logical operation made of sequential awaits;
/// nothing is shared between calls except the collaborators and the config.
pub struct Orchestrator {
    transport: Arc<dyn Transport>,
    terminals: Arc<dyn TerminalFactory>,
    config: WorkflowConfig,
}

impl Orchestrator {
    pub fn new(transport: Arc<dyn Transport>, terminals: Arc<dyn TerminalFactory>) -> Self {
        Self {
            transport,
            terminals,
            config: WorkflowConfig::default(),
        }
    }

    /// Replace the configuration after validating it.
    pub fn with_config(mut self, config: WorkflowConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Fetch the booking for `pnr`, importing it through the terminal when the
    /// vendor has no universal record for it yet.
    pub async fn get_booking(&self, pnr: &str) -> Result<CanonicalBooking, ClassifiedError> {
        let bookings = match self.retrieve_record(pnr).await {
            Err(err) if err.kind == ErrorKind::NoReservationToImport => {
                debug!(pnr, "record_not_importable_falling_back_to_terminal");
                self.import_pnr(pnr).await?
            }
            other => other?,
        };
        pick_booking(bookings, pnr)
    }

    /// Issue tickets for `pnr`.
    pub async fn ticket(&self, pnr: &str) -> Result<TicketingOutcome, ClassifiedError> {
        let span = tracing::span!(Level::INFO, "workflow.ticket", pnr = %pnr);
        let start = Instant::now();
        let result = self.run_ticketing(pnr).instrument(span.clone()).await;
        span.in_scope(|| finished("ticket", start, &result));
        result
    }

    async fn run_ticketing(&self, pnr: &str) -> Result<TicketingOutcome, ClassifiedError> {
        let mut machine = TicketingMachine::new(self.config.ticketing);
        loop {
            debug!(state = machine.state().name(), attempt = machine.attempts(), "ticketing_step");
            let event = match machine.state() {
                TicketingState::FetchCurrency | TicketingState::RefetchBooking => {
                    TicketingEvent::Booking(self.get_booking(pnr).await)
                }
                TicketingState::Ticket => {
                    let currency = machine.currency().unwrap_or_default().to_string();
                    TicketingEvent::Ticketed(self.issue_tickets(pnr, &currency).await)
                }
                TicketingState::ApplyFoid => {
                    TicketingEvent::FoidApplied(self.apply_foid(pnr, machine.booking()).await)
                }
                TicketingState::Done(_) | TicketingState::Failed(_) => break,
            };
            machine.on_event(event);
        }
        machine.finish()
    }

    async fn issue_tickets(
        &self,
        pnr: &str,
        currency: &str,
    ) -> Result<TicketingOutcome, ClassifiedError> {
        let doc = self
            .request(Operation::Ticket, json!({ "pnr": pnr, "currency": currency }))
            .await?;
        normalize_ticketing(&doc, &self.config.normalize)
    }

    async fn apply_foid(
        &self,
        pnr: &str,
        booking: Option<&CanonicalBooking>,
    ) -> Result<RecordAck, ClassifiedError> {
        let mut payload = json!({ "pnr": pnr });
        if let Some(booking) = booking {
            payload["ur_locator"] = json!(booking.uapi_ur_locator);
            payload["version"] = json!(booking.version);
            payload["passengers"] = json!(booking
                .passengers
                .iter()
                .map(|p| p.key.as_str())
                .collect::<Vec<_>>());
        }
        let doc = self.request(Operation::ApplyFoid, payload).await?;
        normalize_record_ack(&doc, &self.config.normalize)
    }

    /// Cancel the booking for `pnr`, voiding open tickets when `cancel_tickets` is set.
    ///
    /// Every failure is reported as [`ErrorKind::FailedToCancelPnr`] with the
    /// underlying error as its cause.
    pub async fn cancel(
        &self,
        pnr: &str,
        cancel_tickets: bool,
    ) -> Result<RecordAck, ClassifiedError> {
        let span = tracing::span!(Level::INFO, "workflow.cancel", pnr = %pnr, cancel_tickets);
        let start = Instant::now();
        let result = self
            .run_cancel(pnr, cancel_tickets)
            .instrument(span.clone())
            .await
            .map_err(|cause| {
                ClassifiedError::wrap(
                    ErrorKind::FailedToCancelPnr,
                    format!("failed to cancel {pnr}"),
                    cause,
                )
            });
        span.in_scope(|| finished("cancel", start, &result));
        result
    }

    async fn run_cancel(
        &self,
        pnr: &str,
        cancel_tickets: bool,
    ) -> Result<RecordAck, ClassifiedError> {
        let booking = self.get_booking(pnr).await?;
        let tickets = self.tickets_of(&booking).await?;
        let plan = CancellationPlan::decide(&tickets, cancel_tickets)?;
        debug!(stage = "plan", ?plan, "cancellation_planned");

        let booking = match &plan {
            CancellationPlan::CancelBooking => booking,
            CancellationPlan::VoidThenCancel { tickets } => {
                for number in tickets {
                    debug!(stage = "void", ticket = %number, "voiding_ticket");
                    let payload = json!({ "pnr": pnr, "ticket_number": number });
                    let doc = self.request(Operation::VoidTicket, payload).await?;
                    normalize_void(&doc, &self.config.normalize)?;
                }
                self.get_booking(pnr).await?
            }
        };

        debug!(stage = "cancel_record", ur = %booking.uapi_ur_locator, "cancelling_record");
        self.cancel_record(&booking.uapi_ur_locator, Some(booking.version.to_string()))
            .await
    }

    async fn cancel_record(
        &self,
        ur_locator: &str,
        version: Option<String>,
    ) -> Result<RecordAck, ClassifiedError> {
        let doc = self
            .request(
                Operation::CancelRecord,
                json!({ "ur_locator": ur_locator, "version": version }),
            )
            .await?;
        normalize_cancel(&doc, &self.config.normalize)
    }

    /// Make `pnr` importable through the terminal and return the imported record.
    ///
    /// The session is closed exactly once whatever happens.
    pub async fn import_pnr(&self, pnr: &str) -> Result<Vec<CanonicalBooking>, ClassifiedError> {
        let span = tracing::span!(Level::INFO, "workflow.import", pnr = %pnr);
        let start = Instant::now();
        let result = self.run_import_session(pnr).instrument(span.clone()).await;
        span.in_scope(|| finished("import", start, &result));
        result
    }

    async fn run_import_session(
        &self,
        pnr: &str,
    ) -> Result<Vec<CanonicalBooking>, ClassifiedError> {
        let mut session = self.terminals.open().await.map_err(|err| {
            ClassifiedError::wrap(
                ErrorKind::UnableToImportPnr,
                format!("unable to import {pnr}"),
                err.into(),
            )
        })?;
        let result = self.run_import(session.as_mut(), pnr).await;
        let closed = session.close_session().await;
        settle_session(result, closed)
    }

    async fn run_import(
        &self,
        session: &mut dyn TerminalSession,
        pnr: &str,
    ) -> Result<Vec<CanonicalBooking>, ClassifiedError> {
        let import = &self.config.import;
        let mut machine = ImportMachine::new(pnr, import.segment(), import.save_commands());
        loop {
            let stage = machine.state().stage.name();
            match machine.next_step() {
                ImportStep::Command(command) => {
                    debug!(stage, command = %command, "import_command");
                    let screen = session
                        .execute_command(&command)
                        .await
                        .map_err(ClassifiedError::from);
                    machine.on_screen(screen);
                }
                ImportStep::Retrieve => {
                    let attempt = machine.state().retrieval_attempts + 1;
                    debug!(stage, attempt, "import_retrieve");
                    machine.on_record(self.retrieve_record(pnr).await);
                }
                ImportStep::Finished => break,
            }
        }
        machine.finish()
    }

    /// Fetch a ticket by number.
    ///
    /// Duplicate-ticket answers are resolved through the terminal ticket
    /// display; incomplete ticket data triggers a booking import and one retry.
    pub async fn get_ticket(&self, number: &str) -> Result<CanonicalTicket, ClassifiedError> {
        let span = tracing::span!(Level::INFO, "workflow.get_ticket", ticket = %number);
        let start = Instant::now();
        let result = self.run_get_ticket(number).instrument(span.clone()).await;
        span.in_scope(|| finished("get_ticket", start, &result));
        result
    }

    async fn run_get_ticket(&self, number: &str) -> Result<CanonicalTicket, ClassifiedError> {
        match self.retrieve_ticket(number).await {
            Err(err) if err.kind == ErrorKind::DuplicateTicketFound => {
                debug!(stage = "duplicate", "resolving_ticket_through_terminal");
                self.ticket_through_terminal(number).await.map_err(|cause| {
                    ClassifiedError::wrap(
                        ErrorKind::UnableToRetrieveTickets,
                        format!("unable to resolve duplicate ticket {number}"),
                        cause,
                    )
                })
            }
            Err(err) if err.kind == ErrorKind::TicketInfoIncomplete => {
                debug!(stage = "incomplete", "importing_booking_before_retry");
                let pnr = self.terminal_ticket_pnr(number).await?;
                self.get_booking(&pnr).await?;
                self.retrieve_ticket(number).await
            }
            other => other,
        }
    }

    async fn retrieve_ticket(&self, number: &str) -> Result<CanonicalTicket, ClassifiedError> {
        let doc = self
            .fetch(Operation::RetrieveTicket, json!({ "ticket_number": number }))
            .await?
            .ok_or_else(|| {
                ClassifiedError::new(
                    ErrorKind::TicketNotFound,
                    format!("ticket {number} not found"),
                )
            })?;
        normalize_ticket(&doc, &self.config.normalize)
    }

    async fn ticket_through_terminal(
        &self,
        number: &str,
    ) -> Result<CanonicalTicket, ClassifiedError> {
        let pnr = self.terminal_ticket_pnr(number).await?;
        let booking = self.get_booking(&pnr).await?;
        self.tickets_of(&booking)
            .await?
            .into_iter()
            .find(|ticket| ticket.ticket_number == number)
            .ok_or_else(|| {
                ClassifiedError::new(
                    ErrorKind::TicketNotFound,
                    format!("ticket {number} is not among the tickets of {pnr}"),
                )
            })
    }

    /// Record locator of the booking a ticket belongs to, from `*TE/<number>`.
    async fn terminal_ticket_pnr(&self, number: &str) -> Result<String, ClassifiedError> {
        let mut session = self.terminals.open().await.map_err(ClassifiedError::from)?;
        let screen = session
            .execute_command(&format!("*TE/{number}"))
            .await
            .map_err(ClassifiedError::from);
        let closed = session.close_session().await;
        let screen = settle_session(screen, closed)?;
        extract_ticket_pnr(&screen).ok_or_else(|| {
            ClassifiedError::new(
                ErrorKind::TicketNotFound,
                format!("ticket display for {number} names no record locator"),
            )
        })
    }

    /// Every ticket issued for `booking`; a booking without tickets yields none.
    pub async fn tickets_of(
        &self,
        booking: &CanonicalBooking,
    ) -> Result<Vec<CanonicalTicket>, ClassifiedError> {
        let payload = json!({ "pnr": booking.pnr, "ur_locator": booking.uapi_ur_locator });
        match self.fetch(Operation::RetrieveTickets, payload).await? {
            Some(doc) => normalize_tickets(&doc, &self.config.normalize),
            None => Ok(Vec::new()),
        }
    }

    /// Create a reservation.
    ///
    /// When the vendor created a record but could not book every segment, and
    /// `allow_waitlist` is set, that record is cancelled before the error is
    /// returned.
    pub async fn create_booking(
        &self,
        payload: Value,
        allow_waitlist: bool,
    ) -> Result<Vec<CanonicalBooking>, ClassifiedError> {
        let span = tracing::span!(Level::INFO, "workflow.create_booking", allow_waitlist);
        let start = Instant::now();
        let result = self
            .run_create_booking(payload, allow_waitlist)
            .instrument(span.clone())
            .await;
        span.in_scope(|| finished("create_booking", start, &result));
        result
    }

    async fn run_create_booking(
        &self,
        payload: Value,
        allow_waitlist: bool,
    ) -> Result<Vec<CanonicalBooking>, ClassifiedError> {
        let created = match self.request(Operation::CreateReservation, payload).await {
            Ok(doc) => normalize_create_reservation(&doc, &self.config.normalize),
            Err(err) => Err(err),
        };
        let err = match created {
            Ok(bookings) => return Ok(bookings),
            Err(err) => err,
        };
        if allow_waitlist && needs_compensation(err.kind) {
            if let Some(record) = &err.record {
                self.compensate(record).await;
            }
        }
        Err(err)
    }

    async fn compensate(&self, record: &RecordRef) {
        debug!(stage = "compensate", ur = %record.ur_locator, "cancelling_partial_record");
        if let Err(err) = self.cancel_record(&record.ur_locator, record.version.clone()).await {
            warn!(
                ur = %record.ur_locator,
                error = %err,
                error_kind = %err.kind,
                "compensation_failed"
            );
        }
    }

    /// Search universal records.
    pub async fn search_bookings(
        &self,
        payload: Value,
    ) -> Result<Vec<PnrListEntry>, ClassifiedError> {
        match self.fetch(Operation::SearchRecords, payload).await? {
            Some(doc) => normalize_pnr_list(&doc, &self.config.normalize),
            None => Ok(Vec::new()),
        }
    }

    async fn retrieve_record(&self, pnr: &str) -> Result<Vec<CanonicalBooking>, ClassifiedError> {
        let doc = self.request(Operation::ImportRecord, json!({ "pnr": pnr })).await?;
        normalize_universal_record(&doc, &self.config.normalize)
    }

    /// Like [`Orchestrator::fetch`] but an empty answer is an error.
    async fn request(
        &self,
        operation: Operation,
        payload: Value,
    ) -> Result<RawDocument, ClassifiedError> {
        self.fetch(operation, payload).await?.ok_or_else(|| {
            ClassifiedError::new(
                ErrorKind::UnhandledError,
                format!("{operation} returned an empty result"),
            )
        })
    }

    /// Call the transport, classifying faults with the operation's profile.
    ///
    /// `Ok(None)` is a fault the profile reads as an empty result.
    async fn fetch(
        &self,
        operation: Operation,
        payload: Value,
    ) -> Result<Option<RawDocument>, ClassifiedError> {
        debug!(%operation, "transport_call");
        match self.transport.call(operation, payload).await {
            Ok(doc) => Ok(Some(doc)),
            Err(TransportError::Fault(doc)) => {
                match classify_as(operation.profile(), &doc, &self.config.normalize.schema) {
                    Verdict::Error(err) => Err(err),
                    Verdict::Empty => Ok(None),
                }
            }
            Err(TransportError::Other(message)) => Err(ClassifiedError::new(
                ErrorKind::TransportFailure,
                format!("{operation}: {message}"),
            )),
        }
    }
}

fn pick_booking(
    bookings: Vec<CanonicalBooking>,
    pnr: &str,
) -> Result<CanonicalBooking, ClassifiedError> {
    bookings.into_iter().find(|b| b.pnr == pnr).ok_or_else(|| {
        ClassifiedError::new(
            ErrorKind::UnableToRetrieve,
            format!("universal record has no reservation for {pnr}"),
        )
    })
}

fn needs_compensation(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::NoValidFare | ErrorKind::SegmentBookingFailed | ErrorKind::SegmentWaitlisted
    )
}

/// Combine a session's work with the outcome of closing it.
///
/// A failed close only surfaces when the work itself succeeded.
fn settle_session<T>(
    result: Result<T, ClassifiedError>,
    closed: Result<bool, TerminalError>,
) -> Result<T, ClassifiedError> {
    let close_failure = match closed {
        Ok(true) => None,
        Ok(false) => Some(ClassifiedError::new(
            ErrorKind::TerminalFailure,
            "terminal session close was not acknowledged",
        )),
        Err(err) => Some(ClassifiedError::from(err)),
    };
    match (result, close_failure) {
        (result, None) => result,
        (Ok(_), Some(close)) => Err(close),
        (Err(err), Some(close)) => {
            warn!(error = %close, "terminal_close_failed");
            Err(err)
        }
    }
}

fn finished<T>(workflow: &'static str, start: Instant, result: &Result<T, ClassifiedError>) {
    let latency = start.elapsed();
    match result {
        Ok(_) => info!(elapsed_micros = latency.as_micros(), "workflow_success"),
        Err(err) => warn!(
            elapsed_micros = latency.as_micros(),
            error = %err,
            error_kind = %err.kind,
            root_cause = %err.root_cause().kind,
            "workflow_failure"
        ),
    }
    report(&WorkflowRun { workflow, latency, failure: result.as_ref().err().map(|err| err.kind) });
}
