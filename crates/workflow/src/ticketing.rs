//! Ticket issuance with FOID and PNR-busy recovery.
//!
//! ```text
//! FetchCurrency ──► Ticket ──► Done
//!                    │  ▲
//!        FoidRequired│  │
//!                    ▼  │
//!               ApplyFoid ──► RefetchBooking
//!                    PnrBusy ─┘
//! ```
//!
//! The machine only decides; the orchestrator performs each step and feeds the
//! result back as a [`TicketingEvent`].

use classify::{ClassifiedError, ErrorKind};
use normalize::{CanonicalBooking, RecordAck, TicketingOutcome};

use crate::config::TicketingPolicy;

#[derive(Debug, Clone, PartialEq)]
pub enum TicketingState {
    FetchCurrency,
    Ticket,
    ApplyFoid,
    RefetchBooking,
    Done(TicketingOutcome),
    Failed(ClassifiedError),
}

impl TicketingState {
    pub fn name(&self) -> &'static str {
        match self {
            TicketingState::FetchCurrency => "fetch_currency",
            TicketingState::Ticket => "ticket",
            TicketingState::ApplyFoid => "apply_foid",
            TicketingState::RefetchBooking => "refetch_booking",
            TicketingState::Done(_) => "done",
            TicketingState::Failed(_) => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TicketingState::Done(_) | TicketingState::Failed(_))
    }
}

/// Result of the step the current state asked for.
#[derive(Debug, Clone)]
pub enum TicketingEvent {
    Booking(Result<CanonicalBooking, ClassifiedError>),
    Ticketed(Result<TicketingOutcome, ClassifiedError>),
    FoidApplied(Result<RecordAck, ClassifiedError>),
}

#[derive(Debug, Clone)]
pub struct TicketingMachine {
    policy: TicketingPolicy,
    state: TicketingState,
    booking: Option<CanonicalBooking>,
    currency: Option<String>,
    attempts: u32,
    foid_retries: u32,
    pnr_busy_retries: u32,
}

impl TicketingMachine {
    pub fn new(policy: TicketingPolicy) -> Self {
        Self {
            policy,
            state: TicketingState::FetchCurrency,
            booking: None,
            currency: None,
            attempts: 0,
            foid_retries: 0,
            pnr_busy_retries: 0,
        }
    }

    pub fn state(&self) -> &TicketingState {
        &self.state
    }

    /// Most recently fetched booking.
    pub fn booking(&self) -> Option<&CanonicalBooking> {
        self.booking.as_ref()
    }

    pub fn currency(&self) -> Option<&str> {
        self.currency.as_deref()
    }

    /// Ticket-issue calls made so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn on_event(&mut self, event: TicketingEvent) {
        let state = std::mem::replace(&mut self.state, TicketingState::FetchCurrency);
        self.state = self.transition(state, event);
    }

    fn transition(&mut self, state: TicketingState, event: TicketingEvent) -> TicketingState {
        match (state, event) {
            (TicketingState::FetchCurrency, TicketingEvent::Booking(Ok(booking))) => {
                let currency = booking.pricing_currency();
                self.booking = Some(booking);
                match currency {
                    Some(currency) => {
                        self.currency = Some(currency);
                        TicketingState::Ticket
                    }
                    None => TicketingState::Failed(ClassifiedError::new(
                        ErrorKind::CouldNotRetrieveCurrency,
                        "booking has no priced fare quote",
                    )),
                }
            }
            (TicketingState::RefetchBooking, TicketingEvent::Booking(Ok(booking))) => {
                self.booking = Some(booking);
                TicketingState::Ticket
            }
            (TicketingState::Ticket, TicketingEvent::Ticketed(Ok(outcome))) => {
                self.attempts += 1;
                TicketingState::Done(outcome)
            }
            (TicketingState::Ticket, TicketingEvent::Ticketed(Err(err))) => {
                self.attempts += 1;
                self.after_rejection(err)
            }
            (TicketingState::ApplyFoid, TicketingEvent::FoidApplied(Ok(_))) => {
                TicketingState::RefetchBooking
            }
            (
                TicketingState::FetchCurrency | TicketingState::RefetchBooking,
                TicketingEvent::Booking(Err(err)),
            )
            | (TicketingState::ApplyFoid, TicketingEvent::FoidApplied(Err(err))) => {
                TicketingState::Failed(err)
            }
            (state @ (TicketingState::Done(_) | TicketingState::Failed(_)), _) => state,
            (state, event) => TicketingState::Failed(ClassifiedError::new(
                ErrorKind::UnhandledError,
                format!("ticketing received {event:?} while in {}", state.name()),
            )),
        }
    }

    fn after_rejection(&mut self, err: ClassifiedError) -> TicketingState {
        if self.attempts >= self.policy.max_attempts {
            return TicketingState::Failed(err);
        }
        match err.kind {
            ErrorKind::TicketingFoidRequired if self.foid_retries < self.policy.foid_retries => {
                self.foid_retries += 1;
                TicketingState::ApplyFoid
            }
            ErrorKind::TicketingPnrBusy if self.pnr_busy_retries < self.policy.pnr_busy_retries => {
                self.pnr_busy_retries += 1;
                TicketingState::RefetchBooking
            }
            _ => TicketingState::Failed(err),
        }
    }

    /// Final result; a machine stopped before a terminal state is an error.
    pub fn finish(self) -> Result<TicketingOutcome, ClassifiedError> {
        match self.state {
            TicketingState::Done(outcome) => Ok(outcome),
            TicketingState::Failed(err) => Err(err),
            other => Err(ClassifiedError::new(
                ErrorKind::UnhandledError,
                format!("ticketing stopped in {}", other.name()),
            )),
        }
    }
}
