//! Collaborators the orchestrator drives.
//!
//! Request construction, wire encoding and connection management live behind
//! these traits. The orchestrator only names an [`Operation`] and hands over a
//! small JSON payload of locators and numbers.

use std::fmt;

use async_trait::async_trait;
use classify::Profile;
use document::RawDocument;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{TerminalError, TransportError};

/// Vendor request issued by a workflow step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    RetrieveRecord,
    ImportRecord,
    Ticket,
    ApplyFoid,
    RetrieveTicket,
    RetrieveTickets,
    VoidTicket,
    CancelRecord,
    CreateReservation,
    SearchRecords,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::RetrieveRecord => "retrieve_record",
            Operation::ImportRecord => "import_record",
            Operation::Ticket => "ticket",
            Operation::ApplyFoid => "apply_foid",
            Operation::RetrieveTicket => "retrieve_ticket",
            Operation::RetrieveTickets => "retrieve_tickets",
            Operation::VoidTicket => "void_ticket",
            Operation::CancelRecord => "cancel_record",
            Operation::CreateReservation => "create_reservation",
            Operation::SearchRecords => "search_records",
        }
    }

    /// Classification profile for faults returned by this operation.
    pub fn profile(self) -> Profile {
        match self {
            Operation::RetrieveTicket | Operation::RetrieveTickets => Profile::TicketRetrieval,
            Operation::SearchRecords => Profile::PnrList,
            Operation::Ticket | Operation::ApplyFoid => Profile::Ticketing,
            Operation::CreateReservation => Profile::Booking,
            _ => Profile::General,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sends one vendor request and returns the decoded response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(
        &self,
        operation: Operation,
        payload: Value,
    ) -> Result<RawDocument, TransportError>;
}

/// Opens terminal-emulation sessions.
#[async_trait]
pub trait TerminalFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn TerminalSession>, TerminalError>;
}

/// One terminal-emulation session. Callers close it exactly once.
#[async_trait]
pub trait TerminalSession: Send {
    /// Run a host command and return the screen text it produced.
    async fn execute_command(&mut self, command: &str) -> Result<String, TerminalError>;

    /// End the session. `Ok(false)` means the host refused to close it.
    async fn close_session(&mut self) -> Result<bool, TerminalError>;
}
