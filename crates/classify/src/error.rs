//! The booking error taxonomy shared by every layer above the document.
//!
//! | Category | Raised by |
//! |----------|-----------|
//! | [`Parsing`](ErrorCategory::Parsing) | normalizer, when a success document is malformed |
//! | [`Vendor`](ErrorCategory::Vendor) | classifier, for vendor fault codes and texts |
//! | [`Ticketing`](ErrorCategory::Ticketing) | ticket issuance |
//! | [`Booking`](ErrorCategory::Booking) | reservation creation |
//! | [`Cancellation`](ErrorCategory::Cancellation) | cancellation eligibility |
//! | [`Import`](ErrorCategory::Import) | terminal-driven PNR import |
//! | [`TicketLookup`](ErrorCategory::TicketLookup) | ticket-by-number retrieval |
//! | [`Runtime`](ErrorCategory::Runtime) | collaborator failures and the unhandled fallback |

use std::fmt;

use document::DocumentError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse grouping of [`ErrorKind`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    Parsing,
    Vendor,
    Ticketing,
    Booking,
    Cancellation,
    Import,
    TicketLookup,
    Runtime,
}

/// Every failure the normalization and workflow layers can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ErrorKind {
    // Parsing
    MissingRequiredField,
    HistogramTypeInvalid,
    ReservationProviderInfoMissing,
    InvalidFieldValue,
    // Vendor
    NoSeatsAvailable,
    NoAgreement,
    UnableToRetrieve,
    NoResidualValue,
    TicketsNotIssued,
    NoReservationToImport,
    InvalidRequestData,
    NoResultsFound,
    UnableToRetrieveTicket,
    AccessedByAnotherTransaction,
    VendorServiceError,
    // Ticketing
    TicketingFoidRequired,
    TicketingPnrBusy,
    TicketingFailed,
    CouldNotRetrieveCurrency,
    // Booking
    NoValidFare,
    SegmentBookingFailed,
    SegmentWaitlisted,
    // Cancellation
    #[serde(rename = "PNRHasOpenTickets")]
    PnrHasOpenTickets,
    UnableToCancelTicketStatusNotOpen,
    UnableToCancelTicket,
    UnableToCancelBooking,
    FailedToCancelPnr,
    // Import
    UnableToImportPnr,
    #[serde(rename = "UnableToOpenPNRInTerminal")]
    UnableToOpenPnrInTerminal,
    UnableToAddExtraSegment,
    UnableToSaveBookingWithExtraSegment,
    // Ticket lookup
    UnableToRetrieveTickets,
    DuplicateTicketFound,
    TicketInfoIncomplete,
    TicketNotFound,
    // Runtime
    TransportFailure,
    TerminalFailure,
    UnhandledError,
}

impl ErrorKind {
    pub fn category(self) -> ErrorCategory {
        use ErrorKind::*;
        match self {
            MissingRequiredField
            | HistogramTypeInvalid
            | ReservationProviderInfoMissing
            | InvalidFieldValue => ErrorCategory::Parsing,
            NoSeatsAvailable
            | NoAgreement
            | UnableToRetrieve
            | NoResidualValue
            | TicketsNotIssued
            | NoReservationToImport
            | InvalidRequestData
            | NoResultsFound
            | UnableToRetrieveTicket
            | AccessedByAnotherTransaction
            | VendorServiceError => ErrorCategory::Vendor,
            TicketingFoidRequired
            | TicketingPnrBusy
            | TicketingFailed
            | CouldNotRetrieveCurrency => ErrorCategory::Ticketing,
            NoValidFare | SegmentBookingFailed | SegmentWaitlisted => ErrorCategory::Booking,
            PnrHasOpenTickets
            | UnableToCancelTicketStatusNotOpen
            | UnableToCancelTicket
            | UnableToCancelBooking
            | FailedToCancelPnr => ErrorCategory::Cancellation,
            UnableToImportPnr
            | UnableToOpenPnrInTerminal
            | UnableToAddExtraSegment
            | UnableToSaveBookingWithExtraSegment => ErrorCategory::Import,
            UnableToRetrieveTickets
            | DuplicateTicketFound
            | TicketInfoIncomplete
            | TicketNotFound => ErrorCategory::TicketLookup,
            TransportFailure | TerminalFailure | UnhandledError => ErrorCategory::Runtime,
        }
    }

    /// Name used in logs and serialized errors.
    pub fn as_str(self) -> &'static str {
        use ErrorKind::*;
        match self {
            MissingRequiredField => "MissingRequiredField",
            HistogramTypeInvalid => "HistogramTypeInvalid",
            ReservationProviderInfoMissing => "ReservationProviderInfoMissing",
            InvalidFieldValue => "InvalidFieldValue",
            NoSeatsAvailable => "NoSeatsAvailable",
            NoAgreement => "NoAgreement",
            UnableToRetrieve => "UnableToRetrieve",
            NoResidualValue => "NoResidualValue",
            TicketsNotIssued => "TicketsNotIssued",
            NoReservationToImport => "NoReservationToImport",
            InvalidRequestData => "InvalidRequestData",
            NoResultsFound => "NoResultsFound",
            UnableToRetrieveTicket => "UnableToRetrieveTicket",
            AccessedByAnotherTransaction => "AccessedByAnotherTransaction",
            VendorServiceError => "VendorServiceError",
            TicketingFoidRequired => "TicketingFoidRequired",
            TicketingPnrBusy => "TicketingPnrBusy",
            TicketingFailed => "TicketingFailed",
            CouldNotRetrieveCurrency => "CouldNotRetrieveCurrency",
            NoValidFare => "NoValidFare",
            SegmentBookingFailed => "SegmentBookingFailed",
            SegmentWaitlisted => "SegmentWaitlisted",
            PnrHasOpenTickets => "PNRHasOpenTickets",
            UnableToCancelTicketStatusNotOpen => "UnableToCancelTicketStatusNotOpen",
            UnableToCancelTicket => "UnableToCancelTicket",
            UnableToCancelBooking => "UnableToCancelBooking",
            FailedToCancelPnr => "FailedToCancelPnr",
            UnableToImportPnr => "UnableToImportPnr",
            UnableToOpenPnrInTerminal => "UnableToOpenPNRInTerminal",
            UnableToAddExtraSegment => "UnableToAddExtraSegment",
            UnableToSaveBookingWithExtraSegment => "UnableToSaveBookingWithExtraSegment",
            UnableToRetrieveTickets => "UnableToRetrieveTickets",
            DuplicateTicketFound => "DuplicateTicketFound",
            TicketInfoIncomplete => "TicketInfoIncomplete",
            TicketNotFound => "TicketNotFound",
            TransportFailure => "TransportFailure",
            TerminalFailure => "TerminalFailure",
            UnhandledError => "UnhandledError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Universal record left behind by a partially failed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRef {
    pub ur_locator: String,
    pub version: Option<String>,
}

/// A typed failure, optionally wrapping the failure that caused it.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pcc: Option<String>,
    pub message: String,
    #[source]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caused_by: Option<Box<ClassifiedError>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<RecordRef>,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            vendor_code: None,
            pcc: None,
            message: message.into(),
            caused_by: None,
            record: None,
        }
    }

    /// Wrap `cause` under a workflow-level `kind`.
    pub fn wrap(kind: ErrorKind, message: impl Into<String>, cause: ClassifiedError) -> Self {
        Self::new(kind, message).with_cause(cause)
    }

    pub fn with_vendor_code(mut self, code: impl Into<String>) -> Self {
        self.vendor_code = Some(code.into());
        self
    }

    pub fn with_pcc(mut self, pcc: impl Into<String>) -> Self {
        self.pcc = Some(pcc.into());
        self
    }

    pub fn with_cause(mut self, cause: ClassifiedError) -> Self {
        self.caused_by = Some(Box::new(cause));
        self
    }

    pub fn with_record(mut self, record: RecordRef) -> Self {
        self.record = Some(record);
        self
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    pub fn cause(&self) -> Option<&ClassifiedError> {
        self.caused_by.as_deref()
    }

    /// Innermost error of the `caused_by` chain (`self` when unwrapped).
    pub fn root_cause(&self) -> &ClassifiedError {
        let mut current = self;
        while let Some(next) = current.cause() {
            current = next;
        }
        current
    }

    /// True when `kind` appears anywhere in the chain.
    pub fn chain_contains(&self, kind: ErrorKind) -> bool {
        let mut current = Some(self);
        while let Some(err) = current {
            if err.kind == kind {
                return true;
            }
            current = err.cause();
        }
        false
    }

    /// Ticketing conditions the orchestrator may resolve and retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::TicketingFoidRequired | ErrorKind::TicketingPnrBusy
        )
    }
}

impl From<DocumentError> for ClassifiedError {
    fn from(err: DocumentError) -> Self {
        let kind = match &err {
            DocumentError::MissingField(_) => ErrorKind::MissingRequiredField,
            _ => ErrorKind::InvalidFieldValue,
        };
        ClassifiedError::new(kind, err.to_string())
    }
}
