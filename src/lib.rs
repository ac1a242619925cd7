//! Workspace umbrella crate for uapi-flow.
//!
//! This crate re-exports the document model, the fault classifier, the
//! response normalizer, the terminal screen parser and the workflow
//! orchestrator, and adds YAML configuration plus a few helpers for working
//! with captured documents.

pub mod config;

pub use classify::{
    classify, classify_as, ClassifiedError, ErrorCategory, ErrorKind, FaultView, Profile,
    RecordRef, Verdict,
};
pub use document::{DocumentError, Node, RawDocument, SchemaVersion};
pub use normalize::{
    normalize, CanonicalBooking, CanonicalTicket, Coupon, CouponStatus, FareQuote,
    NormalizeContext, Normalized, Passenger, PnrListEntry, RecordAck, ResponseKind, Segment,
    TicketingOutcome,
};
pub use screen::{
    extract_pnr_locator, extract_ticket_pnr, summarize, PlaceholderSegment, ScreenSummary,
    SegmentLine,
};
pub use workflow::{
    set_workflow_metrics, ImportConfig, Operation, Orchestrator, TerminalError, TerminalFactory,
    TerminalSession, TicketingPolicy, Transport, TransportError, WorkflowConfig, WorkflowMetrics,
    WorkflowRun,
};

pub use crate::config::{ConfigLoadError, FlowConfig, LoggingConfig};

use thiserror::Error;
use tracing::debug;

/// Failure to read a captured document.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("document is not valid JSON: {0}")]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Classified(#[from] ClassifiedError),
}

/// Normalize a captured response document given as JSON text.
pub fn normalize_capture(
    json: &str,
    kind: ResponseKind,
    ctx: &NormalizeContext,
) -> Result<Normalized, CaptureError> {
    let doc = RawDocument::from_json_str(json)?;
    debug!(%kind, "normalizing_capture");
    Ok(normalize(&doc, kind, ctx)?)
}

/// Classify a captured fault document given as JSON text.
///
/// `None` means the fault is the vendor's way of reporting an empty result.
pub fn classify_capture(
    json: &str,
    profile: Profile,
    schema: &SchemaVersion,
) -> Result<Option<ClassifiedError>, CaptureError> {
    let doc = RawDocument::from_json_str(json)?;
    Ok(classify_as(profile, &doc, schema).into_error())
}
