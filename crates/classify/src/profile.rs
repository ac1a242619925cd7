use document::{RawDocument, SchemaVersion};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ClassifiedError, ErrorKind};
use crate::fault::FaultView;
use crate::rules::{
    Rule, Verdict, BOOKING_RULES, PNR_LIST_RULES, STRUCTURED_RULES, TEXT_RULES, TICKETING_RULES,
    TICKET_RETRIEVAL_RULES,
};

/// Which operation produced the fault; selects the override table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    #[default]
    General,
    TicketRetrieval,
    PnrList,
    Ticketing,
    Booking,
}

impl Profile {
    /// Rules evaluated ahead of the shared chain.
    pub fn overrides(self) -> &'static [Rule] {
        match self {
            Profile::General => &[],
            Profile::TicketRetrieval => TICKET_RETRIEVAL_RULES,
            Profile::PnrList => PNR_LIST_RULES,
            Profile::Ticketing => TICKETING_RULES,
            Profile::Booking => BOOKING_RULES,
        }
    }
}

/// Classify a fault document with the shared chain.
///
/// Always yields an error; an empty document becomes
/// [`ErrorKind::UnhandledError`].
pub fn classify(doc: &RawDocument, schema: &SchemaVersion) -> ClassifiedError {
    let fault = FaultView::from_document(doc, schema);
    match classify_view(Profile::General, &fault) {
        Verdict::Error(err) => err,
        Verdict::Empty => unhandled(),
    }
}

/// Classify a fault document under `profile`.
pub fn classify_as(profile: Profile, doc: &RawDocument, schema: &SchemaVersion) -> Verdict {
    classify_view(profile, &FaultView::from_document(doc, schema))
}

/// Run the override table, the structured table, then the text table.
pub fn classify_view(profile: Profile, fault: &FaultView) -> Verdict {
    if let Some(verdict) = run(profile.overrides(), fault) {
        return verdict;
    }
    if let Some(verdict) = run(STRUCTURED_RULES, fault) {
        return verdict;
    }
    if !fault.has_content() {
        debug!(?profile, "fault_without_content");
        return Verdict::Error(unhandled());
    }
    run(TEXT_RULES, fault).unwrap_or_else(|| Verdict::Error(unhandled()))
}

fn run(table: &[Rule], fault: &FaultView) -> Option<Verdict> {
    let rule = table.iter().find(|rule| rule.applies(fault))?;
    let verdict = rule.verdict(fault);
    match &verdict {
        Verdict::Error(err) => debug!(rule = rule.name, kind = %err.kind, "fault_classified"),
        Verdict::Empty => debug!(rule = rule.name, "fault_classified_empty"),
    }
    Some(verdict)
}

fn unhandled() -> ClassifiedError {
    ClassifiedError::new(
        ErrorKind::UnhandledError,
        "vendor response carried no recognizable failure",
    )
}
