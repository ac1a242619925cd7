//! Ordered classification tables.
//!
//! Tables run top to bottom and the first rule whose predicate holds decides
//! the outcome. Profiles put their overrides in front of the shared chain.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ClassifiedError, ErrorKind};
use crate::fault::FaultView;

static FOID_REQUIRED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bFOID\b.*\bREQUIRED\b|form of (?:id|identification)\b.*\brequired\b")
        .expect("regex for foid markers")
});

const TICKET_INFO_INCOMPLETE: &str = "ticket information is incomplete";
const WAITLISTED_SEGMENT: &str = "waitlisted segment";

/// Outcome of classifying a fault document.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Error(ClassifiedError),
    /// The vendor reported an empty result through the fault channel.
    Empty,
}

impl Verdict {
    pub fn is_empty(&self) -> bool {
        matches!(self, Verdict::Empty)
    }

    pub fn into_error(self) -> Option<ClassifiedError> {
        match self {
            Verdict::Error(err) => Some(err),
            Verdict::Empty => None,
        }
    }
}

/// One `(name, predicate, classifier)` entry of a table.
pub struct Rule {
    pub name: &'static str,
    predicate: fn(&FaultView) -> bool,
    outcome: fn(&FaultView) -> Verdict,
}

impl Rule {
    pub fn applies(&self, fault: &FaultView) -> bool {
        (self.predicate)(fault)
    }

    pub fn verdict(&self, fault: &FaultView) -> Verdict {
        (self.outcome)(fault)
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

/// Build a vendor error from everything the fault carries.
pub fn vendor_error(kind: ErrorKind, fault: &FaultView) -> ClassifiedError {
    let mut err = ClassifiedError::new(kind, fault.message());
    if let Some(code) = fault.raw_code() {
        err = err.with_vendor_code(code);
    }
    if let Some(pcc) = fault.pcc() {
        err = err.with_pcc(pcc);
    }
    if let Some(record) = fault.record() {
        err = err.with_record(record.clone());
    }
    err
}

fn error(kind: ErrorKind, fault: &FaultView) -> Verdict {
    Verdict::Error(vendor_error(kind, fault))
}

fn code_is(fault: &FaultView, codes: &[u32]) -> bool {
    fault.code().is_some_and(|code| codes.contains(&code))
}

// Structured code dispatch.

fn is_no_seats(f: &FaultView) -> bool {
    code_is(f, &[20])
}
fn no_seats(f: &FaultView) -> Verdict {
    error(ErrorKind::NoSeatsAvailable, f)
}

fn is_agreement_code(f: &FaultView) -> bool {
    code_is(f, &[345, 1512])
}
fn agreement_or_unretrievable(f: &FaultView) -> Verdict {
    match f.pcc() {
        Some(_) => error(ErrorKind::NoAgreement, f),
        None => error(ErrorKind::UnableToRetrieve, f),
    }
}

fn is_no_residual_value(f: &FaultView) -> bool {
    code_is(f, &[4454])
}
fn no_residual_value(f: &FaultView) -> Verdict {
    error(ErrorKind::NoResidualValue, f)
}

fn is_tickets_not_issued(f: &FaultView) -> bool {
    code_is(f, &[12009])
}
fn tickets_not_issued(f: &FaultView) -> Verdict {
    error(ErrorKind::TicketsNotIssued, f)
}

fn is_no_reservation_to_import(f: &FaultView) -> bool {
    code_is(f, &[13003])
}
fn no_reservation_to_import(f: &FaultView) -> Verdict {
    error(ErrorKind::NoReservationToImport, f)
}

fn is_invalid_request_data(f: &FaultView) -> bool {
    code_is(f, &[3003])
}
fn invalid_request_data(f: &FaultView) -> Verdict {
    error(ErrorKind::InvalidRequestData, f)
}

fn is_ticket_info_incomplete(f: &FaultView) -> bool {
    code_is(f, &[3000]) && f.message().trim().eq_ignore_ascii_case(TICKET_INFO_INCOMPLETE)
}
fn ticket_info_incomplete(f: &FaultView) -> Verdict {
    error(ErrorKind::TicketInfoIncomplete, f)
}

fn is_segment_waitlisted(f: &FaultView) -> bool {
    code_is(f, &[3000])
        && f
            .sub_errors()
            .iter()
            .any(|msg| msg.to_ascii_lowercase().contains(WAITLISTED_SEGMENT))
}
fn segment_waitlisted(f: &FaultView) -> Verdict {
    error(ErrorKind::SegmentWaitlisted, f)
}

fn is_segment_failure(f: &FaultView) -> bool {
    code_is(f, &[3000])
}
fn segment_booking_failed(f: &FaultView) -> Verdict {
    error(ErrorKind::SegmentBookingFailed, f)
}

fn is_no_results(f: &FaultView) -> bool {
    code_is(f, &[2602, 3037])
}
fn no_results(f: &FaultView) -> Verdict {
    error(ErrorKind::NoResultsFound, f)
}

/// Exact vendor-code dispatch, in evaluation order.
pub static STRUCTURED_RULES: &[Rule] = &[
    Rule { name: "no_seats_available", predicate: is_no_seats, outcome: no_seats },
    Rule {
        name: "agreement_code",
        predicate: is_agreement_code,
        outcome: agreement_or_unretrievable,
    },
    Rule { name: "no_residual_value", predicate: is_no_residual_value, outcome: no_residual_value },
    Rule {
        name: "tickets_not_issued",
        predicate: is_tickets_not_issued,
        outcome: tickets_not_issued,
    },
    Rule {
        name: "no_reservation_to_import",
        predicate: is_no_reservation_to_import,
        outcome: no_reservation_to_import,
    },
    Rule {
        name: "invalid_request_data",
        predicate: is_invalid_request_data,
        outcome: invalid_request_data,
    },
    Rule {
        name: "ticket_info_incomplete",
        predicate: is_ticket_info_incomplete,
        outcome: ticket_info_incomplete,
    },
    Rule {
        name: "segment_waitlisted",
        predicate: is_segment_waitlisted,
        outcome: segment_waitlisted,
    },
    Rule {
        name: "segment_booking_failed",
        predicate: is_segment_failure,
        outcome: segment_booking_failed,
    },
    Rule { name: "no_results_found", predicate: is_no_results, outcome: no_results },
];

// Free-text fallback.

fn mentions_no_agency_agreement(f: &FaultView) -> bool {
    f.contains_ci("no agency agreement")
}
fn no_agreement(f: &FaultView) -> Verdict {
    error(ErrorKind::NoAgreement, f)
}

fn mentions_unable_to_retrieve(f: &FaultView) -> bool {
    f.contains_ci("unable to retrieve")
}
fn unable_to_retrieve(f: &FaultView) -> Verdict {
    error(ErrorKind::UnableToRetrieve, f)
}

fn mentions_host_error(f: &FaultView) -> bool {
    f.contains_ci("host error during ticket retrieve")
}
fn unable_to_retrieve_ticket(f: &FaultView) -> Verdict {
    error(ErrorKind::UnableToRetrieveTicket, f)
}

fn mentions_another_transaction(f: &FaultView) -> bool {
    f.contains_ci("accessed by another transaction")
}
fn accessed_by_another_transaction(f: &FaultView) -> Verdict {
    error(ErrorKind::AccessedByAnotherTransaction, f)
}

fn always(_: &FaultView) -> bool {
    true
}
fn vendor_service_error(f: &FaultView) -> Verdict {
    error(ErrorKind::VendorServiceError, f)
}

/// Fault-text patterns, in priority order. The last entry always applies.
pub static TEXT_RULES: &[Rule] = &[
    Rule {
        name: "no_agency_agreement",
        predicate: mentions_no_agency_agreement,
        outcome: no_agreement,
    },
    Rule {
        name: "unable_to_retrieve",
        predicate: mentions_unable_to_retrieve,
        outcome: unable_to_retrieve,
    },
    Rule {
        name: "host_error_during_ticket_retrieve",
        predicate: mentions_host_error,
        outcome: unable_to_retrieve_ticket,
    },
    Rule {
        name: "accessed_by_another_transaction",
        predicate: mentions_another_transaction,
        outcome: accessed_by_another_transaction,
    },
    Rule { name: "vendor_service_error", predicate: always, outcome: vendor_service_error },
];

// Ticket retrieval overrides.

fn has_no_tickets(f: &FaultView) -> bool {
    code_is(f, &[3000]) && f.contains_ci("has no tickets")
}
fn empty(_: &FaultView) -> Verdict {
    Verdict::Empty
}

fn is_duplicate_ticket(f: &FaultView) -> bool {
    code_is(f, &[3273]) || f.contains_ci("duplicate ticket")
}
fn duplicate_ticket(f: &FaultView) -> Verdict {
    error(ErrorKind::DuplicateTicketFound, f)
}

pub static TICKET_RETRIEVAL_RULES: &[Rule] = &[
    Rule { name: "record_has_no_tickets", predicate: has_no_tickets, outcome: empty },
    Rule {
        name: "duplicate_ticket_found",
        predicate: is_duplicate_ticket,
        outcome: duplicate_ticket,
    },
];

// PNR list overrides.

fn is_list_agreement_code(f: &FaultView) -> bool {
    code_is(f, &[345])
}

pub static PNR_LIST_RULES: &[Rule] = &[Rule {
    name: "pnr_list_no_agreement",
    predicate: is_list_agreement_code,
    outcome: no_agreement,
}];

// Ticketing overrides.

fn needs_foid(f: &FaultView) -> bool {
    f.matches(&FOID_REQUIRED)
}
fn foid_required(f: &FaultView) -> Verdict {
    error(ErrorKind::TicketingFoidRequired, f)
}

fn is_pnr_busy(f: &FaultView) -> bool {
    f.contains_ci("pnr busy") || f.contains_ci("record locked")
}
fn pnr_busy(f: &FaultView) -> Verdict {
    error(ErrorKind::TicketingPnrBusy, f)
}

pub static TICKETING_RULES: &[Rule] = &[
    Rule { name: "foid_required", predicate: needs_foid, outcome: foid_required },
    Rule { name: "pnr_busy", predicate: is_pnr_busy, outcome: pnr_busy },
];

// Reservation creation overrides.

fn mentions_no_valid_fare(f: &FaultView) -> bool {
    f.contains_ci("no valid fare")
}
fn no_valid_fare(f: &FaultView) -> Verdict {
    error(ErrorKind::NoValidFare, f)
}

pub static BOOKING_RULES: &[Rule] = &[Rule {
    name: "no_valid_fare",
    predicate: mentions_no_valid_fare,
    outcome: no_valid_fare,
}];

#[cfg(test)]
mod tests {
    use super::*;

    fn first_match<'a>(table: &'a [Rule], f: &FaultView) -> Option<&'a Rule> {
        table.iter().find(|rule| rule.applies(f))
    }

    fn kind_of(verdict: Verdict) -> Option<ErrorKind> {
        verdict.into_error().map(|e| e.kind)
    }

    #[test]
    fn structured_table_order_is_stable() {
        let names: Vec<_> = STRUCTURED_RULES.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec![
                "no_seats_available",
                "agreement_code",
                "no_residual_value",
                "tickets_not_issued",
                "no_reservation_to_import",
                "invalid_request_data",
                "ticket_info_incomplete",
                "segment_waitlisted",
                "segment_booking_failed",
                "no_results_found",
            ]
        );
        assert_eq!(TEXT_RULES.last().map(|r| r.name), Some("vendor_service_error"));
    }

    #[test]
    fn code_345_depends_on_pcc() {
        let with_pcc = FaultView::default()
            .with_code("345")
            .with_fault_string("NO AGENCY AGREEMENT EXISTS FOR 7J8J");
        let rule = first_match(STRUCTURED_RULES, &with_pcc).unwrap();
        assert_eq!(rule.name, "agreement_code");
        let err = rule.verdict(&with_pcc).into_error().unwrap();
        assert_eq!(err.kind, ErrorKind::NoAgreement);
        assert_eq!(err.pcc.as_deref(), Some("7J8J"));
        assert_eq!(err.vendor_code.as_deref(), Some("345"));

        let without = FaultView::default().with_code("1512").with_fault_string("Host unavailable");
        assert_eq!(
            kind_of(first_match(STRUCTURED_RULES, &without).unwrap().verdict(&without)),
            Some(ErrorKind::UnableToRetrieve)
        );

        let locator_only = FaultView::default()
            .with_code("345")
            .with_fault_string("UNABLE TO RETRIEVE RECORD FOR PNR ABC123");
        let err = first_match(STRUCTURED_RULES, &locator_only)
            .unwrap()
            .verdict(&locator_only)
            .into_error()
            .unwrap();
        assert_eq!(err.kind, ErrorKind::UnableToRetrieve);
        assert_eq!(err.pcc, None);
    }

    #[test]
    fn code_3000_splits_three_ways() {
        let incomplete = FaultView::default()
            .with_code("3000")
            .with_fault_string("  TICKET INFORMATION IS INCOMPLETE ");
        assert_eq!(
            first_match(STRUCTURED_RULES, &incomplete).unwrap().name,
            "ticket_info_incomplete"
        );

        let waitlisted = FaultView::default()
            .with_code("3000")
            .with_fault_string("Booking failed")
            .with_sub_error("Waitlisted segment not allowed");
        assert_eq!(first_match(STRUCTURED_RULES, &waitlisted).unwrap().name, "segment_waitlisted");

        let failed = FaultView::default()
            .with_code("3000")
            .with_fault_string("Ticket information is incomplete.");
        assert_eq!(first_match(STRUCTURED_RULES, &failed).unwrap().name, "segment_booking_failed");
    }

    #[test]
    fn text_rules_follow_priority() {
        let both = FaultView::default()
            .with_fault_string("Unable to retrieve: record accessed by another transaction");
        assert_eq!(first_match(TEXT_RULES, &both).unwrap().name, "unable_to_retrieve");

        let host = FaultView::default().with_fault_string("HOST ERROR DURING TICKET RETRIEVE");
        assert_eq!(
            kind_of(first_match(TEXT_RULES, &host).unwrap().verdict(&host)),
            Some(ErrorKind::UnableToRetrieveTicket)
        );

        let other = FaultView::default().with_fault_string("Something odd");
        let err = first_match(TEXT_RULES, &other).unwrap().verdict(&other).into_error().unwrap();
        assert_eq!(err.kind, ErrorKind::VendorServiceError);
        assert_eq!(err.message, "Something odd");
    }

    #[test]
    fn ticket_retrieval_overrides() {
        let none =
            FaultView::default().with_code("3000").with_fault_string("Record has no tickets");
        assert!(first_match(TICKET_RETRIEVAL_RULES, &none).unwrap().verdict(&none).is_empty());

        let dup = FaultView::default().with_fault_string("Duplicate ticket number found");
        assert_eq!(
            kind_of(first_match(TICKET_RETRIEVAL_RULES, &dup).unwrap().verdict(&dup)),
            Some(ErrorKind::DuplicateTicketFound)
        );
        let dup_code = FaultView::default().with_code("3273");
        assert!(first_match(TICKET_RETRIEVAL_RULES, &dup_code).is_some());
    }

    #[test]
    fn ticketing_overrides_detect_foid_and_busy() {
        let foid = FaultView::default().with_response_message("FOID REQUIRED FOR CARRIER PS");
        assert_eq!(first_match(TICKETING_RULES, &foid).unwrap().name, "foid_required");
        let form = FaultView::default().with_response_message("Form of identification is required");
        assert_eq!(first_match(TICKETING_RULES, &form).unwrap().name, "foid_required");

        let busy = FaultView::default().with_response_message("UNABLE TO TICKET - RECORD LOCKED");
        assert_eq!(first_match(TICKETING_RULES, &busy).unwrap().name, "pnr_busy");
        let plain = FaultView::default().with_response_message("NO FARES");
        assert!(first_match(TICKETING_RULES, &plain).is_none());
    }
}
