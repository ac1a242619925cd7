//! Responses to modifying requests, which report failures in-band.

use std::time::Instant;

use classify::{
    classify_view, vendor_error, ClassifiedError, ErrorCategory, ErrorKind, FaultView, Profile,
    RecordRef, Verdict,
};
use document::{tags, Node, RawDocument};

use crate::booking::bookings_of;
use crate::context::{NormalizeContext, ResponseKind};
use crate::fields::{flag, optional, required};
use crate::model::{CanonicalBooking, PnrListEntry, RecordAck, TicketingOutcome};
use crate::ticket::etrs_to_tickets;
use crate::traced;

const VOID_SUCCESS: &str = "Success";

/// Normalize a ticket issuance response.
///
/// Failure infos and error messages are classified with the ticketing profile;
/// anything not specific to ticketing becomes [`ErrorKind::TicketingFailed`].
pub fn normalize_ticketing(
    doc: &RawDocument,
    ctx: &NormalizeContext,
) -> Result<TicketingOutcome, ClassifiedError> {
    traced(ResponseKind::Ticketing, Instant::now(), normalize_ticketing_inner(doc, ctx))
}

fn normalize_ticketing_inner(
    doc: &RawDocument,
    ctx: &NormalizeContext,
) -> Result<TicketingOutcome, ClassifiedError> {
    let root = doc.root(&ctx.schema);
    let failures = root.children(tags::TICKET_FAILURE_INFO);
    let etrs = root.children(tags::ETR);

    if !failures.is_empty() || (etrs.is_empty() && FaultView::from_node(root).has_content()) {
        let mut fault = FaultView::from_node(root);
        for failure in &failures {
            let message = optional(failure, "Message")
                .or_else(|| failure.text().map(|t| t.into_owned()));
            if let Some(message) = message {
                fault = fault.with_response_message(message);
            }
            if fault.raw_code().is_none() {
                if let Some(code) = optional(failure, "Code") {
                    fault = fault.with_code(code);
                }
            }
        }
        return Err(ticketing_error(&fault));
    }

    let tickets = etrs_to_tickets(&etrs)?;
    if tickets.is_empty() {
        return Err(ClassifiedError::new(
            ErrorKind::TicketingFailed,
            "ticketing response carried no tickets",
        ));
    }
    Ok(TicketingOutcome {
        pnr: tickets.first().map(|t| t.pnr.clone()),
        ticket_numbers: tickets.into_iter().map(|t| t.ticket_number).collect(),
    })
}

fn ticketing_error(fault: &FaultView) -> ClassifiedError {
    match classify_view(Profile::Ticketing, fault) {
        Verdict::Error(err) if err.category() == ErrorCategory::Ticketing => err,
        Verdict::Error(err) if err.kind == ErrorKind::VendorServiceError => {
            ClassifiedError { kind: ErrorKind::TicketingFailed, ..err }
        }
        Verdict::Error(err) => err,
        Verdict::Empty => vendor_error(ErrorKind::TicketingFailed, fault),
    }
}

/// Normalize a ticket void response.
pub fn normalize_void(
    doc: &RawDocument,
    ctx: &NormalizeContext,
) -> Result<RecordAck, ClassifiedError> {
    traced(ResponseKind::Void, Instant::now(), normalize_void_inner(doc, ctx))
}

fn normalize_void_inner(
    doc: &RawDocument,
    ctx: &NormalizeContext,
) -> Result<RecordAck, ClassifiedError> {
    let root = doc.root(&ctx.schema);
    let results = root.children(tags::VOID_RESULT_INFO);
    if results.is_empty() {
        return Err(in_band_error(&root, ErrorKind::UnableToCancelTicket, tags::VOID_RESULT_INFO));
    }

    let mut confirmed = Vec::with_capacity(results.len());
    for result in &results {
        let number = optional(result, "DocumentNumber").unwrap_or_default();
        if optional(result, "ResultType").as_deref() != Some(VOID_SUCCESS) {
            let remark = result
                .child(tags::FAILURE_REMARK)
                .and_then(|r| r.text())
                .map(|t| t.into_owned())
                .unwrap_or_else(|| format!("void of {number} was not confirmed"));
            return Err(ClassifiedError::new(ErrorKind::UnableToCancelTicket, remark));
        }
        confirmed.push(number);
    }
    Ok(RecordAck { confirmed })
}

/// Normalize a universal record cancel response.
pub fn normalize_cancel(
    doc: &RawDocument,
    ctx: &NormalizeContext,
) -> Result<RecordAck, ClassifiedError> {
    traced(ResponseKind::Cancel, Instant::now(), normalize_cancel_inner(doc, ctx))
}

fn normalize_cancel_inner(
    doc: &RawDocument,
    ctx: &NormalizeContext,
) -> Result<RecordAck, ClassifiedError> {
    let root = doc.root(&ctx.schema);
    let statuses = root.children(tags::PROVIDER_RESERVATION_STATUS);
    if statuses.is_empty() {
        return Err(in_band_error(
            &root,
            ErrorKind::UnableToCancelBooking,
            tags::PROVIDER_RESERVATION_STATUS,
        ));
    }

    let mut confirmed = Vec::with_capacity(statuses.len());
    for status in &statuses {
        let locator = optional(status, "LocatorCode").unwrap_or_default();
        if !flag(status, "Cancelled") {
            return Err(ClassifiedError::new(
                ErrorKind::UnableToCancelBooking,
                format!("provider reservation {locator} was not cancelled"),
            ));
        }
        confirmed.push(locator);
    }
    Ok(RecordAck { confirmed })
}

/// Normalize a reservation creation response.
///
/// Sell failures are reported with a reference to the universal record the
/// vendor created anyway, so callers can cancel it.
pub fn normalize_create_reservation(
    doc: &RawDocument,
    ctx: &NormalizeContext,
) -> Result<Vec<CanonicalBooking>, ClassifiedError> {
    traced(
        ResponseKind::CreateReservation,
        Instant::now(),
        normalize_create_reservation_inner(doc, ctx),
    )
}

fn normalize_create_reservation_inner(
    doc: &RawDocument,
    ctx: &NormalizeContext,
) -> Result<Vec<CanonicalBooking>, ClassifiedError> {
    let root = doc.root(&ctx.schema);
    let record = root.child(tags::UNIVERSAL_RECORD);
    let fault = FaultView::from_node(root);
    let sell_failure = root.child(tags::AIR_SEGMENT_SELL_FAILURE_INFO);

    let failure_kind = if fault.contains_ci("no valid fare") {
        Some(ErrorKind::NoValidFare)
    } else if sell_failure.is_some() {
        let waitlisted = fault.contains_ci("waitlist")
            || sell_failure.is_some_and(|f| node_mentions(&f, "waitlist"));
        Some(if waitlisted {
            ErrorKind::SegmentWaitlisted
        } else {
            ErrorKind::SegmentBookingFailed
        })
    } else {
        None
    };

    match (failure_kind, record) {
        (Some(kind), record) => {
            let mut err = vendor_error(kind, &fault);
            if err.message.is_empty() {
                err.message = format!("reservation failed: {kind}");
            }
            if let Some(reference) = record.and_then(|r| record_ref(&r)) {
                err = err.with_record(reference);
            }
            Err(err)
        }
        (None, Some(record)) => bookings_of(&record),
        (None, None) => Err(in_band_error(
            &root,
            ErrorKind::MissingRequiredField,
            tags::UNIVERSAL_RECORD,
        )),
    }
}

/// Normalize a universal record search response.
pub fn normalize_pnr_list(
    doc: &RawDocument,
    ctx: &NormalizeContext,
) -> Result<Vec<PnrListEntry>, ClassifiedError> {
    traced(ResponseKind::PnrList, Instant::now(), normalize_pnr_list_inner(doc, ctx))
}

fn normalize_pnr_list_inner(
    doc: &RawDocument,
    ctx: &NormalizeContext,
) -> Result<Vec<PnrListEntry>, ClassifiedError> {
    doc.root(&ctx.schema)
        .children(tags::UNIVERSAL_RECORD_SEARCH_RESULT)
        .iter()
        .map(|entry| {
            Ok(PnrListEntry {
                ur_locator: required(entry, "UniversalRecordLocatorCode")?,
                pnr: required(entry, "ProviderLocatorCode")?,
                provider_code: optional(entry, "ProviderCode"),
                last_name: optional(entry, "TravelerLastName"),
                travel_date: optional(entry, "TravelDate"),
            })
        })
        .collect()
}

/// Normalize a response that only acknowledges a change.
pub fn normalize_record_ack(
    doc: &RawDocument,
    ctx: &NormalizeContext,
) -> Result<RecordAck, ClassifiedError> {
    traced(ResponseKind::RecordAck, Instant::now(), normalize_record_ack_inner(doc, ctx))
}

fn normalize_record_ack_inner(
    doc: &RawDocument,
    ctx: &NormalizeContext,
) -> Result<RecordAck, ClassifiedError> {
    let root = doc.root(&ctx.schema);
    let fault = FaultView::from_node(root);
    if fault.has_content() {
        return Err(classify_fault(&fault));
    }
    let confirmed = root
        .child(tags::UNIVERSAL_RECORD)
        .and_then(|ur| optional(&ur, "LocatorCode"))
        .into_iter()
        .collect();
    Ok(RecordAck { confirmed })
}

pub(crate) fn record_ref(record: &Node<'_>) -> Option<RecordRef> {
    Some(RecordRef {
        ur_locator: optional(record, "LocatorCode")?,
        version: optional(record, "Version"),
    })
}

/// Classify in-band errors, or report the missing element when there are none.
fn in_band_error(root: &Node<'_>, fallback: ErrorKind, missing: document::Tag) -> ClassifiedError {
    let fault = FaultView::from_node(*root);
    if fault.has_content() {
        return classify_fault(&fault);
    }
    let message = match fallback {
        ErrorKind::MissingRequiredField => format!("missing required field: {missing}"),
        _ => format!("response carried no {missing}"),
    };
    ClassifiedError::new(fallback, message)
}

fn classify_fault(fault: &FaultView) -> ClassifiedError {
    classify_view(Profile::General, fault)
        .into_error()
        .unwrap_or_else(|| vendor_error(ErrorKind::UnhandledError, fault))
}

fn node_mentions(node: &Node<'_>, needle: &str) -> bool {
    node.value()
        .to_string()
        .to_ascii_lowercase()
        .contains(needle)
}
