//! Canonical records from raw vendor response documents.
//!
//! Each response shape has a dedicated function (`normalize_universal_record`,
//! `normalize_ticket`, ...) and [`normalize`] dispatches on a [`ResponseKind`].
//! All of them are pure: the same document and context always yield the same
//! record or the same [`ClassifiedError`].
//!
//! ## Failure reporting
//!
//! Structural problems surface as parsing kinds
//! ([`ErrorKind::MissingRequiredField`], [`ErrorKind::HistogramTypeInvalid`],
//! [`ErrorKind::ReservationProviderInfoMissing`], [`ErrorKind::InvalidFieldValue`]).
//! Responses to modifying requests may report a vendor failure in-band; those
//! are classified and returned as the matching vendor, ticketing, booking or
//! cancellation kind.
//!
//! ```
//! use normalize::{normalize, NormalizeContext, Normalized, ResponseKind};
//! use document::RawDocument;
//! use serde_json::json;
//!
//! let doc = RawDocument::new(json!({
//!     "universal:UniversalRecordSearchResult": {
//!         "UniversalRecordLocatorCode": "UR0001",
//!         "ProviderLocatorCode": "PNR001"
//!     }
//! }));
//! match normalize(&doc, ResponseKind::PnrList, &NormalizeContext::default()).unwrap() {
//!     Normalized::PnrList(entries) => assert_eq!(entries[0].pnr, "PNR001"),
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

use std::time::Instant;

use classify::ClassifiedError;
use document::RawDocument;
use serde::Serialize;
use tracing::{debug, warn, Level};

mod booking;
mod context;
mod fare;
mod fields;
mod histogram;
mod model;
mod outcome;
mod price;
mod ticket;

pub use crate::booking::{directions_of, normalize_universal_record};
pub use crate::context::{NormalizeContext, ResponseKind, UnknownResponseKind};
pub use crate::fare::{group_fare_quotes, parse_commission, parse_fare_calculation};
pub use crate::histogram::passenger_histogram;
pub use crate::model::{
    CanonicalBooking, CanonicalTicket, Commission, CommissionCode, Coupon, CouponStatus, Direction,
    Email, FareCalculation, FareComponent, FareQuote, Passenger, PnrListEntry, PricingInfo,
    RecordAck, Remark, Segment, ServiceSegment, Ssr, Tax, TicketSummary, TicketingOutcome,
};
pub use crate::outcome::{
    normalize_cancel, normalize_create_reservation, normalize_pnr_list, normalize_record_ack,
    normalize_ticketing, normalize_void,
};
pub use crate::price::Price;
pub use crate::ticket::{normalize_ticket, normalize_tickets};
pub use classify::ErrorKind;

/// Any canonical result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Normalized {
    Bookings(Vec<CanonicalBooking>),
    Ticket(CanonicalTicket),
    Tickets(Vec<CanonicalTicket>),
    Ticketing(TicketingOutcome),
    Acknowledged(RecordAck),
    PnrList(Vec<PnrListEntry>),
}

/// Normalize `doc` as a response of `kind`.
pub fn normalize(
    doc: &RawDocument,
    kind: ResponseKind,
    ctx: &NormalizeContext,
) -> Result<Normalized, ClassifiedError> {
    let span =
        tracing::span!(Level::DEBUG, "normalize.normalize", kind = %kind, schema = %ctx.schema);
    let _guard = span.enter();

    match kind {
        ResponseKind::UniversalRecord => {
            normalize_universal_record(doc, ctx).map(Normalized::Bookings)
        }
        ResponseKind::CreateReservation => {
            normalize_create_reservation(doc, ctx).map(Normalized::Bookings)
        }
        ResponseKind::Ticket => normalize_ticket(doc, ctx).map(Normalized::Ticket),
        ResponseKind::Tickets => normalize_tickets(doc, ctx).map(Normalized::Tickets),
        ResponseKind::Ticketing => normalize_ticketing(doc, ctx).map(Normalized::Ticketing),
        ResponseKind::Void => normalize_void(doc, ctx).map(Normalized::Acknowledged),
        ResponseKind::Cancel => normalize_cancel(doc, ctx).map(Normalized::Acknowledged),
        ResponseKind::RecordAck => normalize_record_ack(doc, ctx).map(Normalized::Acknowledged),
        ResponseKind::PnrList => normalize_pnr_list(doc, ctx).map(Normalized::PnrList),
    }
}

/// Log the outcome of one normalization.
pub(crate) fn traced<T>(
    kind: ResponseKind,
    start: Instant,
    result: Result<T, ClassifiedError>,
) -> Result<T, ClassifiedError> {
    let elapsed_micros = start.elapsed().as_micros();
    match &result {
        Ok(_) => debug!(response = %kind, elapsed_micros, "normalize_success"),
        Err(err) => warn!(
            response = %kind,
            error = %err,
            error_kind = %err.kind,
            elapsed_micros,
            "normalize_failure"
        ),
    }
    result
}
