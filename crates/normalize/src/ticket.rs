use std::time::Instant;

use classify::{ClassifiedError, ErrorKind, FaultView, Profile};
use document::{tags, Node, RawDocument};

use crate::booking::{passenger_of, taxes_of};
use crate::context::{NormalizeContext, ResponseKind};
use crate::fare::{fare_calculation_of, parse_commission};
use crate::fields::{flag, number, optional, optional_datetime, payload, required};
use crate::model::{CanonicalTicket, Coupon, CouponStatus};
use crate::price::Price;
use crate::traced;

/// Normalize a single-ticket retrieval response.
///
/// The first ticket of the first electronic ticket record is returned.
pub fn normalize_ticket(
    doc: &RawDocument,
    ctx: &NormalizeContext,
) -> Result<CanonicalTicket, ClassifiedError> {
    traced(ResponseKind::Ticket, Instant::now(), normalize_ticket_inner(doc, ctx))
}

fn normalize_ticket_inner(
    doc: &RawDocument,
    ctx: &NormalizeContext,
) -> Result<CanonicalTicket, ClassifiedError> {
    let root = doc.root(&ctx.schema);
    let etr = payload(&root, tags::ETR, Profile::TicketRetrieval)?.ok_or_else(|| {
        ClassifiedError::new(ErrorKind::TicketNotFound, "response carried no ticket record")
    })?;
    tickets_of_etr(&etr)?
        .into_iter()
        .next()
        .ok_or_else(|| {
            ClassifiedError::new(ErrorKind::MissingRequiredField, tags::TICKET.to_string())
        })
}

/// Normalize every ticket of every electronic ticket record in the response.
pub fn normalize_tickets(
    doc: &RawDocument,
    ctx: &NormalizeContext,
) -> Result<Vec<CanonicalTicket>, ClassifiedError> {
    traced(ResponseKind::Tickets, Instant::now(), normalize_tickets_inner(doc, ctx))
}

fn normalize_tickets_inner(
    doc: &RawDocument,
    ctx: &NormalizeContext,
) -> Result<Vec<CanonicalTicket>, ClassifiedError> {
    let root = doc.root(&ctx.schema);
    let etrs = root.children(tags::ETR);
    if etrs.is_empty() && FaultView::from_node(root).has_content() {
        // Either a classified error or an empty result.
        payload(&root, tags::ETR, Profile::TicketRetrieval)?;
        return Ok(Vec::new());
    }
    etrs_to_tickets(&etrs)
}

pub(crate) fn etrs_to_tickets(etrs: &[Node<'_>]) -> Result<Vec<CanonicalTicket>, ClassifiedError> {
    let mut tickets = Vec::new();
    for etr in etrs {
        tickets.extend(tickets_of_etr(etr)?);
    }
    Ok(tickets)
}

fn tickets_of_etr(etr: &Node<'_>) -> Result<Vec<CanonicalTicket>, ClassifiedError> {
    let pnr = required(etr, "ProviderLocatorCode")?;
    let passengers = etr
        .children(tags::BOOKING_TRAVELER)
        .iter()
        .map(passenger_of)
        .collect::<Result<Vec<_>, _>>()?;
    let commission = etr
        .child(tags::COMMISSION)
        .map(|c| parse_commission(&c))
        .transpose()?;
    let total_price = optional(etr, "TotalPrice");
    let taxes = optional(etr, "Taxes")
        .or_else(|| total_price.as_deref().and_then(Price::zero_like));
    let taxes_info = taxes_of(etr)?;
    let fare_calculation = fare_calculation_of(etr)?;
    let issued_at = optional_datetime(etr, "IssuedDate")?;
    let reservation_locator = etr
        .child(tags::AIR_RESERVATION_LOCATOR_CODE)
        .and_then(|node| node.text())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty());

    let tickets = etr.children(tags::TICKET);
    if tickets.is_empty() {
        return Err(ClassifiedError::new(
            ErrorKind::MissingRequiredField,
            tags::TICKET.to_string(),
        ));
    }

    tickets
        .iter()
        .map(|ticket| {
            let ticket_number = required(ticket, "TicketNumber")?;
            let coupons = ticket
                .children(tags::COUPON)
                .iter()
                .map(|coupon| coupon_of(coupon, &ticket_number))
                .collect::<Result<Vec<_>, _>>()?;
            if coupons.is_empty() {
                return Err(ClassifiedError::new(
                    ErrorKind::MissingRequiredField,
                    format!("{} of ticket {ticket_number}", tags::COUPON),
                ));
            }
            Ok(CanonicalTicket {
                pnr: pnr.clone(),
                uapi_ur_locator: optional(etr, "UniversalRecordLocatorCode"),
                uapi_reservation_locator: reservation_locator.clone(),
                issued_at,
                plating_carrier: optional(etr, "PlatingCarrier"),
                tour_code: optional(etr, "TourCode"),
                passengers: passengers.clone(),
                coupons,
                taxes_info: taxes_info.clone(),
                commission: commission.clone(),
                total_price: total_price.clone(),
                base_price: optional(etr, "BasePrice"),
                equivalent_base_price: optional(etr, "EquivalentBasePrice"),
                taxes: taxes.clone(),
                fare_calculation: fare_calculation.clone(),
                exchanged_tickets: ticket
                    .children(tags::EXCHANGED_TICKET_INFO)
                    .iter()
                    .filter_map(|ex| optional(ex, "Number"))
                    .collect(),
                ticket_number,
            })
        })
        .collect()
}

fn coupon_of(coupon: &Node<'_>, ticket_number: &str) -> Result<Coupon, ClassifiedError> {
    Ok(Coupon {
        ticket_number: ticket_number.to_string(),
        coupon_number: number(coupon, "CouponNumber")?,
        origin: required(coupon, "Origin")?,
        destination: required(coupon, "Destination")?,
        departure: optional_datetime(coupon, "DepartureTime")?,
        status: CouponStatus::from_code(&required(coupon, "Status")?),
        fare_basis_code: optional(coupon, "FareBasis"),
        booking_class: optional(coupon, "BookingClass"),
        stopover: flag(coupon, "StopoverCode"),
        airline: optional(coupon, "MarketingCarrier"),
        flight_number: optional(coupon, "MarketingFlightNumber"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CommissionCode;
    use serde_json::json;

    fn etr(tickets: serde_json::Value) -> RawDocument {
        RawDocument::new(json!({
            "air:ETR": {
                "ProviderLocatorCode": "PNR001",
                "UniversalRecordLocatorCode": "UR0001",
                "IssuedDate": "2024-04-10T12:00:00.000+03:00",
                "TotalPrice": "UAH5000",
                "BasePrice": "EUR100",
                "air:AirReservationLocatorCode": "AR0001",
                "air:Commission": { "Type": "PercentBase", "Percentage": "0.0" },
                "air:FareCalc": "KBP PS AMS 100.00NUC100.00END ROE1.0",
                "common_v52_0:BookingTraveler": {
                    "Key": "BT1",
                    "TravelerType": "ADT",
                    "common_v52_0:BookingTravelerName": { "First": "IVAN", "Last": "PETRENKO" }
                },
                "air:Ticket": tickets
            }
        }))
    }

    fn coupon(number: u32, status: &str) -> serde_json::Value {
        json!({
            "CouponNumber": number.to_string(),
            "Origin": "KBP",
            "Destination": "AMS",
            "DepartureTime": "2024-05-01T07:40:00.000+03:00",
            "Status": status,
            "FareBasis": "Y1",
            "BookingClass": "Y",
            "StopoverCode": "true",
            "MarketingCarrier": "PS",
            "MarketingFlightNumber": "101"
        })
    }

    #[test]
    fn single_ticket_carries_record_fields() {
        let doc = etr(json!({
            "TicketNumber": "5660000000001",
            "air:Coupon": [coupon(1, "O"), coupon(2, "F")],
            "air:ExchangedTicketInfo": { "Number": "5660000000000" }
        }));
        let ticket = normalize_ticket(&doc, &NormalizeContext::default()).unwrap();

        assert_eq!(ticket.ticket_number, "5660000000001");
        assert_eq!(ticket.pnr, "PNR001");
        assert_eq!(ticket.uapi_reservation_locator.as_deref(), Some("AR0001"));
        assert_eq!(ticket.taxes.as_deref(), Some("UAH0"));
        assert_eq!(ticket.commission.as_ref().map(|c| c.code), Some(CommissionCode::Percent));
        assert_eq!(ticket.passengers[0].last_name, "PETRENKO");
        assert_eq!(ticket.coupons.len(), 2);
        assert_eq!(ticket.coupons[0].status, CouponStatus::Open);
        assert_eq!(ticket.coupons[1].status, CouponStatus::Other("F".into()));
        assert!(ticket.coupons[0].stopover);
        assert_eq!(ticket.exchanged_tickets, vec!["5660000000000"]);
        assert_eq!(ticket.fare_calculation.unwrap().roe, Some(1.0));
    }

    #[test]
    fn conjunction_tickets_share_record_fields() {
        let doc = etr(json!([
            { "TicketNumber": "5660000000001", "air:Coupon": coupon(1, "O") },
            { "TicketNumber": "5660000000002", "air:Coupon": coupon(1, "V") }
        ]));
        let tickets = normalize_tickets(&doc, &NormalizeContext::default()).unwrap();
        assert_eq!(tickets.len(), 2);
        assert_eq!(tickets[1].coupons[0].ticket_number, "5660000000002");
        assert_eq!(tickets[1].pnr, "PNR001");
    }

    #[test]
    fn ticket_without_coupons_is_rejected() {
        let doc = etr(json!({ "TicketNumber": "5660000000001" }));
        let err = normalize_ticket(&doc, &NormalizeContext::default()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingRequiredField);
    }

    #[test]
    fn missing_record_is_rejected() {
        let err = normalize_ticket(&RawDocument::new(json!({})), &NormalizeContext::default())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingRequiredField);
        assert!(normalize_tickets(&RawDocument::new(json!({})), &NormalizeContext::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn in_band_messages_are_classified() {
        let ctx = NormalizeContext::default();
        let host_error = RawDocument::new(json!({
            "air:DocumentFailureInfo": { "Message": "Host error during ticket retrieve" }
        }));
        assert_eq!(
            normalize_ticket(&host_error, &ctx).unwrap_err().kind,
            ErrorKind::UnableToRetrieveTicket
        );
        assert_eq!(
            normalize_tickets(&host_error, &ctx).unwrap_err().kind,
            ErrorKind::UnableToRetrieveTicket
        );

        let no_tickets = RawDocument::new(json!({
            "common_v52_0:ResponseMessage": {
                "Type": "Error",
                "Code": "3000",
                "_": "Record PNR001 has no tickets"
            }
        }));
        assert!(normalize_tickets(&no_tickets, &ctx).unwrap().is_empty());
        assert_eq!(
            normalize_ticket(&no_tickets, &ctx).unwrap_err().kind,
            ErrorKind::TicketNotFound
        );
    }
}
