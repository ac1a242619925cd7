use std::collections::HashMap;
use std::time::Instant;

use classify::{ClassifiedError, ErrorKind, Profile};
use document::{tags, Node, RawDocument};
use serde_json::Value;

use crate::context::{NormalizeContext, ResponseKind};
use crate::fare::{fare_calculation_of, group_fare_quotes};
use crate::fields::{
    datetime, flag, optional, optional_date, optional_datetime, optional_number, payload, required,
};
use crate::histogram::passenger_histogram;
use crate::model::{
    CanonicalBooking, Direction, Email, FareComponent, Passenger, PricingInfo, Remark, Segment,
    ServiceSegment, Ssr, Tax, TicketSummary,
};
use crate::price::Price;
use crate::traced;

/// Group key used when a pricing record does not name one.
const DEFAULT_PRICING_GROUP: &str = "0";

/// Normalize a universal record into one booking per air reservation.
pub fn normalize_universal_record(
    doc: &RawDocument,
    ctx: &NormalizeContext,
) -> Result<Vec<CanonicalBooking>, ClassifiedError> {
    traced(
        ResponseKind::UniversalRecord,
        Instant::now(),
        normalize_universal_record_inner(doc, ctx),
    )
}

fn normalize_universal_record_inner(
    doc: &RawDocument,
    ctx: &NormalizeContext,
) -> Result<Vec<CanonicalBooking>, ClassifiedError> {
    let root = doc.root(&ctx.schema);
    match payload(&root, tags::UNIVERSAL_RECORD, Profile::General)? {
        Some(record) => bookings_of(&record),
        None => Err(ClassifiedError::new(
            ErrorKind::MissingRequiredField,
            format!("missing required field: {}", tags::UNIVERSAL_RECORD),
        )),
    }
}

pub(crate) fn bookings_of(record: &Node<'_>) -> Result<Vec<CanonicalBooking>, ClassifiedError> {
    let ur_locator = required(record, "LocatorCode")?;
    let version = optional_number(record, "Version")?.unwrap_or_default();
    let status = optional(record, "Status");

    let travelers = record
        .children(tags::BOOKING_TRAVELER)
        .iter()
        .map(passenger_of)
        .collect::<Result<Vec<_>, _>>()?;
    let provider_infos = record.children(tags::PROVIDER_RESERVATION_INFO);
    let remarks = record.children(tags::GENERAL_REMARK);
    let emails = record
        .children(tags::BOOKING_TRAVELER)
        .iter()
        .map(emails_of)
        .collect::<Result<Vec<_>, _>>()?;

    record
        .children(tags::AIR_RESERVATION)
        .iter()
        .map(|reservation| {
            let provider_key = reservation
                .required_child(tags::PROVIDER_RESERVATION_INFO_REF)?
                .required_attr("Key")?
                .into_owned();
            let provider = provider_infos
                .iter()
                .find(|info| info.attr("Key").as_deref() == Some(provider_key.as_str()))
                .ok_or_else(|| {
                    ClassifiedError::new(
                        ErrorKind::ReservationProviderInfoMissing,
                        format!("no provider reservation info for key {provider_key}"),
                    )
                })?;

            let traveler_refs: Vec<String> = reservation
                .children(tags::BOOKING_TRAVELER_REF)
                .iter()
                .filter_map(|r| r.attr("Key").map(|k| k.into_owned()))
                .collect();
            let referenced =
                |key: &str| traveler_refs.is_empty() || traveler_refs.iter().any(|r| r == key);

            let passengers: Vec<Passenger> = travelers
                .iter()
                .filter(|p| referenced(&p.key))
                .cloned()
                .collect();
            let booking_emails: Vec<Email> = emails
                .iter()
                .flatten()
                .filter(|e| referenced(&e.passenger_ref))
                .cloned()
                .collect();

            let pricing = reservation.children(tags::AIR_PRICING_INFO);
            let segments = segments_of(reservation, &pricing)?;

            Ok(CanonicalBooking {
                pnr: required(provider, "LocatorCode")?,
                uapi_ur_locator: ur_locator.clone(),
                uapi_reservation_locator: required(reservation, "LocatorCode")?,
                version,
                provider_code: optional(provider, "ProviderCode"),
                pcc: optional(provider, "OwningPCC"),
                status: status.clone(),
                created_at: datetime(reservation, "CreateDate")?,
                modified_at: datetime(reservation, "ModifiedDate")?,
                passengers,
                directions: directions_of(&segments),
                segments,
                service_segments: reservation
                    .children(tags::SERVICE_SEGMENT)
                    .iter()
                    .map(service_segment_of)
                    .collect::<Result<_, _>>()?,
                fare_quotes: group_fare_quotes(
                    pricing
                        .iter()
                        .map(|p| {
                            let group = optional(p, "AirPricingInfoGroup")
                                .unwrap_or_else(|| DEFAULT_PRICING_GROUP.to_string());
                            pricing_info_of(p).map(|info| (group, info))
                        })
                        .collect::<Result<_, _>>()?,
                ),
                tickets: tickets_of(reservation)?,
                emails: booking_emails,
                remarks: remarks_of(&remarks, &provider_key)?,
                split_bookings: provider
                    .children(tags::SPLIT_BOOKING)
                    .iter()
                    .filter_map(|s| optional(s, "LocatorCode"))
                    .collect(),
            })
        })
        .collect()
}

pub(crate) fn passenger_of(traveler: &Node<'_>) -> Result<Passenger, ClassifiedError> {
    let name = traveler.required_child(tags::BOOKING_TRAVELER_NAME)?;
    Ok(Passenger {
        key: required(traveler, "Key")?,
        first_name: required(&name, "First")?,
        last_name: required(&name, "Last")?,
        title: optional(&name, "Prefix"),
        passenger_type: optional(traveler, "TravelerType").unwrap_or_else(|| "ADT".to_string()),
        gender: optional(traveler, "Gender"),
        birth_date: optional_date(traveler, "DOB")?,
        ssrs: traveler
            .children(tags::SSR)
            .iter()
            .map(|ssr| {
                Ok(Ssr {
                    kind: required(ssr, "Type")?,
                    carrier: optional(ssr, "Carrier"),
                    text: optional(ssr, "FreeText"),
                })
            })
            .collect::<Result<_, ClassifiedError>>()?,
    })
}

fn emails_of(traveler: &Node<'_>) -> Result<Vec<Email>, ClassifiedError> {
    let key = required(traveler, "Key")?;
    traveler
        .children(tags::EMAIL)
        .iter()
        .map(|email| {
            Ok(Email {
                passenger_ref: key.clone(),
                email: required(email, "EmailID")?,
                kind: optional(email, "Type"),
            })
        })
        .collect()
}

fn segments_of(
    reservation: &Node<'_>,
    pricing: &[Node<'_>],
) -> Result<Vec<Segment>, ClassifiedError> {
    let fare_basis = fare_basis_by_segment(pricing.first());
    reservation
        .children(tags::AIR_SEGMENT)
        .iter()
        .enumerate()
        .map(|(position, seg)| {
            let key = required(seg, "Key")?;
            Ok(Segment {
                index: position + 1,
                fare_basis_code: fare_basis.get(&key).cloned(),
                key,
                group: optional_number(seg, "Group")?.unwrap_or_default(),
                airline: required(seg, "Carrier")?,
                flight_number: required(seg, "FlightNumber")?,
                origin: required(seg, "Origin")?,
                destination: required(seg, "Destination")?,
                departure: datetime(seg, "DepartureTime")?,
                arrival: datetime(seg, "ArrivalTime")?,
                service_class: required(seg, "ClassOfService")?,
                cabin_class: optional(seg, "CabinClass"),
                status: required(seg, "Status")?,
                equipment: optional(seg, "Equipment"),
                travel_time: optional_number(seg, "TravelTime")?,
            })
        })
        .collect()
}

/// Segment key to fare basis, through the pricing record's booking infos.
fn fare_basis_by_segment(pricing: Option<&Node<'_>>) -> HashMap<String, String> {
    let Some(pricing) = pricing else {
        return HashMap::new();
    };
    let fares: HashMap<String, String> = pricing
        .children(tags::FARE_INFO)
        .iter()
        .filter_map(|fare| Some((optional(fare, "Key")?, optional(fare, "FareBasis")?)))
        .collect();
    pricing
        .children(tags::BOOKING_INFO)
        .iter()
        .filter_map(|info| {
            let segment = optional(info, "SegmentRef")?;
            let basis = fares.get(&optional(info, "FareInfoRef")?)?;
            Some((segment, basis.clone()))
        })
        .collect()
}

/// Partition segments by leg group, keeping relative order.
pub fn directions_of(segments: &[Segment]) -> Vec<Direction> {
    let mut directions: Vec<Direction> = Vec::new();
    for segment in segments {
        match directions.iter_mut().find(|d| d.group == segment.group) {
            Some(direction) => {
                direction.destination = segment.destination.clone();
                direction.segments.push(segment.index);
            }
            None => directions.push(Direction {
                group: segment.group,
                origin: segment.origin.clone(),
                destination: segment.destination.clone(),
                segments: vec![segment.index],
            }),
        }
    }
    directions
}

fn service_segment_of(node: &Node<'_>) -> Result<ServiceSegment, ClassifiedError> {
    Ok(ServiceSegment {
        key: required(node, "Key")?,
        carrier: required(node, "Carrier")?,
        origin: optional(node, "Origin"),
        travel_date: optional(node, "TravelDate"),
        rfic: required(node, "RFIC")?,
        rfisc: required(node, "RFISC")?,
        quantity: optional_number(node, "Quantity")?.unwrap_or(1),
        description: optional(node, "FeeDescription"),
        passenger_ref: optional(node, "BookingTravelerRef"),
        total_price: optional(node, "TotalPrice"),
    })
}

fn pricing_info_of(node: &Node<'_>) -> Result<PricingInfo, ClassifiedError> {
    // Kept in vendor form; a malformed price only matters to ticketing.
    let total_price = required(node, "TotalPrice")?;
    let passenger_types = node.children(tags::PASSENGER_TYPE);
    let codes = Value::Array(passenger_types.iter().map(|p| p.value().clone()).collect());

    let taxes = optional(node, "Taxes").or_else(|| Price::zero_like(&total_price));
    Ok(PricingInfo {
        key: required(node, "Key")?,
        base_price: optional(node, "BasePrice"),
        equivalent_base_price: optional(node, "EquivalentBasePrice"),
        taxes,
        plating_carrier: optional(node, "PlatingCarrier"),
        latest_ticketing_time: optional(node, "LatestTicketingTime"),
        passenger_refs: passenger_types
            .iter()
            .filter_map(|p| optional(p, "BookingTravelerRef"))
            .collect(),
        passenger_counts: passenger_histogram(&codes)?,
        fare_components: node
            .children(tags::FARE_INFO)
            .iter()
            .map(|fare| {
                Ok(FareComponent {
                    key: required(fare, "Key")?,
                    fare_basis_code: required(fare, "FareBasis")?,
                    origin: optional(fare, "Origin"),
                    destination: optional(fare, "Destination"),
                    effective_date: optional_datetime(fare, "EffectiveDate")?,
                })
            })
            .collect::<Result<_, ClassifiedError>>()?,
        taxes_info: taxes_of(node)?,
        fare_calculation: fare_calculation_of(node)?,
        total_price,
    })
}

pub(crate) fn taxes_of(node: &Node<'_>) -> Result<Vec<Tax>, ClassifiedError> {
    node.children(tags::TAX_INFO)
        .iter()
        .map(|tax| {
            Ok(Tax {
                kind: required(tax, "Category")?,
                amount: required(tax, "Amount")?,
            })
        })
        .collect()
}

fn tickets_of(reservation: &Node<'_>) -> Result<Vec<TicketSummary>, ClassifiedError> {
    let Some(info) = reservation.child(tags::DOCUMENT_INFO) else {
        return Ok(Vec::new());
    };
    info.children(tags::TICKET_INFO)
        .iter()
        .map(|ticket| {
            Ok(TicketSummary {
                number: required(ticket, "Number")?,
                status: required(ticket, "Status")?,
                passenger_ref: optional(ticket, "BookingTravelerRef"),
                pricing_info_ref: optional(ticket, "AirPricingInfoRef"),
            })
        })
        .collect()
}

/// General remarks for this provider reservation, plus the unassigned ones.
fn remarks_of(remarks: &[Node<'_>], provider_key: &str) -> Result<Vec<Remark>, ClassifiedError> {
    remarks
        .iter()
        .filter(|remark| {
            optional(remark, "ProviderReservationInfoRef").is_none_or(|key| key == provider_key)
        })
        .filter(|remark| !flag(remark, "Suppressed"))
        .map(|remark| {
            let text = remark
                .child(tags::REMARK_DATA)
                .and_then(|data| data.text())
                .map(|t| t.into_owned())
                .ok_or_else(|| {
                    ClassifiedError::new(
                        ErrorKind::MissingRequiredField,
                        tags::REMARK_DATA.to_string(),
                    )
                })?;
            Ok(Remark {
                key: optional(remark, "Key"),
                category: optional(remark, "Category"),
                text,
            })
        })
        .collect()
}
