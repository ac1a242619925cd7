//! Canonical records produced by the normalizer.
//!
//! ```text
//! CanonicalBooking
//! ├── pnr, uapi_ur_locator, uapi_reservation_locator, version
//! ├── created_at / modified_at
//! ├── passengers: Vec<Passenger>
//! ├── segments: Vec<Segment>          (1-based, document order)
//! ├── directions: Vec<Direction>      (segments partitioned by leg group)
//! ├── service_segments: Vec<ServiceSegment>
//! ├── fare_quotes: Vec<FareQuote>     (sorted by effective date, 1-based)
//! │   └── pricing_infos: Vec<PricingInfo>
//! ├── tickets: Vec<TicketSummary>
//! ├── emails / remarks / split_bookings
//!
//! CanonicalTicket
//! ├── ticket_number, pnr, passengers
//! ├── coupons: Vec<Coupon>            (never empty)
//! ├── taxes_info, commission, prices, fare_calculation
//! └── exchanged_tickets
//! ```
//!
//! Price fields keep the vendor's `<CUR><amount>` form; use
//! [`Price::parse`](crate::Price::parse) to split them.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One provider reservation inside a universal record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalBooking {
    pub pnr: String,
    pub uapi_ur_locator: String,
    pub uapi_reservation_locator: String,
    pub version: u32,
    pub provider_code: Option<String>,
    pub pcc: Option<String>,
    pub status: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub modified_at: DateTime<FixedOffset>,
    pub passengers: Vec<Passenger>,
    pub segments: Vec<Segment>,
    pub directions: Vec<Direction>,
    pub service_segments: Vec<ServiceSegment>,
    pub fare_quotes: Vec<FareQuote>,
    pub tickets: Vec<TicketSummary>,
    pub emails: Vec<Email>,
    pub remarks: Vec<Remark>,
    pub split_bookings: Vec<String>,
}

impl CanonicalBooking {
    /// Currency of the first pricing record of the first fare quote.
    pub fn pricing_currency(&self) -> Option<String> {
        let total = &self.fare_quotes.first()?.pricing_infos.first()?.total_price;
        crate::Price::parse(total).map(|price| price.currency)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passenger {
    pub key: String,
    pub first_name: String,
    pub last_name: String,
    pub title: Option<String>,
    /// Passenger type code such as `ADT` or `CNN`.
    pub passenger_type: String,
    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub ssrs: Vec<Ssr>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ssr {
    pub kind: String,
    pub carrier: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// 1-based position in the reservation.
    pub index: usize,
    pub key: String,
    pub group: u32,
    pub airline: String,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub departure: DateTime<FixedOffset>,
    pub arrival: DateTime<FixedOffset>,
    pub service_class: String,
    pub cabin_class: Option<String>,
    pub status: String,
    pub equipment: Option<String>,
    /// Flight time in minutes.
    pub travel_time: Option<u32>,
    pub fare_basis_code: Option<String>,
}

/// An itinerary leg: consecutive segments sharing a group tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Direction {
    pub group: u32,
    pub origin: String,
    pub destination: String,
    /// Indices of the member segments, in order.
    pub segments: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSegment {
    pub key: String,
    pub carrier: String,
    pub origin: Option<String>,
    pub travel_date: Option<String>,
    pub rfic: String,
    pub rfisc: String,
    pub quantity: u32,
    pub description: Option<String>,
    pub passenger_ref: Option<String>,
    pub total_price: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FareQuote {
    /// 1-based display index after sorting by effective date.
    pub index: usize,
    pub group: String,
    pub effective_date: Option<DateTime<FixedOffset>>,
    pub passenger_counts: BTreeMap<String, usize>,
    pub pricing_infos: Vec<PricingInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingInfo {
    pub key: String,
    pub total_price: String,
    pub base_price: Option<String>,
    pub equivalent_base_price: Option<String>,
    pub taxes: Option<String>,
    pub plating_carrier: Option<String>,
    pub latest_ticketing_time: Option<String>,
    pub passenger_refs: Vec<String>,
    pub passenger_counts: BTreeMap<String, usize>,
    pub fare_components: Vec<FareComponent>,
    pub taxes_info: Vec<Tax>,
    pub fare_calculation: Option<FareCalculation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FareComponent {
    pub key: String,
    pub fare_basis_code: String,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub effective_date: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tax {
    pub kind: String,
    pub amount: String,
}

/// A parsed fare-calculation line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FareCalculation {
    /// Content before `END`, with `(.)` and `(,)` separators read as `.`.
    pub fare_calc: String,
    pub origin: Option<String>,
    /// Rate of exchange named by an `ROE` suffix.
    pub roe: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketSummary {
    pub number: String,
    pub status: String,
    pub passenger_ref: Option<String>,
    pub pricing_info_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    pub passenger_ref: String,
    pub email: String,
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remark {
    pub key: Option<String>,
    pub category: Option<String>,
    pub text: String,
}

/// One issued ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalTicket {
    pub ticket_number: String,
    pub pnr: String,
    pub uapi_ur_locator: Option<String>,
    pub uapi_reservation_locator: Option<String>,
    pub issued_at: Option<DateTime<FixedOffset>>,
    pub plating_carrier: Option<String>,
    pub tour_code: Option<String>,
    pub passengers: Vec<Passenger>,
    pub coupons: Vec<Coupon>,
    pub taxes_info: Vec<Tax>,
    pub commission: Option<Commission>,
    pub total_price: Option<String>,
    pub base_price: Option<String>,
    pub equivalent_base_price: Option<String>,
    pub taxes: Option<String>,
    pub fare_calculation: Option<FareCalculation>,
    pub exchanged_tickets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub ticket_number: String,
    pub coupon_number: u32,
    pub origin: String,
    pub destination: String,
    /// Absent for open and surface coupons.
    pub departure: Option<DateTime<FixedOffset>>,
    pub status: CouponStatus,
    pub fare_basis_code: Option<String>,
    pub booking_class: Option<String>,
    pub stopover: bool,
    pub airline: Option<String>,
    pub flight_number: Option<String>,
}

/// Coupon usage state; serialized as the vendor's one-letter code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CouponStatus {
    Open,
    Void,
    Refunded,
    /// Flown, exchanged, airport control and anything unknown, keeping the code.
    Other(String),
}

impl CouponStatus {
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "O" => CouponStatus::Open,
            "V" => CouponStatus::Void,
            "R" => CouponStatus::Refunded,
            other => CouponStatus::Other(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            CouponStatus::Open => "O",
            CouponStatus::Void => "V",
            CouponStatus::Refunded => "R",
            CouponStatus::Other(code) => code,
        }
    }

    /// Void and refunded coupons never block a cancellation.
    pub fn is_settled(&self) -> bool {
        matches!(self, CouponStatus::Void | CouponStatus::Refunded)
    }
}

impl fmt::Display for CouponStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for CouponStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for CouponStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Ok(CouponStatus::from_code(&code))
    }
}

/// Commission display code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommissionCode {
    /// Percent of base fare.
    #[serde(rename = "Z")]
    Percent,
    /// Flat amount.
    #[serde(rename = "ZA")]
    Amount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commission {
    pub code: CommissionCode,
    pub value: f64,
}

/// Result of a ticket issuance request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketingOutcome {
    pub pnr: Option<String>,
    pub ticket_numbers: Vec<String>,
}

/// Positive acknowledgement of a modifying request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordAck {
    /// Locators or document numbers the vendor confirmed.
    pub confirmed: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PnrListEntry {
    pub ur_locator: String,
    pub pnr: String,
    pub provider_code: Option<String>,
    pub last_name: Option<String>,
    pub travel_date: Option<String>,
}
