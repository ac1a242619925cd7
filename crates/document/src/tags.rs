//! Element names read by the normalizer and the classifier.

use crate::schema::Tag;

// Universal record
pub const UNIVERSAL_RECORD: Tag = Tag::universal("UniversalRecord");
pub const PROVIDER_RESERVATION_INFO: Tag = Tag::universal("ProviderReservationInfo");
pub const PROVIDER_RESERVATION_STATUS: Tag = Tag::universal("ProviderReservationStatus");
pub const SPLIT_BOOKING: Tag = Tag::universal("SplitBooking");
pub const UNIVERSAL_RECORD_SEARCH_RESULT: Tag = Tag::universal("UniversalRecordSearchResult");

// Shared types
pub const BOOKING_TRAVELER: Tag = Tag::common("BookingTraveler");
pub const BOOKING_TRAVELER_NAME: Tag = Tag::common("BookingTravelerName");
pub const BOOKING_TRAVELER_REF: Tag = Tag::common("BookingTravelerRef");
pub const PROVIDER_RESERVATION_INFO_REF: Tag = Tag::common("ProviderReservationInfoRef");
pub const EMAIL: Tag = Tag::common("Email");
pub const SSR: Tag = Tag::common("SSR");
pub const GENERAL_REMARK: Tag = Tag::common("GeneralRemark");
pub const REMARK_DATA: Tag = Tag::common("RemarkData");
pub const RESPONSE_MESSAGE: Tag = Tag::common("ResponseMessage");
pub const ERROR_INFO: Tag = Tag::common("ErrorInfo");
pub const ERROR_CODE: Tag = Tag::common("Code");
pub const ERROR_DESCRIPTION: Tag = Tag::common("Description");
pub const FAILURE_REMARK: Tag = Tag::common("FailureRemark");

// Air reservation
pub const AIR_RESERVATION: Tag = Tag::air("AirReservation");
pub const AIR_SEGMENT: Tag = Tag::air("AirSegment");
pub const SERVICE_SEGMENT: Tag = Tag::air("ServiceSegment");
pub const AIR_PRICING_INFO: Tag = Tag::air("AirPricingInfo");
pub const PASSENGER_TYPE: Tag = Tag::air("PassengerType");
pub const FARE_INFO: Tag = Tag::air("FareInfo");
pub const BOOKING_INFO: Tag = Tag::air("BookingInfo");
pub const TAX_INFO: Tag = Tag::air("TaxInfo");
pub const FARE_CALC: Tag = Tag::air("FareCalc");
pub const DOCUMENT_INFO: Tag = Tag::air("DocumentInfo");
pub const TICKET_INFO: Tag = Tag::air("TicketInfo");
pub const AIR_SEGMENT_SELL_FAILURE_INFO: Tag = Tag::air("AirSegmentSellFailureInfo");

// Electronic ticket records
pub const ETR: Tag = Tag::air("ETR");
pub const TICKET: Tag = Tag::air("Ticket");
pub const COUPON: Tag = Tag::air("Coupon");
pub const COMMISSION: Tag = Tag::air("Commission");
pub const EXCHANGED_TICKET_INFO: Tag = Tag::air("ExchangedTicketInfo");
pub const AIR_RESERVATION_LOCATOR_CODE: Tag = Tag::air("AirReservationLocatorCode");
pub const TICKET_FAILURE_INFO: Tag = Tag::air("TicketFailureInfo");
pub const VOID_RESULT_INFO: Tag = Tag::air("VoidResultInfo");
pub const DOCUMENT_FAILURE_INFO: Tag = Tag::air("DocumentFailureInfo");

// Fault details
pub const AVAILABILITY_ERROR_INFO: Tag = Tag::air("AvailabilityErrorInfo");
pub const AIR_SEGMENT_ERROR: Tag = Tag::air("AirSegmentError");
pub const ERROR_MESSAGE: Tag = Tag::air("ErrorMessage");
