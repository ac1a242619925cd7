//! Vendor fault classification.
//!
//! A fault document is reduced to a [`FaultView`] and run through ordered
//! rule tables: profile overrides first, then exact vendor-code dispatch
//! ([`STRUCTURED_RULES`]), then free-text patterns ([`TEXT_RULES`]). A document
//! that says nothing about the failure is an [`ErrorKind::UnhandledError`].
//!
//! ```
//! use classify::{classify, ErrorKind};
//! use document::{RawDocument, SchemaVersion};
//! use serde_json::json;
//!
//! let fault = RawDocument::new(json!({
//!     "faultstring": "NO AGENCY AGREEMENT EXISTS FOR 7J8J",
//!     "detail": { "common_v52_0:ErrorInfo": { "common_v52_0:Code": "345" } }
//! }));
//! let err = classify(&fault, &SchemaVersion::default());
//! assert_eq!(err.kind, ErrorKind::NoAgreement);
//! assert_eq!(err.pcc.as_deref(), Some("7J8J"));
//! ```

mod error;
mod fault;
mod profile;
mod rules;

pub use crate::error::{ClassifiedError, ErrorCategory, ErrorKind, RecordRef};
pub use crate::fault::FaultView;
pub use crate::profile::{classify, classify_as, classify_view, Profile};
pub use crate::rules::{
    vendor_error, Rule, Verdict, BOOKING_RULES, PNR_LIST_RULES, STRUCTURED_RULES, TEXT_RULES,
    TICKETING_RULES, TICKET_RETRIEVAL_RULES,
};
