//! Raw vendor document access layer.
//!
//! Vendor responses arrive as deeply nested maps whose key names embed a
//! namespace prefix and, for the shared `common` namespace, the schema version
//! (`common_v52_0:BookingTraveler`). Everything above this crate reads those
//! documents through [`Node`] and [`Tag`] so that no caller ever formats a
//! versioned key by hand.
//!
//! ## What we do
//!
//! - Wrap the decoded JSON tree in an owned [`RawDocument`]
//! - Qualify tag names against a [`SchemaVersion`] token
//! - Read a child that may be a single object, an array, or a keyed map as one
//!   ordered sequence
//! - Surface missing required attributes as typed [`DocumentError`]s
//!
//! ## Example
//!
//! ```
//! use document::{tags, RawDocument, SchemaVersion};
//! use serde_json::json;
//!
//! let schema = SchemaVersion::default();
//! let doc = RawDocument::new(json!({
//!     "universal:UniversalRecord": {
//!         "LocatorCode": "UR0001",
//!         "common_v52_0:BookingTraveler": { "Key": "BT1", "TravelerType": "ADT" }
//!     }
//! }));
//!
//! let record = doc.root(&schema).required_child(tags::UNIVERSAL_RECORD).unwrap();
//! assert_eq!(record.attr("LocatorCode").as_deref(), Some("UR0001"));
//! assert_eq!(record.children(tags::BOOKING_TRAVELER).len(), 1);
//! ```

mod error;
mod node;
mod schema;
pub mod tags;

pub use crate::error::DocumentError;
pub use crate::node::{Node, RawDocument};
pub use crate::schema::{Namespace, SchemaVersion, Tag};
