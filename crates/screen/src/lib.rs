//! Text screens returned by the booking host's terminal emulation.
//!
//! The terminal is the fallback channel when structured retrieval fails, so
//! everything here reads plain screen text:
//!
//! - [`extract_pnr_locator`] finds the record locator heading a PNR display;
//! - [`extract_ticket_pnr`] finds the `RLOC` line of a ticket display;
//! - [`PlaceholderSegment`] renders the open-segment command used to force a
//!   record into a state the structured API can import, and
//!   [`contains_segment_line`] checks that the host shows it back.
//!
//! ```
//! use chrono::NaiveDate;
//! use screen::{contains_segment_line, extract_pnr_locator, PlaceholderSegment};
//!
//! let segment = PlaceholderSegment::new(NaiveDate::from_ymd_opt(2024, 6, 12).unwrap());
//! assert_eq!(segment.command(), "0OKOPENY12JUNDOHODMNO1");
//!
//! let screen = format!("PNR001/\n{}", segment.confirmation_line());
//! assert_eq!(extract_pnr_locator(&screen).as_deref(), Some("PNR001"));
//! assert!(contains_segment_line(&screen, &segment));
//! ```

mod locator;
mod segment;

pub use crate::locator::{extract_pnr_locator, extract_ticket_pnr, shows_pnr};
pub use crate::segment::{
    contains_segment_line, parse_segment_lines, PlaceholderSegment, SegmentLine,
};

use serde::Serialize;

/// Everything recognisable on one screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScreenSummary {
    pub pnr: Option<String>,
    pub ticket_pnr: Option<String>,
    pub segments: Vec<SegmentLine>,
}

pub fn summarize(screen: &str) -> ScreenSummary {
    ScreenSummary {
        pnr: extract_pnr_locator(screen),
        ticket_pnr: extract_ticket_pnr(screen),
        segments: parse_segment_lines(screen),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_of_ticket_display() {
        let summary = summarize("TKT: 566 0000 000001\nRLOC 1G ABC123\nNAME: PETRENKO/IVAN");
        assert_eq!(summary.pnr, None);
        assert_eq!(summary.ticket_pnr.as_deref(), Some("ABC123"));
        assert!(summary.segments.is_empty());
    }

    #[test]
    fn summary_serializes_as_json() {
        let summary = summarize("PNR001/\n 1. OK OPEN Y  12JUN DOHODM NO1");
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["pnr"], "PNR001");
        assert_eq!(json["segments"][0]["origin"], "DOH");
    }
}
