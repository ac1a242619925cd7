use chrono::{Days, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// An itinerary line such as ` 1. OK OPEN Y  12JUN DOHODM NO1`.
static SEGMENT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d{1,2})\.\s+([A-Z0-9]{2})\s+OPEN\s+([A-Z])\s+(\d{2}[A-Z]{3})\s+([A-Z]{3})([A-Z]{3})\s+(\S+)")
        .expect("regex for open segment lines")
});

/// An open segment added to a record so that it can be imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceholderSegment {
    pub carrier: String,
    pub class: String,
    pub date: NaiveDate,
    pub origin: String,
    pub destination: String,
    pub remark: String,
}

impl Default for PlaceholderSegment {
    fn default() -> Self {
        Self {
            carrier: "OK".to_string(),
            class: "Y".to_string(),
            date: NaiveDate::default(),
            origin: "DOH".to_string(),
            destination: "ODM".to_string(),
            remark: "NO1".to_string(),
        }
    }
}

impl PlaceholderSegment {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            ..Self::default()
        }
    }

    /// Segment dated `days` after `today`.
    pub fn days_ahead(today: NaiveDate, days: u64) -> Self {
        Self::new(today.checked_add_days(Days::new(days)).unwrap_or(today))
    }

    pub fn with_carrier(mut self, carrier: impl Into<String>) -> Self {
        self.carrier = carrier.into();
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }

    pub fn with_route(mut self, origin: impl Into<String>, destination: impl Into<String>) -> Self {
        self.origin = origin.into();
        self.destination = destination.into();
        self
    }

    pub fn with_remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = remark.into();
        self
    }

    /// `12JUN` form of the segment date.
    pub fn day_month(&self) -> String {
        self.date.format("%d%b").to_string().to_ascii_uppercase()
    }

    /// Host command adding the segment.
    pub fn command(&self) -> String {
        format!(
            "0{}OPEN{}{}{}{}{}",
            self.carrier,
            self.class,
            self.day_month(),
            self.origin,
            self.destination,
            self.remark
        )
    }

    /// Line the host answers with once the segment is in the record.
    pub fn confirmation_line(&self) -> String {
        format!(
            "1. {} OPEN {}  {} {}{} {}",
            self.carrier,
            self.class,
            self.day_month(),
            self.origin,
            self.destination,
            self.remark
        )
    }
}

/// One open segment listed on a PNR display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentLine {
    pub ordinal: u8,
    pub carrier: String,
    pub class: String,
    pub date: String,
    pub origin: String,
    pub destination: String,
    pub remark: String,
}

impl SegmentLine {
    /// Same segment as `segment`, at any position in the itinerary.
    pub fn describes(&self, segment: &PlaceholderSegment) -> bool {
        let same = |a: &str, b: &str| a.trim().eq_ignore_ascii_case(b.trim());
        same(&self.carrier, &segment.carrier)
            && same(&self.class, &segment.class)
            && same(&self.date, &segment.day_month())
            && same(&self.origin, &segment.origin)
            && same(&self.destination, &segment.destination)
            && same(&self.remark, &segment.remark)
    }
}

/// Open segment lines of a screen, in display order.
pub fn parse_segment_lines(screen: &str) -> Vec<SegmentLine> {
    screen
        .lines()
        .filter_map(|line| {
            let line = line.to_ascii_uppercase();
            let caps = SEGMENT_LINE.captures(&line)?;
            let text = |i: usize| caps.get(i).map(|m| m.as_str().to_string()).unwrap_or_default();
            Some(SegmentLine {
                ordinal: text(1).parse().ok()?,
                carrier: text(2),
                class: text(3),
                date: text(4),
                origin: text(5),
                destination: text(6),
                remark: text(7),
            })
        })
        .collect()
}

/// Whether the host lists `segment` on `screen`.
pub fn contains_segment_line(screen: &str, segment: &PlaceholderSegment) -> bool {
    parse_segment_lines(screen)
        .iter()
        .any(|line| line.describes(segment))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn renders_command_and_confirmation() {
        let segment = PlaceholderSegment::new(date(2024, 3, 5));
        assert_eq!(segment.command(), "0OKOPENY05MARDOHODMNO1");
        assert_eq!(segment.confirmation_line(), "1. OK OPEN Y  05MAR DOHODM NO1");
    }

    #[test]
    fn builders_override_defaults() {
        let segment = PlaceholderSegment::new(date(2024, 12, 31))
            .with_carrier("PS")
            .with_class("C")
            .with_route("KBP", "LWO")
            .with_remark("HK1");
        assert_eq!(segment.command(), "0PSOPENC31DECKBPLWOHK1");
    }

    #[test]
    fn days_ahead_crosses_months() {
        let segment = PlaceholderSegment::days_ahead(date(2024, 1, 20), 42);
        assert_eq!(segment.date, date(2024, 3, 2));
        assert_eq!(segment.day_month(), "02MAR");
    }

    #[test]
    fn parses_lines_case_insensitively() {
        let screen = concat!(
            "PNR001/ODM 7J8J AG 12MAY\n",
            " 1. ok open y  12jun dohodm no1\n",
            " 2. PS OPEN C  14JUN KBPLWO HK1\n",
            "TKTG-T/"
        );
        let lines = parse_segment_lines(screen);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].ordinal, 1);
        assert_eq!(lines[0].carrier, "OK");
        assert_eq!(lines[1].origin, "KBP");
        assert_eq!(lines[1].destination, "LWO");
    }

    #[test]
    fn finds_segment_at_any_position() {
        let segment = PlaceholderSegment::new(date(2024, 6, 12));
        let screen = "PNR001/\n 1. PS  101 Y  10JUN KBPAMS HK1\n 2. OK OPEN Y  12JUN DOHODM NO1";
        assert!(contains_segment_line(screen, &segment));
        assert!(!contains_segment_line(screen, &segment.clone().with_remark("NO2")));
        assert!(!contains_segment_line("PNR001/", &segment));
    }
}
