use once_cell::sync::Lazy;
use regex::Regex;

/// Locator at the start of a PNR display, after the optional busy banner.
static PNR_LOCATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\*\* THIS BF IS CURRENTLY IN USE \*\*\s*)?([A-Z0-9]{6})/")
        .expect("regex for pnr locator")
});

static TICKET_PNR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"RLOC [^\s]{2} ([^\s]{6})").expect("regex for ticket record locator"));

/// Record locator shown at the top of a PNR display.
pub fn extract_pnr_locator(screen: &str) -> Option<String> {
    PNR_LOCATOR
        .captures(screen.trim_start())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Record locator of the booking a displayed ticket belongs to.
pub fn extract_ticket_pnr(screen: &str) -> Option<String> {
    TICKET_PNR
        .captures(screen)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Whether `screen` is the display of record `pnr`.
pub fn shows_pnr(screen: &str, pnr: &str) -> bool {
    extract_pnr_locator(screen).is_some_and(|found| found.eq_ignore_ascii_case(pnr))
}
