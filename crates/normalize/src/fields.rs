//! Typed reads of vendor attributes.

use chrono::{DateTime, FixedOffset, NaiveDate};
use classify::{classify_view, ClassifiedError, ErrorKind, FaultView, Profile, Verdict};
use document::{DocumentError, Node, Tag};

pub(crate) fn invalid(field: &str, value: &str) -> ClassifiedError {
    ClassifiedError::new(ErrorKind::InvalidFieldValue, format!("invalid {field}: {value:?}"))
}

/// The `tag` child of a response root.
///
/// When it is absent and the root carries error messages or a failure info,
/// those are classified under `profile` instead of reporting a missing field.
/// `Ok(None)` is a failure the profile reads as an empty result.
pub(crate) fn payload<'a>(
    root: &Node<'a>,
    tag: Tag,
    profile: Profile,
) -> Result<Option<Node<'a>>, ClassifiedError> {
    if let Some(node) = root.child(tag) {
        return Ok(Some(node));
    }
    let fault = FaultView::from_node(*root);
    if !fault.has_content() {
        return Err(DocumentError::MissingField(tag.to_string()).into());
    }
    match classify_view(profile, &fault) {
        Verdict::Error(err) => Err(err),
        Verdict::Empty => Ok(None),
    }
}

pub(crate) fn required(node: &Node<'_>, name: &str) -> Result<String, ClassifiedError> {
    Ok(node.required_attr(name)?.into_owned())
}

pub(crate) fn optional(node: &Node<'_>, name: &str) -> Option<String> {
    node.attr(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn datetime(
    node: &Node<'_>,
    name: &str,
) -> Result<DateTime<FixedOffset>, ClassifiedError> {
    let raw = node.required_attr(name)?;
    DateTime::parse_from_rfc3339(raw.trim()).map_err(|_| invalid(name, &raw))
}

pub(crate) fn optional_datetime(
    node: &Node<'_>,
    name: &str,
) -> Result<Option<DateTime<FixedOffset>>, ClassifiedError> {
    match optional(node, name) {
        None => Ok(None),
        Some(raw) => DateTime::parse_from_rfc3339(&raw)
            .map(Some)
            .map_err(|_| invalid(name, &raw)),
    }
}

pub(crate) fn optional_date(
    node: &Node<'_>,
    name: &str,
) -> Result<Option<NaiveDate>, ClassifiedError> {
    match optional(node, name) {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| invalid(name, &raw)),
    }
}

pub(crate) fn number(node: &Node<'_>, name: &str) -> Result<u32, ClassifiedError> {
    let raw = node.required_attr(name)?;
    raw.trim().parse().map_err(|_| invalid(name, &raw))
}

pub(crate) fn optional_number(node: &Node<'_>, name: &str) -> Result<Option<u32>, ClassifiedError> {
    match optional(node, name) {
        None => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(|_| invalid(name, &raw)),
    }
}

/// Vendor booleans arrive as `true`/`false` text.
pub(crate) fn flag(node: &Node<'_>, name: &str) -> bool {
    node.attr(name)
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}
