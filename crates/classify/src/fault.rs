use document::{tags, Node, RawDocument, SchemaVersion};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::RecordRef;

static PCC_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i:\bagreement(?:\s+exists)?\s+for|\bpcc)\s+(?:(?i:pcc)\s+)?([0-9A-Z]{3,4})\b")
        .expect("regex for pcc tokens")
});

/// Envelope keys a fault body may be nested under.
const FAULT_ENVELOPES: [&str; 3] = ["SOAP:Fault", "soap:Fault", "Fault"];

/// The facts a classification rule can look at, extracted once per document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaultView {
    code: Option<u32>,
    raw_code: Option<String>,
    fault_string: Option<String>,
    response_messages: Vec<String>,
    document_failure: Option<String>,
    sub_errors: Vec<String>,
    record: Option<RecordRef>,
}

impl FaultView {
    pub fn from_document(doc: &RawDocument, schema: &SchemaVersion) -> Self {
        let root = doc.root(schema);
        let fault = FAULT_ENVELOPES
            .iter()
            .find_map(|key| root.field(key))
            .unwrap_or(root);
        Self::from_node(fault)
    }

    pub fn from_node(fault: Node<'_>) -> Self {
        let detail = fault.field("detail");

        let error_info_code = detail
            .and_then(|d| d.child(tags::ERROR_INFO))
            .and_then(|info| info.child(tags::ERROR_CODE))
            .and_then(|code| code.text())
            .map(|code| code.trim().to_string());

        let sub_errors = detail
            .and_then(|d| d.child(tags::AVAILABILITY_ERROR_INFO))
            .map(|info| {
                info.children(tags::AIR_SEGMENT_ERROR)
                    .iter()
                    .filter_map(|seg| seg.child(tags::ERROR_MESSAGE))
                    .filter_map(|msg| msg.text().map(|t| t.trim().to_string()))
                    .collect()
            })
            .unwrap_or_default();

        let record = detail
            .and_then(|d| d.child(tags::UNIVERSAL_RECORD))
            .and_then(|ur| {
                ur.attr("LocatorCode").map(|locator| RecordRef {
                    ur_locator: locator.into_owned(),
                    version: ur.attr("Version").map(|v| v.into_owned()),
                })
            });

        let failure = fault.child(tags::DOCUMENT_FAILURE_INFO);
        let document_failure = failure
            .and_then(|f| f.attr("Message").or_else(|| f.text()))
            .map(|m| m.trim().to_string());

        let error_messages: Vec<Node<'_>> = fault
            .children(tags::RESPONSE_MESSAGE)
            .into_iter()
            .filter(|m| m.attr("Type").is_none_or(|t| t.eq_ignore_ascii_case("error")))
            .collect();
        let response_messages = error_messages
            .iter()
            .filter_map(|m| m.text().map(|t| t.trim().to_string()))
            .filter(|t| !t.is_empty())
            .collect();

        let raw_code = error_info_code
            .or_else(|| failure.and_then(|f| f.attr("Code")).map(|c| c.into_owned()))
            .or_else(|| {
                error_messages
                    .iter()
                    .find_map(|m| m.attr("Code").map(|c| c.into_owned()))
            })
            .filter(|c| !c.is_empty());

        Self {
            code: raw_code.as_deref().and_then(|c| c.parse().ok()),
            raw_code,
            fault_string: fault
                .attr("faultstring")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            response_messages,
            document_failure,
            sub_errors,
            record,
        }
    }

    pub fn with_fault_string(mut self, text: impl Into<String>) -> Self {
        self.fault_string = Some(text.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        let code = code.into();
        self.code = code.parse().ok();
        self.raw_code = Some(code);
        self
    }

    pub fn with_sub_error(mut self, text: impl Into<String>) -> Self {
        self.sub_errors.push(text.into());
        self
    }

    pub fn with_response_message(mut self, text: impl Into<String>) -> Self {
        self.response_messages.push(text.into());
        self
    }

    /// Numeric vendor code, when one decodes.
    pub fn code(&self) -> Option<u32> {
        self.code
    }

    /// Vendor code exactly as sent, even when it does not decode.
    pub fn raw_code(&self) -> Option<&str> {
        self.raw_code.as_deref()
    }

    pub fn sub_errors(&self) -> &[String] {
        &self.sub_errors
    }

    pub fn record(&self) -> Option<&RecordRef> {
        self.record.as_ref()
    }

    /// True when the document says anything at all about a failure.
    pub fn has_content(&self) -> bool {
        self.fault_string.is_some()
            || !self.response_messages.is_empty()
            || self.document_failure.is_some()
    }

    /// Primary human-readable text of the fault.
    pub fn message(&self) -> String {
        if let Some(text) = &self.fault_string {
            return text.clone();
        }
        if let Some(text) = &self.document_failure {
            return text.clone();
        }
        self.response_messages.join("; ")
    }

    /// All fault text, for free-text rules.
    pub fn full_text(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        parts.extend(self.fault_string.as_deref());
        parts.extend(self.document_failure.as_deref());
        parts.extend(self.response_messages.iter().map(String::as_str));
        parts.extend(self.sub_errors.iter().map(String::as_str));
        parts.join("\n")
    }

    pub fn contains_ci(&self, needle: &str) -> bool {
        self.full_text()
            .to_ascii_lowercase()
            .contains(&needle.to_ascii_lowercase())
    }

    pub fn matches(&self, pattern: &Regex) -> bool {
        pattern.is_match(&self.full_text())
    }

    /// Agency pseudo city code named in the fault text.
    pub fn pcc(&self) -> Option<String> {
        PCC_TOKEN
            .captures(&self.full_text())
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str().to_string())
    }
}
