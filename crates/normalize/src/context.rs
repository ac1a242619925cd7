use std::fmt;
use std::str::FromStr;

use document::SchemaVersion;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-call normalization settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeContext {
    /// Schema version the documents were produced under.
    pub schema: SchemaVersion,
}

impl NormalizeContext {
    pub fn new(schema: SchemaVersion) -> Self {
        Self { schema }
    }
}

/// Which vendor response a document is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    UniversalRecord,
    Ticket,
    Tickets,
    Ticketing,
    Void,
    Cancel,
    CreateReservation,
    PnrList,
    RecordAck,
}

impl ResponseKind {
    pub const ALL: [ResponseKind; 9] = [
        ResponseKind::UniversalRecord,
        ResponseKind::Ticket,
        ResponseKind::Tickets,
        ResponseKind::Ticketing,
        ResponseKind::Void,
        ResponseKind::Cancel,
        ResponseKind::CreateReservation,
        ResponseKind::PnrList,
        ResponseKind::RecordAck,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResponseKind::UniversalRecord => "universal_record",
            ResponseKind::Ticket => "ticket",
            ResponseKind::Tickets => "tickets",
            ResponseKind::Ticketing => "ticketing",
            ResponseKind::Void => "void",
            ResponseKind::Cancel => "cancel",
            ResponseKind::CreateReservation => "create_reservation",
            ResponseKind::PnrList => "pnr_list",
            ResponseKind::RecordAck => "record_ack",
        }
    }
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown response kind: {0}")]
pub struct UnknownResponseKind(pub String);

impl FromStr for ResponseKind {
    type Err = UnknownResponseKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_").to_ascii_lowercase();
        ResponseKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| UnknownResponseKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_kind_parses_both_separators() {
        assert_eq!("pnr-list".parse::<ResponseKind>(), Ok(ResponseKind::PnrList));
        assert_eq!("Universal_Record".parse::<ResponseKind>(), Ok(ResponseKind::UniversalRecord));
        assert!("booking".parse::<ResponseKind>().is_err());
        for kind in ResponseKind::ALL {
            assert_eq!(kind.to_string().parse::<ResponseKind>(), Ok(kind));
        }
    }

    #[test]
    fn context_deserializes_with_default_schema() {
        let ctx: NormalizeContext = serde_json::from_str("{}").unwrap();
        assert_eq!(ctx.schema, SchemaVersion::default());
        let ctx: NormalizeContext = serde_json::from_str(r#"{"schema":"v47_0"}"#).unwrap();
        assert_eq!(ctx.schema, SchemaVersion::new(47, 0));
    }
}
