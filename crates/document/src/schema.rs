//! Schema-version tokens and namespace-qualified tag names.
//!
//! The vendor versions only the `common` namespace in its key names, so
//! `air:AirSegment` is stable while `common_v52_0:BookingTraveler` moves with
//! the schema. [`SchemaVersion::qualify`] is the single place where a key is
//! formed from a [`Tag`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DocumentError;

/// XML namespace a vendor element lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Air,
    Universal,
    /// Shared types; the only namespace whose prefix carries the schema version.
    Common,
}

/// A vendor element name, unqualified until paired with a [`SchemaVersion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag {
    pub namespace: Namespace,
    pub local: &'static str,
}

impl Tag {
    pub const fn air(local: &'static str) -> Self {
        Self {
            namespace: Namespace::Air,
            local,
        }
    }

    pub const fn universal(local: &'static str) -> Self {
        Self {
            namespace: Namespace::Universal,
            local,
        }
    }

    pub const fn common(local: &'static str) -> Self {
        Self {
            namespace: Namespace::Common,
            local,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.namespace {
            Namespace::Air => "air",
            Namespace::Universal => "universal",
            Namespace::Common => "common",
        };
        write!(f, "{prefix}:{}", self.local)
    }
}

/// Schema-version token such as `v52_0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchemaVersion {
    major: u16,
    minor: u16,
}

impl SchemaVersion {
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    /// Parse a `v<major>_<minor>` token.
    pub fn parse(token: &str) -> Result<Self, DocumentError> {
        let invalid = || DocumentError::InvalidSchemaVersion(token.to_string());
        let rest = token.trim().strip_prefix('v').ok_or_else(invalid)?;
        let (major, minor) = rest.split_once('_').ok_or_else(invalid)?;
        let major = major.parse::<u16>().map_err(|_| invalid())?;
        let minor = minor.parse::<u16>().map_err(|_| invalid())?;
        Ok(Self { major, minor })
    }

    pub fn major(&self) -> u16 {
        self.major
    }

    pub fn minor(&self) -> u16 {
        self.minor
    }

    /// Key under which `tag` appears in documents of this schema version.
    pub fn qualify(&self, tag: Tag) -> String {
        match tag.namespace {
            Namespace::Air => format!("air:{}", tag.local),
            Namespace::Universal => format!("universal:{}", tag.local),
            Namespace::Common => format!("common_{self}:{}", tag.local),
        }
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::new(52, 0)
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}_{}", self.major, self.minor)
    }
}

impl FromStr for SchemaVersion {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SchemaVersion {
    type Error = DocumentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SchemaVersion> for String {
    fn from(value: SchemaVersion) -> Self {
        value.to_string()
    }
}
