use thiserror::Error;

/// Errors raised while decoding or walking a raw vendor document.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DocumentError {
    /// The schema-version token is not of the form `v<major>_<minor>`.
    #[error("invalid schema version token: {0}")]
    InvalidSchemaVersion(String),
    /// The document text could not be decoded into a JSON tree.
    #[error("document decode failed: {0}")]
    Decode(String),
    /// A structurally required attribute or child element is absent.
    #[error("missing required field: {0}")]
    MissingField(String),
}

impl DocumentError {
    /// Name of the missing field, when this is a [`DocumentError::MissingField`].
    pub fn missing_field(&self) -> Option<&str> {
        match self {
            DocumentError::MissingField(field) => Some(field),
            _ => None,
        }
    }
}
