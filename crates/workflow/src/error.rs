use classify::{ClassifiedError, ErrorKind};
use document::RawDocument;
use thiserror::Error;

/// Failure reported by a [`Transport`](crate::Transport).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    /// The vendor answered with a fault document; it is classified by the caller.
    #[error("vendor fault")]
    Fault(RawDocument),
    /// The request never produced a vendor answer.
    #[error("transport failure: {0}")]
    Other(String),
}

/// Failure of a terminal-emulation session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TerminalError {
    #[error("terminal session could not be opened: {0}")]
    Open(String),
    #[error("terminal command {command:?} failed: {message}")]
    Command { command: String, message: String },
    #[error("terminal session could not be closed: {0}")]
    Close(String),
}

impl From<TerminalError> for ClassifiedError {
    fn from(err: TerminalError) -> Self {
        ClassifiedError::new(ErrorKind::TerminalFailure, err.to_string())
    }
}
