//! Workflow policies.
//!
//! Every bound the workflows apply is a field here; nothing retries unless a
//! count in [`TicketingPolicy`] allows it.

use chrono::{Days, NaiveDate, Utc};
use normalize::NormalizeContext;
use screen::PlaceholderSegment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by [`WorkflowConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The ticket-issue call cap is zero, so ticketing could never be attempted.
    #[error("ticketing.max_attempts must be at least 1")]
    ZeroTicketingAttempts,

    /// A placeholder segment field does not have the host's fixed format.
    #[error("import.{field} {value:?} is not a valid placeholder value ({expected})")]
    InvalidPlaceholder {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    /// No `R:` received-from tag to save the record with.
    #[error("import.received_from must not be empty")]
    EmptyReceivedFrom,
}

/// Retry bounds for ticket issuance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketingPolicy {
    /// Retries after a FOID-required rejection.
    pub foid_retries: u32,
    /// Retries after a PNR-busy rejection.
    pub pnr_busy_retries: u32,
    /// Hard cap on ticket-issue calls per invocation.
    pub max_attempts: u32,
}

impl Default for TicketingPolicy {
    fn default() -> Self {
        Self {
            foid_retries: 1,
            pnr_busy_retries: 1,
            max_attempts: 3,
        }
    }
}

impl TicketingPolicy {
    pub fn with_foid_retries(mut self, retries: u32) -> Self {
        self.foid_retries = retries;
        self
    }

    pub fn with_pnr_busy_retries(mut self, retries: u32) -> Self {
        self.pnr_busy_retries = retries;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::ZeroTicketingAttempts);
        }
        Ok(())
    }
}

/// Placeholder segment and save commands used by the terminal import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub carrier: String,
    pub class: String,
    pub origin: String,
    pub destination: String,
    pub remark: String,
    /// Days from today the segment is dated, unless `date` pins it.
    pub days_ahead: u64,
    pub date: Option<NaiveDate>,
    /// Received-from tag sent as `R:<tag>` before ending the transaction.
    pub received_from: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        let segment = PlaceholderSegment::default();
        Self {
            carrier: segment.carrier,
            class: segment.class,
            origin: segment.origin,
            destination: segment.destination,
            remark: segment.remark,
            days_ahead: 42,
            date: None,
            received_from: "UAPI".to_string(),
        }
    }
}

impl ImportConfig {
    /// Pin the placeholder date.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_days_ahead(mut self, days: u64) -> Self {
        self.days_ahead = days;
        self
    }

    /// Placeholder segment for an import starting on `today`.
    pub fn segment_for(&self, today: NaiveDate) -> PlaceholderSegment {
        let date = self
            .date
            .or_else(|| today.checked_add_days(Days::new(self.days_ahead)))
            .unwrap_or(today);
        PlaceholderSegment::new(date)
            .with_carrier(self.carrier.clone())
            .with_class(self.class.clone())
            .with_route(self.origin.clone(), self.destination.clone())
            .with_remark(self.remark.clone())
    }

    /// Placeholder segment for an import starting now.
    pub fn segment(&self) -> PlaceholderSegment {
        self.segment_for(Utc::now().date_naive())
    }

    /// Commands that save the record after the segment is added.
    pub fn save_commands(&self) -> Vec<String> {
        vec![format!("R:{}", self.received_from), "ER".to_string()]
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check("carrier", &self.carrier, 2, "two letters or digits", |c| {
            c.is_ascii_uppercase() || c.is_ascii_digit()
        })?;
        check("class", &self.class, 1, "one letter", |c| c.is_ascii_uppercase())?;
        check("origin", &self.origin, 3, "three letters", |c| c.is_ascii_uppercase())?;
        check("destination", &self.destination, 3, "three letters", |c| {
            c.is_ascii_uppercase()
        })?;
        if self.remark.trim().is_empty() || self.remark.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidPlaceholder {
                field: "remark",
                value: self.remark.clone(),
                expected: "one word",
            });
        }
        if self.received_from.trim().is_empty() {
            return Err(ConfigError::EmptyReceivedFrom);
        }
        Ok(())
    }
}

fn check(
    field: &'static str,
    value: &str,
    len: usize,
    expected: &'static str,
    allowed: impl Fn(char) -> bool,
) -> Result<(), ConfigError> {
    if value.chars().count() == len && value.chars().all(allowed) {
        Ok(())
    } else {
        Err(ConfigError::InvalidPlaceholder {
            field,
            value: value.to_string(),
            expected,
        })
    }
}

/// Everything an [`Orchestrator`](crate::Orchestrator) is configured with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub ticketing: TicketingPolicy,
    pub import: ImportConfig,
    pub normalize: NormalizeContext,
}

impl WorkflowConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ticketing.validate()?;
        self.import.validate()
    }
}
