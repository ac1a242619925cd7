//! YAML configuration file support.
//!
//! One file configures the orchestrator (ticketing retry policy, the
//! placeholder segment used for terminal imports, the schema version of the
//! vendor documents) and the binary's logging.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! name: "kyiv-office"
//!
//! normalize:
//!   schema: "v52_0"
//!
//! ticketing:
//!   foid_retries: 1
//!   pnr_busy_retries: 1
//!   max_attempts: 3
//!
//! import:
//!   carrier: "OK"
//!   class: "Y"
//!   origin: "DOH"
//!   destination: "ODM"
//!   remark: "NO1"
//!   days_ahead: 42
//!   received_from: "UAPI"
//!
//! logging:
//!   level: "info"
//!   json: true
//! ```

use std::fs;
use std::path::Path;

use normalize::NormalizeContext;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use workflow::{ConfigError, ImportConfig, TicketingPolicy, WorkflowConfig};

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(#[from] ConfigError),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),

    #[error("invalid log level: {0:?}")]
    LogLevel(String),
}

/// Top-level YAML configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FlowConfig {
    /// Configuration format version
    pub version: String,

    /// Optional configuration name/description
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub normalize: NormalizeContext,

    #[serde(default)]
    pub ticketing: TicketingPolicy,

    #[serde(default)]
    pub import: ImportConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl FlowConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: FlowConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;
        self.workflow().validate()?;
        self.logging.validate()
    }

    /// The orchestrator settings of this file.
    pub fn workflow(&self) -> WorkflowConfig {
        WorkflowConfig {
            ticketing: self.ticketing,
            import: self.import.clone(),
            normalize: self.normalize,
        }
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            normalize: NormalizeContext::default(),
            ticketing: TicketingPolicy::default(),
            import: ImportConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Log output of the binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.level.to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" | "off" => Ok(()),
            _ => Err(ConfigLoadError::LogLevel(self.level.clone())),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
