//! Run configuration of one dataset normalization.
//!
//! # Invariants
//! - Missing JSON fields fall back to [`NormalizerConfig::default`].
//! - A validated config always has a positive batch size, a supported log
//!   level and, when set, an absolute log directory.

use crate::logging::{init_logging, LogLevel, LogSetup};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Records handled between two batch checkpoints.
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Dataset being normalized, used in log lines only.
    pub dataset_key: i64,
    pub batch_size: usize,
    pub log_level: String,
    /// Absolute log directory. Logging stays untouched when absent.
    pub log_dir: Option<String>,
    /// Copy warnings to stderr in addition to the log file.
    pub log_to_stderr: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            dataset_key: 0,
            batch_size: DEFAULT_BATCH_SIZE,
            log_level: LogLevel::for_build().as_str().to_string(),
            log_dir: None,
            log_to_stderr: false,
        }
    }
}

impl NormalizerConfig {
    pub fn for_dataset(dataset_key: i64) -> Self {
        Self {
            dataset_key,
            ..Self::default()
        }
    }

    /// Parses and validates a JSON config document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid {
                field: "batch_size",
                message: "must be greater than zero".to_string(),
            });
        }
        self.log_setup()?;
        Ok(())
    }

    /// Log setup described by this config, `None` without log directory.
    pub fn log_setup(&self) -> Result<Option<LogSetup>, ConfigError> {
        let level = LogLevel::parse(&self.log_level).map_err(|err| ConfigError::Invalid {
            field: "log_level",
            message: err.to_string(),
        })?;
        let Some(log_dir) = self.log_dir.as_deref() else {
            return Ok(None);
        };
        let setup = LogSetup::new(level, log_dir.trim()).map_err(|err| ConfigError::Invalid {
            field: "log_dir",
            message: err.to_string(),
        })?;
        Ok(Some(setup.with_stderr(self.log_to_stderr)))
    }

    /// Starts file logging when a log directory is configured.
    pub fn init_logging(&self) -> Result<(), ConfigError> {
        let Some(setup) = self.log_setup()? else {
            return Ok(());
        };
        init_logging(&setup).map_err(|err| ConfigError::Invalid {
            field: "log_dir",
            message: err.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Parse(String),
    Invalid {
        field: &'static str,
        message: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(message) => write!(f, "invalid normalizer config: {message}"),
            Self::Invalid { field, message } => {
                write!(f, "invalid normalizer config field `{field}`: {message}")
            }
        }
    }
}

impl Error for ConfigError {}
