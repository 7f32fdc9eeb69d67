//! Host configuration for the demo binary, read from a JSON file.
//!
//! ```json
//! {
//!   "worker_count": 4,
//!   "log_level": "debug",
//!   "json_logs": false,
//!   "demos": ["keyed-executor", "applied-queue"]
//! }
//! ```
//!
//! Every field is optional.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use applied_api::errors::AppliedError;

use crate::config::ExecutorConfig;
use crate::logging::LogConfig;

/// Errors raised while loading or applying host configuration.
#[derive(Debug, Error)]
pub enum HostError {
    /// The configuration file could not be read.
    #[error("I/O error reading {path}: {error}")]
    Io {
        path: PathBuf,
        error: std::io::Error,
    },

    /// The file is not valid configuration JSON.
    #[error("Invalid host configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// `log_level` does not name a level.
    #[error("Unknown log level: {0}")]
    UnknownLogLevel(String),

    /// The configured pool settings are rejected.
    #[error(transparent)]
    Executor(#[from] AppliedError),
}

/// Settings for one run of the demo binary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Workers per pool; one per CPU when absent.
    pub worker_count: Option<usize>,

    /// Minimum log level, e.g. "info" or "debug".
    pub log_level: Option<String>,

    /// Emit JSON log lines.
    pub json_logs: bool,

    /// Demos to run, by name; every bundled demo when empty.
    pub demos: Vec<String>,
}

impl HostConfig {
    /// Reads and parses the file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, HostError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|error| HostError::Io {
            path: path.to_path_buf(),
            error,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, HostError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Pool configuration implied by these settings.
    pub fn executor_config(&self) -> Result<ExecutorConfig, HostError> {
        let config = match self.worker_count {
            Some(workers) => ExecutorConfig::with_workers(workers),
            None => ExecutorConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Logging configuration implied by these settings.
    pub fn log_config(&self) -> Result<LogConfig, HostError> {
        let mut config = match &self.log_level {
            Some(level) => LogConfig::from_level_name(level)
                .ok_or_else(|| HostError::UnknownLogLevel(level.clone()))?,
            None => LogConfig::default(),
        };
        config.json_format = self.json_logs;
        Ok(config)
    }
}
