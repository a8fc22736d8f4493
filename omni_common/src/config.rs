//! Configuration loading traits and types.
//!
//! This module provides a standardized way to load TOML configuration files
//! for Omni client applications.
//!
//! # Usage
//!
//! ```rust,no_run
//! use omni_common::config::{ClientConfig, ConfigLoader, ConfigError};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = ClientConfig::load(Path::new("client.toml"))?;
//!     config.validate()?;
//!     println!("Segment: {}", config.segment.segment_id()?);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::consts::{DEFAULT_POLL_RATE_HZ, DEFAULT_SERVICE_NAME, DEFAULT_SHM_KEY};
use crate::shm::SegmentId;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Common configuration fields shared across Omni applications.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "omni-monitor-01"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Which shared-memory object to attach to.
///
/// At most one of `key` / `name` may be set. With neither, the device's
/// default System V key is used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentConfig {
    /// System V key agreed with the device process.
    #[serde(default)]
    pub key: Option<i32>,

    /// POSIX shared memory object name.
    #[serde(default)]
    pub name: Option<String>,
}

impl SegmentConfig {
    /// Resolve the configured segment identifier.
    pub fn segment_id(&self) -> Result<SegmentId, ConfigError> {
        match (self.key, self.name.as_deref()) {
            (Some(_), Some(_)) => Err(ConfigError::ValidationError(
                "segment.key and segment.name are mutually exclusive".to_string(),
            )),
            (Some(key), None) => Ok(SegmentId::SysV(key)),
            (None, Some("")) => Err(ConfigError::ValidationError(
                "segment.name cannot be empty".to_string(),
            )),
            (None, Some(name)) => Ok(SegmentId::posix(name)),
            (None, None) => Ok(SegmentId::SysV(DEFAULT_SHM_KEY)),
        }
    }
}

fn default_rate_hz() -> f64 {
    DEFAULT_POLL_RATE_HZ
}

/// Client poll loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// `update()` rate in Hz.
    #[serde(default = "default_rate_hz")]
    pub rate_hz: f64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            rate_hz: DEFAULT_POLL_RATE_HZ,
        }
    }
}

impl PollConfig {
    /// Validate the poll rate.
    ///
    /// The rate must be positive and its period must fit a non-zero
    /// [`Duration`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.rate_hz.is_finite() || self.rate_hz <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "poll.rate_hz must be a positive number, got {}",
                self.rate_hz
            )));
        }
        if self.checked_period().is_none() {
            return Err(ConfigError::ValidationError(format!(
                "poll.rate_hz {} has no representable period",
                self.rate_hz
            )));
        }
        Ok(())
    }

    /// Poll period derived from `rate_hz`.
    ///
    /// Falls back to the default rate's period when `rate_hz` does not pass
    /// [`validate`](Self::validate).
    pub fn period(&self) -> Duration {
        self.checked_period()
            .unwrap_or_else(|| Duration::from_secs_f64(1.0 / DEFAULT_POLL_RATE_HZ))
    }

    fn checked_period(&self) -> Option<Duration> {
        Duration::try_from_secs_f64(1.0 / self.rate_hz)
            .ok()
            .filter(|period| !period.is_zero())
    }
}

/// Configuration of an Omni client application.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// service_name = "omni-monitor"
///
/// [segment]
/// key = 777
///
/// [poll]
/// rate_hz = 100.0
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Common settings.
    pub shared: SharedConfig,

    /// Segment selection.
    #[serde(default)]
    pub segment: SegmentConfig,

    /// Poll loop settings.
    #[serde(default)]
    pub poll: PollConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            shared: SharedConfig {
                log_level: LogLevel::default(),
                service_name: DEFAULT_SERVICE_NAME.to_string(),
            },
            segment: SegmentConfig::default(),
            poll: PollConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.segment.segment_id()?;
        self.poll.validate()
    }
}

/// Trait for loading configuration from TOML files.
///
/// This trait provides a default implementation that works with any type
/// implementing `serde::de::DeserializeOwned`.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
