//! Effective monitor settings: configuration file plus CLI overrides.

use omni_common::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Values given on the command line. `None` keeps the configured value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// System V key.
    pub key: Option<i32>,
    /// POSIX object name.
    pub name: Option<String>,
    /// Poll rate in Hz.
    pub rate_hz: Option<f64>,
    /// Stop after this many cycles; 0 runs until interrupted.
    pub cycles: u64,
    /// Constant force along Z sent every cycle.
    pub force_z: f64,
}

/// Resolved settings the monitor runs with.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSettings {
    /// Instance name for logs.
    pub service_name: String,
    /// Configured log level (CLI `-v` takes precedence).
    pub log_level: LogLevel,
    /// Segment to attach to.
    pub segment: SegmentId,
    /// Poll period.
    pub period: Duration,
    /// Cycle limit; `None` runs until interrupted.
    pub max_cycles: Option<u64>,
    /// Force command sent every cycle.
    pub force: Vector3d,
}

impl MonitorSettings {
    /// Cycles between two info-level reports (about once per second).
    pub fn report_every(&self) -> u64 {
        let per_second = 1.0 / self.period.as_secs_f64();
        (per_second.round() as u64).max(1)
    }
}

/// Load the configuration file.
///
/// An explicit path must exist. Without one, [`DEFAULT_CONFIG_PATH`] is used
/// if present and built-in defaults otherwise.
pub fn load_config(path: Option<&Path>) -> Result<ClientConfig, ConfigError> {
    match path {
        Some(path) => ClientConfig::load(path),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default.exists() {
                ClientConfig::load(&default)
            } else {
                Ok(ClientConfig::default())
            }
        }
    }
}

/// Merge `overrides` into `config` and validate the result.
pub fn resolve(config: ClientConfig, overrides: &Overrides) -> Result<MonitorSettings, ConfigError> {
    let mut config = config;
    match (overrides.key, overrides.name.as_ref()) {
        (None, None) => {}
        (key, name) => {
            config.segment = SegmentConfig {
                key,
                name: name.cloned(),
            }
        }
    }
    if let Some(rate_hz) = overrides.rate_hz {
        config.poll.rate_hz = rate_hz;
    }
    config.validate()?;

    if !overrides.force_z.is_finite() {
        return Err(ConfigError::ValidationError(format!(
            "force must be finite, got {}",
            overrides.force_z
        )));
    }

    Ok(MonitorSettings {
        service_name: config.shared.service_name.clone(),
        log_level: config.shared.log_level,
        segment: config.segment.segment_id()?,
        period: config.poll.period(),
        max_cycles: (overrides.cycles > 0).then_some(overrides.cycles),
        force: Vector3d::new(0.0, 0.0, overrides.force_z),
    })
}
