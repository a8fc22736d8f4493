//! System-wide constants for the Omni workspace.
//!
//! Single source of truth for default identifiers, rates and paths.

/// Default System V key the device process publishes its segment under.
pub const DEFAULT_SHM_KEY: i32 = 777;

/// Default client poll rate in Hz (one `update()` every 10 ms).
pub const DEFAULT_POLL_RATE_HZ: f64 = 100.0;

/// Default configuration file path for client applications.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/omni/client.toml";

/// Service name used when no configuration file is present.
pub const DEFAULT_SERVICE_NAME: &str = "omni-monitor";
