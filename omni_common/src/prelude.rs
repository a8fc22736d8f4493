//! Prelude module for common re-exports.
//!
//! ```rust
//! use omni_common::prelude::*;
//! ```

use std::time::Duration;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    ClientConfig, ConfigError, ConfigLoader, LogLevel, PollConfig, SegmentConfig, SharedConfig,
};

// ─── Constants ──────────────────────────────────────────────────────
pub use crate::consts::{
    DEFAULT_CONFIG_PATH, DEFAULT_POLL_RATE_HZ, DEFAULT_SERVICE_NAME, DEFAULT_SHM_KEY,
};

// ─── Segment layout ─────────────────────────────────────────────────
pub use crate::shm::SegmentId;
pub use crate::shm::codec::{LayoutError, ShmRecord};
pub use crate::shm::layout::{
    ButtonEvent, Buttons, Feedback, JointState, OmniState, ReadMessage, SegmentLayout, Vector3d,
};

/// Default client poll period (10 ms).
pub const DEFAULT_POLL_PERIOD: Duration = Duration::from_millis(10);
