//! # Omni Monitor Library
//!
//! Polls the Phantom Omni segment at a fixed rate, reports position,
//! orientation, joints and buttons, and sends a constant force command.
//!
//! # Module Structure
//!
//! - [`settings`] - configuration file and CLI override resolution
//! - [`monitor`] - poll loop, per-cycle sample, timing statistics

#![deny(warnings)]
#![deny(missing_docs)]

pub mod monitor;
pub mod settings;

pub use monitor::{LoopStats, Monitor, Sample};
pub use settings::{MonitorSettings, Overrides, load_config, resolve};
