//! Platform-specific segment attachment.

pub mod linux;

pub use linux::{Mapping, attach, current_pid};
