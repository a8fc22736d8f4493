//! Omni Common Library
//!
//! This crate provides the shared-memory wire contract between the Phantom
//! Omni device process (producer) and its clients, together with the
//! constants and configuration loading used by every workspace crate.
//!
//! # Module Structure
//!
//! - [`shm`] - Segment identifiers, binary layout and byte codec
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - Default key, poll rate and paths
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use omni_common::shm::layout::{Feedback, ReadMessage, SegmentLayout};
//! use omni_common::shm::SegmentId;
//!
//! let id = SegmentId::default();
//! assert_eq!(SegmentLayout::READ_OFFSET, core::mem::size_of::<Feedback>());
//! assert_eq!(
//!     SegmentLayout::TOTAL_SIZE,
//!     core::mem::size_of::<Feedback>() + core::mem::size_of::<ReadMessage>()
//! );
//! # let _ = id;
//! ```

#![deny(missing_docs)]

pub mod config;
pub mod consts;
pub mod prelude;
pub mod shm;
