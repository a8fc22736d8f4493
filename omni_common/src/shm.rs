//! Shared memory subsystem.
//!
//! This module contains:
//! - `layout`: Typed `#[repr(C)]` structures of the segment image, the
//!   ordered field descriptors and the write/read block offsets.
//! - `codec`: Byte encoding of the plain-old-data layout structures.
//! - [`SegmentId`]: How a client names the producer's segment.

pub mod codec;
pub mod layout;

use crate::consts::DEFAULT_SHM_KEY;
use std::fmt;

/// Identifier of the shared-memory object published by the device process.
///
/// The device process uses a System V key; a POSIX object name is accepted
/// for producers that publish through `shm_open` instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SegmentId {
    /// System V IPC key (`shmget`).
    SysV(i32),
    /// POSIX shared memory object name (`shm_open`).
    Posix(String),
}

impl SegmentId {
    /// Build a POSIX identifier, normalizing the name to a leading `/`.
    pub fn posix(name: impl Into<String>) -> Self {
        let name = name.into();
        if name.starts_with('/') {
            Self::Posix(name)
        } else {
            Self::Posix(format!("/{name}"))
        }
    }

    /// Build a System V identifier.
    pub const fn sysv(key: i32) -> Self {
        Self::SysV(key)
    }
}

impl Default for SegmentId {
    fn default() -> Self {
        Self::SysV(DEFAULT_SHM_KEY)
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SysV(key) => write!(f, "sysv:{key}"),
            Self::Posix(name) => write!(f, "posix:{name}"),
        }
    }
}
