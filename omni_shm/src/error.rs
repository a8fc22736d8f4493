//! Error types for shared memory operations

use omni::shm::codec::LayoutError;
use thiserror::Error;

/// Errors that can occur during shared memory operations.
///
/// OS failures are translated into these kinds at the segment boundary;
/// raw errno values are never exposed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShmError {
    /// Segment does not exist
    #[error("Segment not found: {segment} - check the device process is running")]
    NotFound {
        /// Segment identifier
        segment: String,
    },

    /// Permission denied
    #[error("Permission denied accessing segment: {segment}")]
    PermissionDenied {
        /// Segment identifier
        segment: String,
    },

    /// Segment exists but could not be attached (OS limits, invalid key, ...)
    #[error("Failed to attach segment {segment}: {reason}")]
    AttachFailed {
        /// Segment identifier
        segment: String,
        /// OS error description
        reason: String,
    },

    /// Attached segment size differs from the expected layout size
    #[error("Segment {segment} is {actual} bytes, layout requires {expected} bytes")]
    SizeMismatch {
        /// Segment identifier
        segment: String,
        /// Expected size in bytes
        expected: usize,
        /// Actual size in bytes
        actual: usize,
    },

    /// Operation on a handle that is not attached
    #[error("Segment not opened")]
    NotOpen,

    /// Byte range outside the segment
    #[error("Access of {len} bytes at offset {offset} exceeds segment size {size}")]
    OutOfBounds {
        /// Start offset
        offset: usize,
        /// Access length
        len: usize,
        /// Segment size
        size: usize,
    },

    /// Decoding error
    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),
}

impl ShmError {
    /// Whether the error is one of the attach-time failures.
    pub fn is_attach_failure(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::PermissionDenied { .. } | Self::AttachFailed { .. }
        )
    }
}

/// Result type for shared memory operations
pub type ShmResult<T> = Result<T, ShmError>;
