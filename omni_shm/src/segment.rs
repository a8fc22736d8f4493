//! Shared segment handle: raw byte-range access to an attached segment.
//!
//! The handle knows nothing about the layout it carries. It attaches to an
//! existing object, checks its size, and copies bytes in and out at offsets.
//! There is no lock, header, or sequence counter: a read that overlaps a
//! concurrent producer write may observe a mix of old and new bytes (a torn
//! read). That is accepted at this layer; see [`crate::manager`].

use crate::error::{ShmError, ShmResult};
use crate::platform::{self, Mapping};
use omni::shm::SegmentId;
use std::sync::atomic::{Ordering, fence};
use tracing::{debug, info, warn};

/// Outcome of attaching a [`SegmentHandle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachStatus {
    /// Attached and size-checked.
    Attached,
    /// Attach failed at open time; the handle never became usable.
    Failed(ShmError),
    /// Explicitly closed after a successful attach.
    Closed,
}

impl AttachStatus {
    /// The attach error, if opening failed.
    pub fn error(&self) -> Option<&ShmError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Attachment to one shared memory segment.
///
/// Closed handles (failed attach or after [`close`](Self::close)) reject
/// every access with [`ShmError::NotOpen`] and never touch memory.
pub struct SegmentHandle {
    id: SegmentId,
    size: usize,
    mapping: Option<Mapping>,
    status: AttachStatus,
}

impl SegmentHandle {
    /// Attach to an existing segment whose size must be `expected_size`.
    ///
    /// # Errors
    /// - `ShmError::NotFound` / `PermissionDenied` / `AttachFailed` if the
    ///   object cannot be attached.
    /// - `ShmError::SizeMismatch` if the object has a different size.
    pub fn attach(id: SegmentId, expected_size: usize) -> ShmResult<Self> {
        let mapping = platform::attach(&id, expected_size)?;
        info!(
            segment = %id,
            size = mapping.len(),
            pid = platform::current_pid(),
            "Attached shared memory segment"
        );

        Ok(Self {
            id,
            size: expected_size,
            mapping: Some(mapping),
            status: AttachStatus::Attached,
        })
    }

    /// Attach, or return a closed handle carrying the failure.
    ///
    /// The failure is logged once here and is available from
    /// [`status`](Self::status); later operations only report `NotOpen`.
    pub fn open(id: SegmentId, expected_size: usize) -> Self {
        match Self::attach(id.clone(), expected_size) {
            Ok(handle) => handle,
            Err(err) => {
                warn!(segment = %id, "Shared memory segment not opened: {err}");
                Self {
                    id,
                    size: expected_size,
                    mapping: None,
                    status: AttachStatus::Failed(err),
                }
            }
        }
    }

    /// Whether the handle is attached.
    pub fn is_open(&self) -> bool {
        self.mapping.is_some()
    }

    /// Attach outcome.
    pub fn status(&self) -> &AttachStatus {
        &self.status
    }

    /// Segment identifier.
    pub fn id(&self) -> &SegmentId {
        &self.id
    }

    /// Expected (and, when attached, actual) segment size.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Copy `bytes` into the segment starting at `offset`.
    pub fn write_at(&mut self, offset: usize, bytes: &[u8]) -> ShmResult<()> {
        let size = self.size;
        let mapping = self.mapping.as_mut().ok_or(ShmError::NotOpen)?;
        check_range(offset, bytes.len(), size)?;

        // SAFETY: Range checked above against the attached size; the source
        // is a caller-owned slice and cannot alias the mapping.
        unsafe {
            std::ptr::copy_nonoverlapping(
                bytes.as_ptr(),
                mapping.as_mut_ptr().add(offset),
                bytes.len(),
            );
        }

        // Publish before any subsequent read in this cycle.
        fence(Ordering::Release);
        Ok(())
    }

    /// Copy `buf.len()` bytes starting at `offset` into `buf`.
    pub fn read_into(&self, offset: usize, buf: &mut [u8]) -> ShmResult<()> {
        let mapping = self.mapping.as_ref().ok_or(ShmError::NotOpen)?;
        check_range(offset, buf.len(), self.size)?;

        fence(Ordering::Acquire);

        // SAFETY: Range checked above; `buf` is caller-owned and cannot alias
        // the mapping. The producer may be writing concurrently, which can
        // tear the copy but never make it out of bounds.
        unsafe {
            std::ptr::copy_nonoverlapping(
                mapping.as_ptr().add(offset),
                buf.as_mut_ptr(),
                buf.len(),
            );
        }
        Ok(())
    }

    /// Return a copy of `len` bytes starting at `offset`.
    pub fn read_at(&self, offset: usize, len: usize) -> ShmResult<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_into(offset, &mut buf)?;
        Ok(buf)
    }

    /// Detach from the segment. Closing a closed handle is a no-op.
    pub fn close(&mut self) {
        if let Some(mapping) = self.mapping.take() {
            drop(mapping);
            self.status = AttachStatus::Closed;
            debug!(segment = %self.id, "Detached shared memory segment");
        }
    }
}

impl Drop for SegmentHandle {
    fn drop(&mut self) {
        self.close();
    }
}

fn check_range(offset: usize, len: usize, size: usize) -> ShmResult<()> {
    match offset.checked_add(len) {
        Some(end) if end <= size => Ok(()),
        _ => Err(ShmError::OutOfBounds { offset, len, size }),
    }
}
