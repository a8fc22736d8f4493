//! Message manager: typed update cycle over the shared segment.
//!
//! The manager owns a [`SegmentHandle`] sized for [`SegmentLayout`] and two
//! local mirrors: the pending [`Feedback`] command and the last decoded
//! [`ReadMessage`]. Callers read and write the mirrors freely; the segment is
//! only touched by [`MessageManager::update`], which writes the feedback block
//! and then copies the read block, in that order.
//!
//! # Consistency
//!
//! The producer writes the read block continuously and honors no lock, so a
//! copy may interleave with a producer write and mix values from two device
//! ticks (for example a `Vector3d` whose `x` is newer than its `z`). Such
//! torn reads are accepted; callers poll at a fixed rate and tolerate one
//! inconsistent sample.
//!
//! Several managers may attach to one segment. Their reads are independent,
//! but they all write the same feedback block and the last writer wins.
//! Coordinating multiple force commanders is the caller's job.

use crate::error::{ShmError, ShmResult};
use crate::segment::{AttachStatus, SegmentHandle};
use omni::shm::SegmentId;
use omni::shm::codec::ShmRecord;
use omni::shm::layout::{Feedback, ReadMessage, SegmentLayout, Vector3d};
use tracing::{debug, trace};

/// Result of one [`MessageManager::update`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStatus {
    /// Feedback written and state refreshed from the segment.
    Synced,
    /// Handle is closed; nothing was exchanged and the mirrors are unchanged.
    Detached,
}

/// Typed client for the device segment.
pub struct MessageManager {
    handle: SegmentHandle,
    feedback: Feedback,
    state: ReadMessage,
    read_buf: [u8; SegmentLayout::READ_SIZE],
    cycles: u64,
}

impl MessageManager {
    /// Attach to the device segment.
    ///
    /// # Errors
    /// Any attach error of [`SegmentHandle::attach`], including
    /// `ShmError::SizeMismatch` when the segment is not
    /// [`SegmentLayout::TOTAL_SIZE`] bytes.
    pub fn attach(id: SegmentId) -> ShmResult<Self> {
        SegmentHandle::attach(id, SegmentLayout::TOTAL_SIZE).map(Self::from_handle)
    }

    /// Attach, or build a detached manager if the segment is unavailable.
    ///
    /// A detached manager is fully usable: `update()` reports
    /// [`UpdateStatus::Detached`] and the state mirror stays zeroed.
    pub fn open(id: SegmentId) -> Self {
        Self::from_handle(SegmentHandle::open(id, SegmentLayout::TOTAL_SIZE))
    }

    fn from_handle(handle: SegmentHandle) -> Self {
        Self {
            handle,
            feedback: Feedback::default(),
            state: ReadMessage::default(),
            read_buf: [0; SegmentLayout::READ_SIZE],
            cycles: 0,
        }
    }

    /// Replace the pending feedback. No I/O until the next `update()`.
    pub fn set_feedback(&mut self, feedback: Feedback) {
        self.feedback = feedback;
    }

    /// Replace only the force component of the pending feedback.
    pub fn set_force(&mut self, force: Vector3d) {
        self.feedback.force = force;
    }

    /// Pending feedback, as it will be written by the next `update()`.
    pub fn feedback(&self) -> &Feedback {
        &self.feedback
    }

    /// Last state read from the segment (zeroed before the first sync).
    pub fn state(&self) -> &ReadMessage {
        &self.state
    }

    /// Number of successful update cycles.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Whether the segment is attached.
    pub fn is_open(&self) -> bool {
        self.handle.is_open()
    }

    /// Attach outcome of the underlying handle.
    pub fn status(&self) -> &AttachStatus {
        self.handle.status()
    }

    /// Write the pending feedback, then refresh the state mirror.
    ///
    /// On a closed handle this is a no-op returning
    /// [`UpdateStatus::Detached`]. If the read step fails the state mirror
    /// keeps its previous value.
    pub fn update(&mut self) -> ShmResult<UpdateStatus> {
        if !self.handle.is_open() {
            return Ok(UpdateStatus::Detached);
        }

        match self.exchange() {
            Ok(()) => {}
            Err(ShmError::NotOpen) => return Ok(UpdateStatus::Detached),
            Err(err) => return Err(err),
        }

        self.cycles += 1;
        trace!(
            cycle = self.cycles,
            stamp = self.state.jointstate.stamp,
            force_z = self.feedback.force.z,
            "Update cycle"
        );
        Ok(UpdateStatus::Synced)
    }

    fn exchange(&mut self) -> ShmResult<()> {
        self.handle
            .write_at(SegmentLayout::WRITE_OFFSET, self.feedback.as_bytes())?;
        self.handle
            .read_into(SegmentLayout::READ_OFFSET, &mut self.read_buf)?;
        self.state = ReadMessage::from_bytes(&self.read_buf)?;
        Ok(())
    }

    /// Detach from the segment. The mirrors stay readable.
    pub fn close(&mut self) {
        self.handle.close();
    }

    /// Send a zero force in one final cycle, then detach.
    ///
    /// The handle is closed even if the final cycle fails.
    pub fn shutdown(&mut self) -> ShmResult<()> {
        self.set_force(Vector3d::ZERO);
        let result = self.update();
        self.close();
        debug!(cycles = self.cycles, "Message manager shut down");
        result.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::current_pid;

    fn detached(tag: &str) -> MessageManager {
        MessageManager::open(SegmentId::posix(format!(
            "omni_manager_{tag}_{}",
            current_pid()
        )))
    }

    #[test]
    fn detached_update_is_noop() {
        let mut manager = detached("noop");
        assert!(!manager.is_open());

        manager.set_feedback(Feedback::with_force(Vector3d::new(0.0, 0.0, 0.5)));
        assert_eq!(manager.update(), Ok(UpdateStatus::Detached));
        assert_eq!(manager.update(), Ok(UpdateStatus::Detached));

        assert_eq!(manager.cycles(), 0);
        assert_eq!(*manager.state(), ReadMessage::default());
        assert_eq!(manager.feedback().force.z, 0.5);
    }

    #[test]
    fn set_force_keeps_position() {
        let mut manager = detached("force");
        manager.set_feedback(Feedback {
            force: Vector3d::new(1.0, 1.0, 1.0),
            position: Vector3d::new(0.1, 0.2, 0.3),
        });
        manager.set_force(Vector3d::new(0.0, 0.0, -2.0));

        assert_eq!(manager.feedback().force, Vector3d::new(0.0, 0.0, -2.0));
        assert_eq!(manager.feedback().position, Vector3d::new(0.1, 0.2, 0.3));
    }

    #[test]
    fn shutdown_zeroes_force_when_detached() {
        let mut manager = detached("shutdown");
        manager.set_force(Vector3d::new(3.0, 0.0, 0.0));
        assert_eq!(manager.shutdown(), Ok(()));
        assert_eq!(manager.feedback().force, Vector3d::ZERO);

        manager.close();
        assert!(manager.status().error().is_some());
    }

    #[test]
    fn read_buffer_covers_read_block() {
        let manager = detached("buf");
        assert_eq!(manager.read_buf.len(), ReadMessage::SIZE);
    }
}
