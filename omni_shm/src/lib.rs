//! # Omni Shared Memory Client
//!
//! Client side of the Phantom Omni shared-memory protocol. The device
//! process creates one fixed-size segment and keeps writing telemetry into
//! its read block; clients attach, push force commands into the write block
//! and copy the telemetry out on every poll.
//!
//! ## Segment Layout
//!
//! ```text
//! offset 0                48                                         624
//! ┌───────────────────────┬───────────────────────────────────────────┐
//! │ Feedback (client)     │ ReadMessage (device)                      │
//! │ force, position       │ OmniState | JointState | ButtonEvent      │
//! └───────────────────────┴───────────────────────────────────────────┘
//! ```
//!
//! ## Components
//!
//! - [`segment::SegmentHandle`] - attach, size check, bounded byte copies
//! - [`manager::MessageManager`] - write-then-read update cycle with typed mirrors
//! - [`orientation`] - rotation matrix to roll/pitch/yaw
//!
//! ## Usage
//!
//! ```rust,no_run
//! use omni_shm::{MessageManager, SegmentId, UpdateStatus, Vector3d};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut manager = MessageManager::attach(SegmentId::default())?;
//! manager.set_force(Vector3d::new(0.0, 0.0, 0.5));
//!
//! if manager.update()? == UpdateStatus::Synced {
//!     let joints = manager.state().jointstate;
//!     println!("waist = {:.3}", joints.waist);
//! }
//! manager.shutdown()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! ```rust,no_run
//! use omni_shm::{SegmentHandle, SegmentId, SegmentLayout, ShmError};
//!
//! match SegmentHandle::attach(SegmentId::default(), SegmentLayout::TOTAL_SIZE) {
//!     Ok(_handle) => { /* use handle */ }
//!     Err(ShmError::NotFound { segment }) => {
//!         eprintln!("Segment '{}' not found - check the device process", segment);
//!     }
//!     Err(e) => eprintln!("Unexpected error: {}", e),
//! }
//! ```
//!
//! ## Consistency
//!
//! There is no lock or version counter in the segment. A copy that races a
//! device write can be torn; see [`manager`] for the full rules.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod manager;
pub mod orientation;
pub mod platform;
pub mod segment;

pub use error::{ShmError, ShmResult};
pub use manager::{MessageManager, UpdateStatus};
pub use omni::shm::SegmentId;
pub use omni::shm::layout::{Feedback, ReadMessage, SegmentLayout, Vector3d};
pub use orientation::{
    EulerAngles, OrientationError, OrientationExt, euler_from_rotation, euler_from_rows,
    rotation_from_euler,
};
pub use segment::{AttachStatus, SegmentHandle};

/// Initialize tracing from `RUST_LOG`.
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
