//! Byte codec for the plain-old-data segment structs.
//!
//! The segment carries host-endian, naturally aligned `#[repr(C)]` images,
//! so encoding is a view of the struct's bytes and decoding is a copy of the
//! bytes into an aligned, zero-initialized value. Borrowed byte slices are
//! never reinterpreted in place: shared-memory and buffer slices carry no
//! alignment guarantee for `T`.

use core::mem::size_of;
use thiserror::Error;

/// Errors raised while decoding a struct from bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// The byte slice does not have exactly the size of the target struct.
    #[error("{type_name}: expected {expected} bytes, got {actual}")]
    LengthMismatch {
        /// Target type name.
        type_name: &'static str,
        /// Size of the target type.
        expected: usize,
        /// Length of the provided slice.
        actual: usize,
    },
}

/// Plain-old-data struct that can be copied to and from segment bytes.
///
/// # Safety
///
/// Implementors must be `#[repr(C)]`, contain only numeric primitives or
/// arrays/structs of them, and have no implicit padding bytes. Every bit
/// pattern must be a valid value of the type.
pub unsafe trait ShmRecord: Copy + 'static {
    /// Size of the encoded image in bytes.
    const SIZE: usize = size_of::<Self>();

    /// All-zero value.
    fn zeroed() -> Self {
        // SAFETY: Guaranteed by the trait contract: all-zeros is a valid
        // bit pattern for every field.
        unsafe { core::mem::zeroed() }
    }

    /// Borrow the encoded image.
    fn as_bytes(&self) -> &[u8] {
        // SAFETY: `Self` has no padding, so all `SIZE` bytes are initialized.
        unsafe { core::slice::from_raw_parts(self as *const Self as *const u8, Self::SIZE) }
    }

    /// Decode a value from exactly `SIZE` bytes.
    fn from_bytes(bytes: &[u8]) -> Result<Self, LayoutError> {
        if bytes.len() != Self::SIZE {
            return Err(LayoutError::LengthMismatch {
                type_name: core::any::type_name::<Self>(),
                expected: Self::SIZE,
                actual: bytes.len(),
            });
        }

        let mut value = Self::zeroed();
        // SAFETY: Lengths match, `value` is a properly aligned local, and any
        // bit pattern is a valid `Self` per the trait contract.
        unsafe {
            core::ptr::copy_nonoverlapping(
                bytes.as_ptr(),
                &mut value as *mut Self as *mut u8,
                Self::SIZE,
            );
        }
        Ok(value)
    }

    /// Encode into the front of `out`, which must be exactly `SIZE` bytes.
    fn write_to(&self, out: &mut [u8]) -> Result<(), LayoutError> {
        if out.len() != Self::SIZE {
            return Err(LayoutError::LengthMismatch {
                type_name: core::any::type_name::<Self>(),
                expected: Self::SIZE,
                actual: out.len(),
            });
        }
        out.copy_from_slice(self.as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shm::layout::{ButtonEvent, Feedback, JointState, ReadMessage, Vector3d};
    use proptest::prelude::*;

    #[test]
    fn feedback_bytes_are_host_endian_doubles() {
        let fb = Feedback {
            force: Vector3d::new(1.0, 2.0, 0.5),
            position: Vector3d::new(-1.0, 0.0, 3.25),
        };
        let bytes = fb.as_bytes();
        assert_eq!(bytes.len(), 48);
        assert_eq!(&bytes[16..24], &0.5f64.to_ne_bytes());
        assert_eq!(&bytes[40..48], &3.25f64.to_ne_bytes());
    }

    #[test]
    fn wrong_length_is_rejected() {
        let err = Feedback::from_bytes(&[0u8; 47]).unwrap_err();
        assert_eq!(
            err,
            LayoutError::LengthMismatch {
                type_name: core::any::type_name::<Feedback>(),
                expected: 48,
                actual: 47,
            }
        );

        let mut out = [0u8; 10];
        assert!(ButtonEvent::default().write_to(&mut out).is_err());
    }

    #[test]
    fn decode_from_unaligned_slice() {
        let joints = JointState {
            stamp: 1,
            waist: 0.1,
            shoulder: 0.2,
            elbow: 0.3,
            wrist1: 0.4,
            wrist2: 0.5,
            wrist3: 0.6,
        };
        let mut buf = vec![0u8; JointState::SIZE + 1];
        buf[1..].copy_from_slice(joints.as_bytes());

        let decoded = JointState::from_bytes(&buf[1..]).unwrap();
        assert_eq!(decoded, joints);
    }

    #[test]
    fn read_message_zeroed_bytes() {
        let msg = ReadMessage::zeroed();
        assert!(msg.as_bytes().iter().all(|&b| b == 0));
        assert_eq!(ReadMessage::SIZE, 576);
    }

    fn finite() -> impl Strategy<Value = f64> {
        prop::num::f64::NORMAL | prop::num::f64::SUBNORMAL | prop::num::f64::ZERO
    }

    proptest! {
        #[test]
        fn feedback_roundtrip(
            fx in finite(), fy in finite(), fz in finite(),
            px in finite(), py in finite(), pz in finite(),
        ) {
            let fb = Feedback {
                force: Vector3d::new(fx, fy, fz),
                position: Vector3d::new(px, py, pz),
            };
            let decoded = Feedback::from_bytes(fb.as_bytes()).unwrap();
            prop_assert_eq!(decoded, fb);
            prop_assert_eq!(decoded.as_bytes(), fb.as_bytes());
        }
    }
}
