//! Segment image layout shared with the Omni device process.
//!
//! The segment is a single fixed-size region with no header, framing or
//! length prefix:
//!
//! ```text
//! 0                     WRITE_SIZE                              TOTAL_SIZE
//! ├──── write block ────┼────────────── read block ───────────────┤
//! │ Feedback            │ OmniState │ JointState │ ButtonEvent      │
//! │ (client → device)   │ (device → client)                       │
//! ```
//!
//! All structs are `#[repr(C)]` with natural alignment, matching the
//! producer's compiled layout byte for byte. Field order is part of the wire
//! contract. Every byte is covered by a named field (padding is explicit), so
//! each struct is plain old data: any bit pattern is a valid value and the
//! byte codec in [`super::codec`] never observes uninitialized memory.
//!
//! The ordered field descriptors (`*_FIELDS`) are the single place the
//! layout is spelled out as data; `tests/layout_tests.rs` checks them
//! against the compiled structs.

use bitflags::bitflags;
use core::mem::{offset_of, size_of};
use core::ops::Range;
use static_assertions::const_assert_eq;

use super::codec::ShmRecord;

// ─── Vector3d ───────────────────────────────────────────────────────

/// Three-component double vector (`shmVector3Dd_t`).
///
/// Size: 24 bytes (3×f64).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[repr(C)]
pub struct Vector3d {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vector3d {
    /// All-zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Create a vector from its components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Components as an array in x, y, z order.
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f64; 3]> for Vector3d {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

const_assert_eq!(size_of::<Vector3d>(), 24);

// ─── Read side (device → client) ────────────────────────────────────

bitflags! {
    /// Stylus buttons currently pressed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Buttons: u8 {
        /// Grey (front) button, device button 1.
        const GREY = 1 << 0;
        /// White (rear) button, device button 2.
        const WHITE = 1 << 1;
    }
}

impl Buttons {
    fn from_states(grey: i32, white: i32) -> Self {
        let mut buttons = Self::empty();
        buttons.set(Self::GREY, grey != 0);
        buttons.set(Self::WHITE, white != 0);
        buttons
    }
}

/// Raw device state as kept by the device servo loop (`SHMOmniState_t`).
///
/// Entirely producer-written. Velocity is a filtered second-order backward
/// difference of position; the `inp_vel*` / `out_vel*` / `pos_hist*` fields
/// are the filter history and are exposed only because they are part of the
/// wire image.
///
/// Size: 512 bytes (13×24 + 7×f32 + 4×i32 + u8 + 3 pad + 24 + 16×f64).
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct OmniState {
    /// Stylus tip position [mm].
    pub position: Vector3d,
    /// Filtered stylus velocity.
    pub velocity: Vector3d,
    /// Velocity filter input history (n-1).
    pub inp_vel1: Vector3d,
    /// Velocity filter input history (n-2).
    pub inp_vel2: Vector3d,
    /// Velocity filter input history (n-3).
    pub inp_vel3: Vector3d,
    /// Velocity filter output history (n-1).
    pub out_vel1: Vector3d,
    /// Velocity filter output history (n-2).
    pub out_vel2: Vector3d,
    /// Velocity filter output history (n-3).
    pub out_vel3: Vector3d,
    /// Position history (n-1) for the backward difference.
    pub pos_hist1: Vector3d,
    /// Position history (n-2) for the backward difference.
    pub pos_hist2: Vector3d,
    /// Gimbal angles [rad].
    pub rot: Vector3d,
    /// Base joint angles [rad].
    pub joints: Vector3d,
    /// Force currently commanded to the device [N].
    pub force: Vector3d,
    /// Raw joint angles: `[0, j0, j1, j2 - j1, gimbal0, gimbal1, gimbal2]`.
    pub thetas: [f32; 7],
    /// Current button states (`[grey, white]`, 0 or 1).
    pub buttons: [i32; 2],
    /// Button states at the previous published change.
    pub buttons_prev: [i32; 2],
    /// Position lock engaged (C++ `bool`: 0 or 1).
    pub lock: u8,
    /// Explicit padding matching the natural alignment of `lock_pos`.
    pub _pad: [u8; 3],
    /// Position the stylus is locked to while `lock` is engaged.
    pub lock_pos: Vector3d,
    /// Device transform, 4×4 homogeneous matrix in column-major order.
    pub transform: [f64; 16],
}

const_assert_eq!(size_of::<OmniState>(), 512);
const_assert_eq!(offset_of!(OmniState, lock_pos), 360);

impl OmniState {
    /// Whether the position lock is engaged.
    pub fn is_locked(&self) -> bool {
        self.lock != 0
    }

    /// Currently pressed buttons.
    pub fn pressed(&self) -> Buttons {
        Buttons::from_states(self.buttons[0], self.buttons[1])
    }

    /// Device transform as a row-major `[row][col]` matrix.
    pub fn transform_matrix(&self) -> [[f64; 4]; 4] {
        let mut m = [[0.0; 4]; 4];
        for (row, out) in m.iter_mut().enumerate() {
            for (col, value) in out.iter_mut().enumerate() {
                *value = self.transform[col * 4 + row];
            }
        }
        m
    }

    /// Upper-left 3×3 rotation block of the device transform.
    pub fn rotation(&self) -> [[f64; 3]; 3] {
        let t = self.transform_matrix();
        [
            [t[0][0], t[0][1], t[0][2]],
            [t[1][0], t[1][1], t[1][2]],
            [t[2][0], t[2][1], t[2][2]],
        ]
    }

    /// Translation column of the device transform.
    pub fn translation(&self) -> Vector3d {
        Vector3d::new(self.transform[12], self.transform[13], self.transform[14])
    }
}

/// Joint state published by the device process (`SHMJointState_t`).
///
/// Size: 56 bytes (u64 + 6×f64).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[repr(C)]
pub struct JointState {
    /// Publication time [ms since Unix epoch].
    pub stamp: u64,
    /// Waist angle [rad].
    pub waist: f64,
    /// Shoulder angle [rad].
    pub shoulder: f64,
    /// Elbow angle [rad].
    pub elbow: f64,
    /// First wrist angle [rad].
    pub wrist1: f64,
    /// Second wrist angle [rad].
    pub wrist2: f64,
    /// Third wrist angle [rad].
    pub wrist3: f64,
}

const_assert_eq!(size_of::<JointState>(), 56);

impl JointState {
    /// Joint angles in waist, shoulder, elbow, wrist1, wrist2, wrist3 order.
    pub fn angles(&self) -> [f64; 6] {
        [
            self.waist,
            self.shoulder,
            self.elbow,
            self.wrist1,
            self.wrist2,
            self.wrist3,
        ]
    }
}

/// Last button change published by the device (`SHMPhantomButtonEvent_t`).
///
/// Size: 8 bytes (2×i32).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(C)]
pub struct ButtonEvent {
    /// Grey button state (0 = released, 1 = pressed).
    pub grey_button: i32,
    /// White button state (0 = released, 1 = pressed).
    pub white_button: i32,
}

const_assert_eq!(size_of::<ButtonEvent>(), 8);

impl ButtonEvent {
    /// Whether the grey button is pressed.
    pub fn grey_pressed(&self) -> bool {
        self.grey_button != 0
    }

    /// Whether the white button is pressed.
    pub fn white_pressed(&self) -> bool {
        self.white_button != 0
    }

    /// Pressed buttons as a flag set.
    pub fn pressed(&self) -> Buttons {
        Buttons::from_states(self.grey_button, self.white_button)
    }
}

/// Read block of the segment (`SHMMessageRead_t`). Read-only for clients.
///
/// Size: 576 bytes.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct ReadMessage {
    /// Raw device state.
    pub omnistate: OmniState,
    /// Published joint state.
    pub jointstate: JointState,
    /// Last button event.
    pub buttonevent: ButtonEvent,
}

const_assert_eq!(size_of::<ReadMessage>(), 576);

// ─── Write side (client → device) ───────────────────────────────────

/// Feedback command written by clients (`OmniFeedback_t`).
///
/// The device applies `force` (minus its own velocity damping) on every
/// servo tick. `position` is the lock target and is reserved for callers
/// that engage the position lock.
///
/// Size: 48 bytes (2×Vector3d).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[repr(C)]
pub struct Feedback {
    /// Force command [N].
    pub force: Vector3d,
    /// Position command / lock target.
    pub position: Vector3d,
}

const_assert_eq!(size_of::<Feedback>(), 48);

impl Feedback {
    /// Feedback carrying only a force command.
    pub const fn with_force(force: Vector3d) -> Self {
        Self {
            force,
            position: Vector3d::ZERO,
        }
    }
}

// ─── Default via zeroed() ───────────────────────────────────────────

macro_rules! impl_default_zeroed {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Default for $ty {
                fn default() -> Self {
                    <$ty as ShmRecord>::zeroed()
                }
            }
        )*
    };
}

impl_default_zeroed!(OmniState, ReadMessage);

// SAFETY: Every type below is `#[repr(C)]`, `Copy`, built only from numeric
// primitives and arrays of them, and has no implicit padding (explicit
// `_pad` fields and the size assertions above cover every byte). All bit
// patterns are valid values.
unsafe impl ShmRecord for Vector3d {}
unsafe impl ShmRecord for OmniState {}
unsafe impl ShmRecord for JointState {}
unsafe impl ShmRecord for ButtonEvent {}
unsafe impl ShmRecord for ReadMessage {}
unsafe impl ShmRecord for Feedback {}

// ─── Layout descriptor ──────────────────────────────────────────────

/// One field of a wire struct: name, byte offset and byte size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name as declared.
    pub name: &'static str,
    /// Byte offset from the start of the enclosing struct.
    pub offset: usize,
    /// Field size in bytes.
    pub size: usize,
}

impl FieldSpec {
    /// Byte range occupied by the field.
    pub const fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.size
    }
}

macro_rules! field {
    ($owner:ty, $name:ident, $ty:ty) => {
        FieldSpec {
            name: stringify!($name),
            offset: offset_of!($owner, $name),
            size: size_of::<$ty>(),
        }
    };
}

/// Ordered fields of [`Vector3d`].
pub const VECTOR3D_FIELDS: &[FieldSpec] = &[
    field!(Vector3d, x, f64),
    field!(Vector3d, y, f64),
    field!(Vector3d, z, f64),
];

/// Ordered fields of [`OmniState`].
pub const OMNI_STATE_FIELDS: &[FieldSpec] = &[
    field!(OmniState, position, Vector3d),
    field!(OmniState, velocity, Vector3d),
    field!(OmniState, inp_vel1, Vector3d),
    field!(OmniState, inp_vel2, Vector3d),
    field!(OmniState, inp_vel3, Vector3d),
    field!(OmniState, out_vel1, Vector3d),
    field!(OmniState, out_vel2, Vector3d),
    field!(OmniState, out_vel3, Vector3d),
    field!(OmniState, pos_hist1, Vector3d),
    field!(OmniState, pos_hist2, Vector3d),
    field!(OmniState, rot, Vector3d),
    field!(OmniState, joints, Vector3d),
    field!(OmniState, force, Vector3d),
    field!(OmniState, thetas, [f32; 7]),
    field!(OmniState, buttons, [i32; 2]),
    field!(OmniState, buttons_prev, [i32; 2]),
    field!(OmniState, lock, u8),
    field!(OmniState, _pad, [u8; 3]),
    field!(OmniState, lock_pos, Vector3d),
    field!(OmniState, transform, [f64; 16]),
];

/// Ordered fields of [`JointState`].
pub const JOINT_STATE_FIELDS: &[FieldSpec] = &[
    field!(JointState, stamp, u64),
    field!(JointState, waist, f64),
    field!(JointState, shoulder, f64),
    field!(JointState, elbow, f64),
    field!(JointState, wrist1, f64),
    field!(JointState, wrist2, f64),
    field!(JointState, wrist3, f64),
];

/// Ordered fields of [`ButtonEvent`].
pub const BUTTON_EVENT_FIELDS: &[FieldSpec] = &[
    field!(ButtonEvent, grey_button, i32),
    field!(ButtonEvent, white_button, i32),
];

/// Ordered fields of [`ReadMessage`].
pub const READ_MESSAGE_FIELDS: &[FieldSpec] = &[
    field!(ReadMessage, omnistate, OmniState),
    field!(ReadMessage, jointstate, JointState),
    field!(ReadMessage, buttonevent, ButtonEvent),
];

/// Ordered fields of [`Feedback`].
pub const FEEDBACK_FIELDS: &[FieldSpec] = &[
    field!(Feedback, force, Vector3d),
    field!(Feedback, position, Vector3d),
];

/// Offsets of the two blocks inside the segment image.
///
/// The read block starts right after the write block; its offset is derived
/// from `size_of::<Feedback>()` and follows any change to the write struct.
pub struct SegmentLayout;

impl SegmentLayout {
    /// Start of the write block.
    pub const WRITE_OFFSET: usize = 0;
    /// Size of the write block.
    pub const WRITE_SIZE: usize = size_of::<Feedback>();
    /// Start of the read block.
    pub const READ_OFFSET: usize = Self::WRITE_OFFSET + Self::WRITE_SIZE;
    /// Size of the read block.
    pub const READ_SIZE: usize = size_of::<ReadMessage>();
    /// Exact size of the whole segment.
    pub const TOTAL_SIZE: usize = Self::READ_OFFSET + Self::READ_SIZE;

    /// Byte range of the write block.
    pub const fn write_range() -> Range<usize> {
        Self::WRITE_OFFSET..Self::WRITE_OFFSET + Self::WRITE_SIZE
    }

    /// Byte range of the read block.
    pub const fn read_range() -> Range<usize> {
        Self::READ_OFFSET..Self::READ_OFFSET + Self::READ_SIZE
    }
}

const_assert_eq!(SegmentLayout::TOTAL_SIZE, 624);
