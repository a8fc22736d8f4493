//! Rotation matrix to roll/pitch/yaw (X-Y-Z convention).
//!
//! `R = Rx(roll) · Ry(pitch) · Rz(yaw)`, so `R[0][2] = sin(pitch)`. When
//! `|R[0][2]| >= 1` the pitch is ±90° and roll and yaw collapse into one
//! degree of freedom; yaw is then fixed to 0 and the whole rotation about
//! the collapsed axis is reported as roll. All angles are radians.

use omni::shm::layout::OmniState;
use std::f64::consts::FRAC_PI_2;
use thiserror::Error;

/// Errors raised by the orientation utility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OrientationError {
    /// Input is not a 3×3 matrix.
    #[error("rotation matrix must be 3x3, got {rows}x{cols}")]
    InvalidShape {
        /// Number of rows supplied.
        rows: usize,
        /// Column count of the first row that is not 3 long (or of row 0).
        cols: usize,
    },
}

/// Roll/pitch/yaw triple in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EulerAngles {
    /// Rotation about X.
    pub roll: f64,
    /// Rotation about Y.
    pub pitch: f64,
    /// Rotation about Z.
    pub yaw: f64,
}

impl EulerAngles {
    /// Create a triple from radians.
    pub const fn new(roll: f64, pitch: f64, yaw: f64) -> Self {
        Self { roll, pitch, yaw }
    }

    /// The same triple in degrees.
    pub fn to_degrees(self) -> Self {
        Self {
            roll: self.roll.to_degrees(),
            pitch: self.pitch.to_degrees(),
            yaw: self.yaw.to_degrees(),
        }
    }
}

/// Decompose a rotation matrix into X-Y-Z Euler angles.
pub fn euler_from_rotation(r: &[[f64; 3]; 3]) -> EulerAngles {
    if r[0][2].abs() < 1.0 {
        EulerAngles {
            roll: (-r[1][2]).atan2(r[2][2]),
            pitch: r[0][2].asin(),
            yaw: (-r[0][1]).atan2(r[0][0]),
        }
    } else {
        // Gimbal lock.
        EulerAngles {
            roll: r[1][0].atan2(r[1][1]),
            pitch: FRAC_PI_2 * r[0][2].signum(),
            yaw: 0.0,
        }
    }
}

/// Decompose a dynamically shaped matrix given as rows.
///
/// # Errors
/// `OrientationError::InvalidShape` unless there are exactly 3 rows of
/// exactly 3 elements. Nothing is computed for invalid input.
pub fn euler_from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<EulerAngles, OrientationError> {
    let mut r = [[0.0; 3]; 3];
    if rows.len() != 3 {
        return Err(OrientationError::InvalidShape {
            rows: rows.len(),
            cols: rows.first().map_or(0, |row| row.as_ref().len()),
        });
    }
    for (dst, src) in r.iter_mut().zip(rows) {
        let src = src.as_ref();
        if src.len() != 3 {
            return Err(OrientationError::InvalidShape {
                rows: rows.len(),
                cols: src.len(),
            });
        }
        dst.copy_from_slice(src);
    }
    Ok(euler_from_rotation(&r))
}

/// Compose `Rx(roll) · Ry(pitch) · Rz(yaw)`.
pub fn rotation_from_euler(angles: EulerAngles) -> [[f64; 3]; 3] {
    let (sr, cr) = angles.roll.sin_cos();
    let (sp, cp) = angles.pitch.sin_cos();
    let (sy, cy) = angles.yaw.sin_cos();

    [
        [cp * cy, -cp * sy, sp],
        [cr * sy + sr * sp * cy, cr * cy - sr * sp * sy, -sr * cp],
        [sr * sy - cr * sp * cy, sr * cy + cr * sp * sy, cr * cp],
    ]
}

/// Orientation of a device state.
pub trait OrientationExt {
    /// Roll/pitch/yaw of the device transform's rotation block.
    fn orientation(&self) -> EulerAngles;
}

impl OrientationExt for OmniState {
    fn orientation(&self) -> EulerAngles {
        euler_from_rotation(&self.rotation())
    }
}
