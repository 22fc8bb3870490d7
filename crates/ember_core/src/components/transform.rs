//! Spatial transform.

use bytemuck::{Pod, Zeroable};

/// Position, rotation (unit quaternion `[x, y, z, w]`) and scale.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Transform {
    /// Position in world units.
    pub position: [f32; 3],
    /// Rotation quaternion, `[x, y, z, w]`.
    pub rotation: [f32; 4],
    /// Per-axis scale.
    pub scale: [f32; 3],
}

impl Transform {
    /// Identity rotation.
    pub const IDENTITY_ROTATION: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

    /// Identity transform at the origin.
    #[inline]
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            position: [0.0; 3],
            rotation: Self::IDENTITY_ROTATION,
            scale: [1.0; 3],
        }
    }

    /// Identity transform moved to `position`.
    #[inline]
    #[must_use]
    pub const fn from_position(position: [f32; 3]) -> Self {
        Self {
            position,
            ..Self::identity()
        }
    }

    /// Sets the rotation from Euler angles in degrees.
    pub fn set_rotation_euler_degrees(&mut self, x: f32, y: f32, z: f32) {
        self.rotation = quaternion_from_euler_degrees(x, y, z);
    }

    /// Moves the transform by `delta`.
    pub fn translate(&mut self, delta: [f32; 3]) {
        for (axis, offset) in self.position.iter_mut().zip(delta) {
            *axis += offset;
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

pod_component!(Transform => Transform);

/// Quaternion `[x, y, z, w]` for pitch `x`, yaw `y` and roll `z` in degrees.
#[must_use]
pub fn quaternion_from_euler_degrees(x: f32, y: f32, z: f32) -> [f32; 4] {
    let (sp, cp) = (x.to_radians() * 0.5).sin_cos();
    let (sy, cy) = (y.to_radians() * 0.5).sin_cos();
    let (sr, cr) = (z.to_radians() * 0.5).sin_cos();

    [
        cy * sp * cr + sy * cp * sr,
        sy * cp * cr - cy * sp * sr,
        cy * cp * sr - sy * sp * cr,
        cy * cp * cr + sy * sp * sr,
    ]
}
