//! Camera.

use bytemuck::{Pod, Zeroable};

/// Projection tag stored in [`Camera::projection`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Projection {
    /// Perspective projection.
    Perspective = 0,
    /// Orthographic projection.
    Orthographic = 1,
}

/// View into the world.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Camera {
    /// Horizontal field of view in degrees.
    pub fov_horizontal_deg: f32,
    /// Near clip plane distance.
    pub near_plane: f32,
    /// Far clip plane distance.
    pub far_plane: f32,
    /// A [`Projection`] tag.
    pub projection: u32,
    /// Clear color, linear RGBA.
    pub clear_color: [f32; 4],
}

impl Camera {
    /// Sets the projection.
    pub fn set_projection(&mut self, projection: Projection) {
        self.projection = projection as u32;
    }

    /// Whether the camera uses an orthographic projection.
    #[must_use]
    pub const fn is_orthographic(&self) -> bool {
        self.projection == Projection::Orthographic as u32
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            fov_horizontal_deg: 90.0,
            near_plane: 0.3,
            far_plane: 1000.0,
            projection: Projection::Perspective as u32,
            clear_color: [0.396, 0.611, 0.937, 1.0],
        }
    }
}

pod_component!(Camera => Camera);
