//! Physics payloads: rigid bodies, collision shapes and joints.
//!
//! These hold the authored parameters only; a physics backend reads them.

use bytemuck::{Pod, Zeroable};

/// Dynamic body parameters.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct RigidBody {
    /// Mass in kilograms. Zero makes the body static.
    pub mass: f32,
    /// Sliding friction coefficient.
    pub friction: f32,
    /// Rolling friction coefficient.
    pub friction_rolling: f32,
    /// Bounciness, 0..=1.
    pub restitution: f32,
    /// Non-zero if gravity applies.
    pub use_gravity: u32,
    /// Non-zero if the body is moved by its transform, not by forces.
    pub is_kinematic: u32,
    /// Gravity acceleration for this body.
    pub gravity: [f32; 3],
    /// Per-axis position lock (non-zero locks the axis).
    pub position_lock: [u32; 3],
    /// Per-axis rotation lock (non-zero locks the axis).
    pub rotation_lock: [u32; 3],
}

impl Default for RigidBody {
    fn default() -> Self {
        Self {
            mass: 1.0,
            friction: 0.5,
            friction_rolling: 0.0,
            restitution: 0.0,
            use_gravity: 1,
            is_kinematic: 0,
            gravity: [0.0, -9.81, 0.0],
            position_lock: [0; 3],
            rotation_lock: [0; 3],
        }
    }
}

pod_component!(RigidBody => RigidBody);

/// Collision shape tag stored in [`Collider::shape`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum ColliderShape {
    /// Axis-aligned box.
    Box = 0,
    /// Sphere.
    Sphere = 1,
    /// Flat static plane.
    StaticPlane = 2,
    /// Cylinder.
    Cylinder = 3,
    /// Capsule.
    Capsule = 4,
    /// Cone.
    Cone = 5,
    /// Triangle mesh.
    Mesh = 6,
}

/// Collision shape parameters.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Collider {
    /// A [`ColliderShape`] tag.
    pub shape: u32,
    /// Shape center relative to the transform.
    pub center: [f32; 3],
    /// Shape extents.
    pub size: [f32; 3],
    /// Non-zero to simplify mesh shapes.
    pub optimize: u32,
}

impl Collider {
    /// Sets the shape tag.
    pub fn set_shape(&mut self, shape: ColliderShape) {
        self.shape = shape as u32;
    }
}

impl Default for Collider {
    fn default() -> Self {
        Self {
            shape: ColliderShape::Box as u32,
            center: [0.0; 3],
            size: [1.0; 3],
            optimize: 1,
        }
    }
}

pod_component!(Collider => Collider);

/// Joint type tag stored in [`Constraint::constraint_type`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum ConstraintType {
    /// Ball-and-socket.
    Point = 0,
    /// Single-axis rotation.
    Hinge = 1,
    /// Single-axis translation.
    Slider = 2,
    /// Cone-limited twist.
    ConeTwist = 3,
}

/// Joint between the owning body and another entity's body.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Constraint {
    /// A [`ConstraintType`] tag.
    pub constraint_type: u32,
    /// Pivot position relative to the transform.
    pub position: [f32; 3],
    /// Pivot rotation quaternion.
    pub rotation: [f32; 4],
    /// Upper limits.
    pub high_limit: [f32; 2],
    /// Lower limits.
    pub low_limit: [f32; 2],
    /// Joint error correction factor.
    pub error_reduction: f32,
    /// Constraint force mixing (softness).
    pub constraint_force_mixing: f32,
    /// Raw id of the other entity; zero means none.
    pub body_other: u32,
}

impl Constraint {
    /// Sets the joint type.
    pub fn set_constraint_type(&mut self, constraint_type: ConstraintType) {
        self.constraint_type = constraint_type as u32;
    }
}

impl Default for Constraint {
    fn default() -> Self {
        Self {
            constraint_type: ConstraintType::Point as u32,
            position: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
            high_limit: [0.0; 2],
            low_limit: [0.0; 2],
            error_reduction: 0.0,
            constraint_force_mixing: 0.0,
            body_other: 0,
        }
    }
}

pod_component!(Constraint => Constraint);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layouts_have_no_padding() {
        assert_eq!(std::mem::size_of::<RigidBody>(), 4 * 15);
        assert_eq!(std::mem::size_of::<Collider>(), 4 * 8);
        assert_eq!(std::mem::size_of::<Constraint>(), 4 * 15);
    }

    #[test]
    fn test_shape_tags() {
        let mut collider = Collider::default();
        collider.set_shape(ColliderShape::Capsule);
        assert_eq!(collider.shape, 4);

        let mut constraint = Constraint::default();
        constraint.set_constraint_type(ConstraintType::Hinge);
        assert_eq!(constraint.constraint_type, 1);
    }
}
