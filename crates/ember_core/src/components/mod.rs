//! # Built-in Components
//!
//! Payload types for the closed set of variants in
//! [`ComponentKind`](crate::ecs::ComponentKind).
//!
//! Plain-data variants are `bytemuck::Pod` and serialize as their raw bytes.
//! Variants carrying strings or behavior serialize field by field.

/// Implements [`Component`](crate::ecs::Component) for a `Pod` payload by
/// copying its bytes to and from the stream.
macro_rules! pod_component {
    ($ty:ty => $kind:ident) => {
        impl $crate::ecs::Component for $ty {
            const KIND: $crate::ecs::ComponentKind = $crate::ecs::ComponentKind::$kind;

            fn serialize(&self, stream: &mut $crate::io::StreamWriter) {
                stream.write_pod(self);
            }

            fn deserialize(
                &mut self,
                stream: &mut $crate::io::StreamReader<'_>,
            ) -> $crate::ecs::EcsResult<()> {
                *self = stream.read_pod()?;
                Ok(())
            }
        }
    };
}

mod audio;
mod camera;
mod light;
mod physics;
mod renderable;
mod script;
mod skybox;
mod transform;

pub use audio::{AudioListener, AudioSource};
pub use camera::{Camera, Projection};
pub use light::{Light, LightType};
pub use physics::{Collider, ColliderShape, Constraint, ConstraintType, RigidBody};
pub use renderable::Renderable;
pub use script::{Script, ScriptBehavior};
pub use skybox::{Skybox, SkyboxType};
pub use transform::{quaternion_from_euler_degrees, Transform};
