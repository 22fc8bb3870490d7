//! Renderer-facing mesh and material reference.

use crate::ecs::{Component, ComponentKind, EcsResult};
use crate::io::{StreamReader, StreamWriter};

/// Mesh and material handles for the renderer.
///
/// The store only keeps asset paths; resolving them is the renderer's job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Renderable {
    /// Asset path of the mesh.
    pub mesh: String,
    /// Asset path of the material.
    pub material: String,
    /// Whether the mesh casts shadows.
    pub cast_shadows: bool,
    /// Whether the mesh receives shadows.
    pub receive_shadows: bool,
}

impl Default for Renderable {
    fn default() -> Self {
        Self {
            mesh: String::new(),
            material: String::new(),
            cast_shadows: true,
            receive_shadows: true,
        }
    }
}

impl Renderable {
    /// Whether both a mesh and a material are assigned.
    #[must_use]
    pub fn is_drawable(&self) -> bool {
        !self.mesh.is_empty() && !self.material.is_empty()
    }
}

impl Component for Renderable {
    const KIND: ComponentKind = ComponentKind::Renderable;

    fn serialize(&self, stream: &mut StreamWriter) {
        stream.write_str(&self.mesh);
        stream.write_str(&self.material);
        stream.write_bool(self.cast_shadows);
        stream.write_bool(self.receive_shadows);
    }

    fn deserialize(&mut self, stream: &mut StreamReader<'_>) -> EcsResult<()> {
        self.mesh = stream.read_string()?;
        self.material = stream.read_string()?;
        self.cast_shadows = stream.read_bool()?;
        self.receive_shadows = stream.read_bool()?;
        Ok(())
    }
}
