//! Environment map.

use crate::ecs::{Component, ComponentKind, EcsError, EcsResult};
use crate::io::{StreamReader, StreamWriter};

/// How the environment texture is laid out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u32)]
pub enum SkyboxType {
    /// Six-face cubemap.
    #[default]
    Cubemap = 0,
    /// Single equirectangular sphere map.
    Sphere = 1,
}

/// Environment cubemap or sphere map.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Skybox {
    /// Asset path of the environment texture.
    pub texture: String,
    /// Texture layout.
    pub skybox_type: SkyboxType,
}

impl Component for Skybox {
    const KIND: ComponentKind = ComponentKind::Skybox;

    fn serialize(&self, stream: &mut StreamWriter) {
        stream.write_str(&self.texture);
        stream.write_u32(self.skybox_type as u32);
    }

    fn deserialize(&mut self, stream: &mut StreamReader<'_>) -> EcsResult<()> {
        self.texture = stream.read_string()?;
        self.skybox_type = match stream.read_u32()? {
            0 => SkyboxType::Cubemap,
            1 => SkyboxType::Sphere,
            other => {
                return Err(EcsError::InvalidFormat(format!(
                    "unknown skybox type {other}"
                )))
            }
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_layout_rejected() {
        let mut stream = StreamWriter::new();
        stream.write_str("sky.hdr");
        stream.write_u32(7);

        let mut skybox = Skybox::default();
        let err = skybox
            .deserialize(&mut StreamReader::new(stream.as_slice()))
            .unwrap_err();
        assert!(matches!(err, EcsError::InvalidFormat(_)));
    }
}
