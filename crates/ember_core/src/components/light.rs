//! Light sources.

use bytemuck::{Pod, Zeroable};

/// Light type tag stored in [`Light::light_type`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum LightType {
    /// Parallel rays, infinite range (sun).
    Directional = 0,
    /// Omnidirectional from a point.
    Point = 1,
    /// Cone from a point.
    Spot = 2,
}

impl LightType {
    /// Resolves a stored tag.
    #[must_use]
    pub const fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            0 => Some(Self::Directional),
            1 => Some(Self::Point),
            2 => Some(Self::Spot),
            _ => None,
        }
    }
}

/// Light parameters.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Light {
    /// A [`LightType`] tag.
    pub light_type: u32,
    /// Linear RGBA color.
    pub color: [f32; 4],
    /// Intensity multiplier.
    pub intensity: f32,
    /// Falloff range for point and spot lights.
    pub range: f32,
    /// Spot cone angle in degrees.
    pub angle_deg: f32,
    /// Shadow depth bias.
    pub bias: f32,
    /// Shadow normal-offset bias.
    pub normal_bias: f32,
    /// Non-zero if the light casts shadows.
    pub cast_shadows: u32,
}

impl Light {
    /// Returns the light type, or `None` for an unknown tag.
    #[must_use]
    pub const fn light_kind(&self) -> Option<LightType> {
        LightType::from_tag(self.light_type)
    }

    /// Sets the light type.
    pub fn set_light_type(&mut self, light_type: LightType) {
        self.light_type = light_type as u32;
    }
}

impl Default for Light {
    fn default() -> Self {
        Self {
            light_type: LightType::Point as u32,
            color: [1.0, 0.76, 0.57, 1.0],
            intensity: 2.0,
            range: 10.0,
            angle_deg: 30.0,
            bias: 0.0001,
            normal_bias: 5.0,
            cast_shadows: 1,
        }
    }
}

pod_component!(Light => Light);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_light_type_tag() {
        let mut light = Light::default();
        assert_eq!(light.light_kind(), Some(LightType::Point));
        light.set_light_type(LightType::Directional);
        assert_eq!(light.light_type, 0);
        light.light_type = 9;
        assert_eq!(light.light_kind(), None);
    }
}
