//! # Component Variants
//!
//! The closed set of component variants the world knows about, and the
//! per-entity capability mask built from them.
//!
//! The declaration order below is the store enumeration order and the tick
//! order. Transform comes first so dependents always see this frame's
//! transform.

use std::fmt;

use super::error::{EcsError, EcsResult};

/// Variant tag distinguishing one kind of component from another.
///
/// The discriminant doubles as the bit index in [`ComponentMask`] and as the
/// tag written to world files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum ComponentKind {
    /// Spatial transform (position, rotation, scale).
    Transform = 0,
    /// Positional audio emitter.
    AudioSource = 1,
    /// Audio receiver, usually on the camera.
    AudioListener = 2,
    /// Physics joint between two bodies.
    Constraint = 3,
    /// Physics collision shape.
    Collider = 4,
    /// Physics rigid body.
    RigidBody = 5,
    /// Light source.
    Light = 6,
    /// Mesh + material reference for the renderer.
    Renderable = 7,
    /// Externally driven script. The only multi-instance variant.
    Script = 8,
    /// Environment cubemap.
    Skybox = 9,
    /// View into the world.
    Camera = 10,
}

impl ComponentKind {
    /// Number of variants.
    pub const COUNT: usize = 11;

    /// Every variant, in declaration (enumeration and tick) order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Transform,
        Self::AudioSource,
        Self::AudioListener,
        Self::Constraint,
        Self::Collider,
        Self::RigidBody,
        Self::Light,
        Self::Renderable,
        Self::Script,
        Self::Skybox,
        Self::Camera,
    ];

    /// Returns the numeric tag used in masks and world files.
    #[inline]
    #[must_use]
    pub const fn tag(self) -> u32 {
        self as u32
    }

    /// Returns the mask bit for this variant.
    #[inline]
    #[must_use]
    pub const fn bit(self) -> u32 {
        1 << self.tag()
    }

    /// Resolves a tag read from a stream.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnknownKind`] if the tag names no variant.
    pub fn from_tag(tag: u32) -> EcsResult<Self> {
        Self::ALL
            .get(tag as usize)
            .copied()
            .ok_or(EcsError::UnknownKind(tag))
    }

    /// Whether an entity may own more than one component of this variant.
    #[inline]
    #[must_use]
    pub const fn is_multi_instance(self) -> bool {
        matches!(self, Self::Script)
    }

    /// Human-readable variant name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Transform => "Transform",
            Self::AudioSource => "AudioSource",
            Self::AudioListener => "AudioListener",
            Self::Constraint => "Constraint",
            Self::Collider => "Collider",
            Self::RigidBody => "RigidBody",
            Self::Light => "Light",
            Self::Renderable => "Renderable",
            Self::Script => "Script",
            Self::Skybox => "Skybox",
            Self::Camera => "Camera",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Capability bitmask: one bit per [`ComponentKind`].
///
/// A bit is set iff the entity owns at least one live component of that
/// variant. Testing a bit is O(1) and never touches a store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ComponentMask(u32);

impl ComponentMask {
    /// Mask with no bits set.
    pub const EMPTY: Self = Self(0);

    /// Returns the raw bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Checks whether the variant's bit is set.
    #[inline]
    #[must_use]
    pub const fn contains(self, kind: ComponentKind) -> bool {
        (self.0 & kind.bit()) != 0
    }

    /// Sets the variant's bit.
    #[inline]
    pub fn insert(&mut self, kind: ComponentKind) {
        self.0 |= kind.bit();
    }

    /// Clears the variant's bit.
    #[inline]
    pub fn remove(&mut self, kind: ComponentKind) {
        self.0 &= !kind.bit();
    }

    /// Returns true if no bits are set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates the set variants in declaration order.
    pub fn kinds(self) -> impl Iterator<Item = ComponentKind> {
        ComponentKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(*kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_match_declaration_order() {
        for (index, kind) in ComponentKind::ALL.iter().enumerate() {
            assert_eq!(kind.tag() as usize, index);
            assert_eq!(ComponentKind::from_tag(kind.tag()).unwrap(), *kind);
        }
        assert!(matches!(
            ComponentKind::from_tag(11),
            Err(EcsError::UnknownKind(11))
        ));
    }

    #[test]
    fn test_only_scripts_are_multi_instance() {
        let multi: Vec<_> = ComponentKind::ALL
            .into_iter()
            .filter(|kind| kind.is_multi_instance())
            .collect();
        assert_eq!(multi, vec![ComponentKind::Script]);
    }

    #[test]
    fn test_mask_insert_remove() {
        let mut mask = ComponentMask::EMPTY;
        assert!(mask.is_empty());

        mask.insert(ComponentKind::Camera);
        mask.insert(ComponentKind::Transform);
        assert!(mask.contains(ComponentKind::Camera));
        assert!(!mask.contains(ComponentKind::Light));
        assert_eq!(
            mask.kinds().collect::<Vec<_>>(),
            vec![ComponentKind::Transform, ComponentKind::Camera]
        );

        mask.remove(ComponentKind::Camera);
        assert!(!mask.contains(ComponentKind::Camera));
        assert_eq!(mask.bits(), 1);
    }
}
