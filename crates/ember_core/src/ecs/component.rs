//! # Component System
//!
//! A component is a typed payload attached to exactly one entity. The store
//! owns every component; everything else refers to it by [`ComponentId`].
//!
//! Payload types implement [`Component`]. The store wraps each payload in a
//! [`Record`] carrying its identity and lifecycle flags, so payload types stay
//! plain data.

use std::any::Any;
use std::fmt;
use std::ops::{Deref, DerefMut};

use super::commands::TickContext;
use super::entity::EntityId;
use super::error::EcsResult;
use super::kind::ComponentKind;
use crate::io::{StreamReader, StreamWriter};

/// Unique identifier for a component.
///
/// Ids are drawn from the same world-wide generator as entity ids and never
/// change over a component's lifetime, even when its slot does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ComponentId(u32);

impl ComponentId {
    /// Null/invalid component id.
    pub const NULL: Self = Self(0);

    /// Wraps a raw id.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Checks if this id is null.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trait for component payloads.
///
/// Every hook has a no-op default except serialization, which each variant
/// must define since the byte layout belongs to the component.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Default)]
/// struct Skybox { texture: String }
///
/// impl Component for Skybox {
///     const KIND: ComponentKind = ComponentKind::Skybox;
///
///     fn serialize(&self, stream: &mut StreamWriter) {
///         stream.write_str(&self.texture);
///     }
///
///     fn deserialize(&mut self, stream: &mut StreamReader<'_>) -> EcsResult<()> {
///         self.texture = stream.read_string()?;
///         Ok(())
///     }
/// }
/// ```
pub trait Component: Default + 'static {
    /// Variant tag. Must match the store the world registers for this type.
    const KIND: ComponentKind;

    /// Called once, right after the component has been inserted into its store.
    fn on_initialize(&mut self) {}

    /// Called once before the first tick while the world is running.
    fn on_start(&mut self, _ctx: &mut TickContext<'_>) {}

    /// Called once when the world stops, for components that were started.
    fn on_stop(&mut self) {}

    /// Called once per frame while the owning entity is active.
    fn on_tick(&mut self, _ctx: &mut TickContext<'_>) {}

    /// Writes the payload to the stream.
    fn serialize(&self, stream: &mut StreamWriter);

    /// Reads the payload back from the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is truncated or malformed.
    fn deserialize(&mut self, stream: &mut StreamReader<'_>) -> EcsResult<()>;
}

/// A component payload as held by its store slot.
pub struct Record<T> {
    id: ComponentId,
    owner: EntityId,
    entity_active: bool,
    started: bool,
    data: T,
}

impl<T: Component> Record<T> {
    /// Creates a record for `owner`. The owner starts out active.
    #[must_use]
    pub fn new(id: ComponentId, owner: EntityId, data: T) -> Self {
        Self {
            id,
            owner,
            entity_active: true,
            started: false,
            data,
        }
    }

    /// Returns the component id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> ComponentId {
        self.id
    }

    /// Returns the owning entity.
    #[inline]
    #[must_use]
    pub const fn owner(&self) -> EntityId {
        self.owner
    }

    /// Returns the variant tag.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> ComponentKind {
        T::KIND
    }

    /// Whether the owning entity is active (cached from the entity).
    #[inline]
    #[must_use]
    pub const fn is_entity_active(&self) -> bool {
        self.entity_active
    }

    /// Whether `on_start` has run since the world last started.
    #[inline]
    #[must_use]
    pub const fn is_started(&self) -> bool {
        self.started
    }

    /// Returns the payload.
    #[inline]
    #[must_use]
    pub const fn data(&self) -> &T {
        &self.data
    }

    /// Returns the payload mutably.
    #[inline]
    pub fn data_mut(&mut self) -> &mut T {
        &mut self.data
    }

    /// Consumes the record, returning the payload.
    #[must_use]
    pub fn into_data(self) -> T {
        self.data
    }

    #[inline]
    pub(crate) fn set_entity_active(&mut self, active: bool) {
        self.entity_active = active;
    }

    /// Runs the per-frame hooks for this record.
    ///
    /// Stop is delivered even to inactive owners so that every started
    /// component sees a matching `on_stop`.
    pub(crate) fn run_frame(&mut self, ctx: &mut TickContext<'_>) {
        ctx.bind(self.owner, self.id);

        if ctx.is_stopping() && self.started {
            self.data.on_stop();
            self.started = false;
        }

        if !self.entity_active {
            return;
        }

        if ctx.is_running() && !self.started {
            self.data.on_start(ctx);
            self.started = true;
        }

        self.data.on_tick(ctx);
    }
}

impl<T> Deref for Record<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

impl<T> DerefMut for Record<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.data
    }
}

impl<T: fmt::Debug> fmt::Debug for Record<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("entity_active", &self.entity_active)
            .field("started", &self.started)
            .field("data", &self.data)
            .finish()
    }
}

/// Variant-agnostic view of a stored component.
///
/// This is what cross-cutting code (cloning, saving, editors) sees when it
/// walks every store without knowing the concrete types.
pub trait ErasedComponent {
    /// Returns the component id.
    fn component_id(&self) -> ComponentId;

    /// Returns the owning entity.
    fn owner_id(&self) -> EntityId;

    /// Returns the variant tag.
    fn component_kind(&self) -> ComponentKind;

    /// Writes the payload through the component's serialize hook.
    fn write_payload(&self, stream: &mut StreamWriter);

    /// Reads the payload through the component's deserialize hook.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is truncated or malformed.
    fn read_payload(&mut self, stream: &mut StreamReader<'_>) -> EcsResult<()>;

    /// Returns self as `Any` for downcasting to `Record<T>`.
    fn as_any(&self) -> &dyn Any;
}

impl<T: Component> ErasedComponent for Record<T> {
    fn component_id(&self) -> ComponentId {
        self.id
    }

    fn owner_id(&self) -> EntityId {
        self.owner
    }

    fn component_kind(&self) -> ComponentKind {
        T::KIND
    }

    fn write_payload(&self, stream: &mut StreamWriter) {
        self.data.serialize(stream);
    }

    fn read_payload(&mut self, stream: &mut StreamReader<'_>) -> EcsResult<()> {
        self.data.deserialize(stream)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Camera;

    #[test]
    fn test_record_identity() {
        let record = Record::new(
            ComponentId::from_raw(3),
            EntityId::from_raw(1),
            Camera::default(),
        );
        assert_eq!(record.id(), ComponentId::from_raw(3));
        assert_eq!(record.owner(), EntityId::from_raw(1));
        assert_eq!(record.kind(), ComponentKind::Camera);
        assert!(record.is_entity_active());
        assert!(!record.is_started());
    }

    #[test]
    fn test_erased_payload_copy() {
        let mut source = Record::new(
            ComponentId::from_raw(3),
            EntityId::from_raw(1),
            Camera::default(),
        );
        source.far_plane = 250.0;

        let mut target = Record::new(
            ComponentId::from_raw(4),
            EntityId::from_raw(2),
            Camera::default(),
        );

        let mut stream = StreamWriter::new();
        source.write_payload(&mut stream);
        target
            .read_payload(&mut StreamReader::new(stream.as_slice()))
            .unwrap();

        assert!((target.far_plane - 250.0).abs() < f32::EPSILON);
        assert_eq!(target.component_id(), ComponentId::from_raw(4));
        assert!(target.as_any().downcast_ref::<Record<Camera>>().is_some());
    }
}
