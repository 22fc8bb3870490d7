//! # Deferred Commands
//!
//! Structural world mutations requested while the world is iterating its
//! stores.
//!
//! A tick hook holds a mutable borrow of one record inside one store, so it
//! cannot touch the world directly. Instead it records [`Command`]s through
//! [`TickContext::commands`]. The world applies them, in record order, after
//! every store has finished its walk for the frame.
//!
//! Entities spawned this way land in the secondary buffer and are merged into
//! the primary buffer at the next frame boundary, so they are never part of
//! the frame that created them.

use super::component::ComponentId;
use super::entity::{EntityId, IdGenerator};
use super::kind::ComponentKind;

/// A deferred world mutation.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Registers a new, empty entity in the secondary buffer.
    Spawn {
        /// Id reserved for the entity when the command was recorded.
        entity: EntityId,
        /// Display name.
        name: String,
    },

    /// Removes every component of the entity, then the entity itself.
    Despawn {
        /// Entity to remove.
        entity: EntityId,
    },

    /// Adds a default-constructed component of the variant.
    AddComponent {
        /// Target entity.
        entity: EntityId,
        /// Variant to add.
        kind: ComponentKind,
    },

    /// Removes one specific component.
    RemoveComponent {
        /// Owning entity.
        entity: EntityId,
        /// Component to remove.
        component: ComponentId,
    },

    /// Activates or deactivates an entity.
    SetActive {
        /// Target entity.
        entity: EntityId,
        /// New active flag.
        active: bool,
    },

    /// Moves an entity under a new parent, or to the root when `None`.
    SetParent {
        /// Entity to move.
        entity: EntityId,
        /// New parent.
        parent: Option<EntityId>,
    },
}

/// Recorder for deferred commands.
pub struct Commands<'a> {
    ids: &'a mut IdGenerator,
    queue: &'a mut Vec<Command>,
}

impl<'a> Commands<'a> {
    pub(crate) fn new(ids: &'a mut IdGenerator, queue: &'a mut Vec<Command>) -> Self {
        Self { ids, queue }
    }

    /// Queues a new entity and returns its id.
    ///
    /// The id is reserved immediately so that follow-up commands in the same
    /// frame can target the entity.
    pub fn spawn(&mut self, name: impl Into<String>) -> EntityId {
        let entity = self.ids.next_entity();
        self.queue.push(Command::Spawn {
            entity,
            name: name.into(),
        });
        entity
    }

    /// Queues removal of an entity and all of its components.
    pub fn despawn(&mut self, entity: EntityId) {
        self.queue.push(Command::Despawn { entity });
    }

    /// Queues a default-constructed component of `kind` for `entity`.
    pub fn add_component(&mut self, entity: EntityId, kind: ComponentKind) {
        self.queue.push(Command::AddComponent { entity, kind });
    }

    /// Queues removal of one specific component.
    pub fn remove_component_by_id(&mut self, entity: EntityId, component: ComponentId) {
        self.queue.push(Command::RemoveComponent { entity, component });
    }

    /// Queues an active flag change.
    pub fn set_active(&mut self, entity: EntityId, active: bool) {
        self.queue.push(Command::SetActive { entity, active });
    }

    /// Queues a re-parent.
    pub fn set_parent(&mut self, entity: EntityId, parent: Option<EntityId>) {
        self.queue.push(Command::SetParent { entity, parent });
    }

    /// Returns the number of queued commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns true if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Per-frame context handed to `on_start` and `on_tick`.
pub struct TickContext<'a> {
    delta_time: f32,
    frame: u64,
    running: bool,
    stopping: bool,
    entity: EntityId,
    component: ComponentId,
    commands: Commands<'a>,
}

impl<'a> TickContext<'a> {
    pub(crate) fn new(
        delta_time: f32,
        frame: u64,
        running: bool,
        stopping: bool,
        commands: Commands<'a>,
    ) -> Self {
        Self {
            delta_time,
            frame,
            running,
            stopping,
            entity: EntityId::NULL,
            component: ComponentId::NULL,
            commands,
        }
    }

    #[inline]
    pub(crate) fn bind(&mut self, entity: EntityId, component: ComponentId) {
        self.entity = entity;
        self.component = component;
    }

    /// Seconds since the previous frame.
    #[inline]
    #[must_use]
    pub const fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Frame number, starting at 1 for the first tick.
    #[inline]
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Whether the simulation is running (started and not stopped).
    #[inline]
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Whether this frame delivers `on_stop`.
    #[inline]
    #[must_use]
    pub const fn is_stopping(&self) -> bool {
        self.stopping
    }

    /// Entity owning the component currently being ticked.
    #[inline]
    #[must_use]
    pub const fn entity(&self) -> EntityId {
        self.entity
    }

    /// Component currently being ticked.
    #[inline]
    #[must_use]
    pub const fn component(&self) -> ComponentId {
        self.component
    }

    /// Deferred command recorder.
    #[inline]
    pub fn commands(&mut self) -> &mut Commands<'a> {
        &mut self.commands
    }
}
