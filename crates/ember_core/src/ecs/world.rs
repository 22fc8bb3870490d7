//! # ECS World
//!
//! The central container for all entities and components.
//!
//! The world owns:
//! - the entity population, split into primary and secondary buffers
//! - the parent/child links between entities (removal cascades downwards)
//! - exactly one store per component variant, built at construction
//! - the id generator shared by entities and components
//! - the event bus that carries resolve notifications
//!
//! # Frame Structure
//!
//! ```text
//! tick(dt)
//!   ├─ merge secondary → primary         (frame boundary)
//!   ├─ for store in declaration order    (Transform first)
//!   │    └─ for record in slot order
//!   │         └─ stop / start / tick hooks, commands queued
//!   └─ apply queued commands             (spawns land in secondary)
//! ```

use tracing::{debug, info, warn};

use super::buffers::EntityBuffers;
use super::commands::{Command, Commands, TickContext};
use super::component::Component;
use super::entity::{Entity, EntityId, EntityMut, EntityRef, IdGenerator};
use super::error::{EcsError, EcsResult};
use super::kind::ComponentKind;
use super::registry::StoreRegistry;
use super::storage::{ErasedStore, Store};
use crate::components::{AudioListener, Camera, Light, LightType, Skybox, Transform};
use crate::config::WorldConfig;
use crate::events::{EventBus, EventReceiver, WorldEvent};

/// Display name given to entities created without one.
pub const DEFAULT_ENTITY_NAME: &str = "Entity";

/// The ECS World - container for all entities and component stores.
///
/// # Example
///
/// ```rust,ignore
/// let mut world = World::new();
///
/// let mut player = world.entity_create_named("Player")?;
/// player.add_component::<Transform>()?.position = [0.0, 1.0, 0.0];
/// let id = player.id();
///
/// world.start();
/// world.tick(1.0 / 60.0);
/// ```
pub struct World {
    pub(super) config: WorldConfig,
    pub(super) registry: StoreRegistry,
    pub(super) entities: EntityBuffers,
    pub(super) ids: IdGenerator,
    pub(super) events: EventBus,
    /// Reused command queue, empty between ticks.
    pending: Vec<Command>,
    frame: u64,
    running: bool,
    stop_pending: bool,
}

impl World {
    /// Creates a world with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::build(WorldConfig::default())
    }

    /// Creates a world from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] if `config` fails validation.
    pub fn from_config(config: WorldConfig) -> EcsResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: WorldConfig) -> Self {
        debug!(
            name = %config.name,
            store_capacity = config.store_capacity,
            "world created"
        );
        Self {
            registry: StoreRegistry::new(config.store_capacity),
            entities: EntityBuffers::with_capacity(config.store_capacity),
            ids: IdGenerator::new(),
            events: EventBus::new(config.event_channel_capacity),
            pending: Vec::new(),
            frame: 0,
            running: false,
            stop_pending: false,
            config,
        }
    }

    /// Returns the configuration the world was built with.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Returns the world's display name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Sets the world's display name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.config.name = name.into();
    }

    /// Populates the world according to its configuration.
    ///
    /// # Errors
    ///
    /// Propagates any error from creating the default entities.
    pub fn initialize(&mut self) -> EcsResult<()> {
        if self.config.create_default_entities {
            self.create_default_entities()?;
        }
        info!(name = %self.config.name, entities = self.entity_count(), "world initialized");
        Ok(())
    }

    /// Creates the default scene: a camera with an audio listener, a skybox
    /// and a directional light.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub fn create_default_entities(&mut self) -> EcsResult<()> {
        let mut camera = self.entity_create_named("Camera")?;
        camera.add_component::<Transform>()?.position = [0.0, 1.0, -5.0];
        camera.add_component::<Camera>()?;
        camera.add_component::<AudioListener>()?;

        let mut skybox = self.entity_create_named("Skybox")?;
        skybox.add_component::<Transform>()?;
        skybox.add_component::<Skybox>()?;

        let mut light = self.entity_create_named("DirectionalLight")?;
        let transform = light.add_component::<Transform>()?;
        transform.set_rotation_euler_degrees(30.0, 30.0, 0.0);
        transform.position = [0.0, 10.0, 0.0];
        let directional = light.add_component::<Light>()?;
        directional.set_light_type(LightType::Directional);
        directional.intensity = 1.5;

        Ok(())
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Creates an empty entity named [`DEFAULT_ENTITY_NAME`] in the primary
    /// buffer.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::DuplicateEntity`] if the id generator was
    /// bypassed and the fresh id is already taken.
    pub fn entity_create(&mut self) -> EcsResult<EntityMut<'_>> {
        self.entity_create_named(DEFAULT_ENTITY_NAME)
    }

    /// Creates an empty, named entity in the primary buffer.
    ///
    /// # Errors
    ///
    /// Same as [`World::entity_create`].
    pub fn entity_create_named(&mut self, name: impl Into<String>) -> EcsResult<EntityMut<'_>> {
        let id = self.ids.next_entity();
        self.register(Entity::new(id, name))
    }

    /// Registers an existing identity in the primary buffer.
    ///
    /// Only the identity is taken over: name, flags and id. Component
    /// bookkeeping and hierarchy links are cleared, since they refer to
    /// another world.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::DuplicateEntity`] if the id is null or taken.
    /// Nothing changes in that case.
    pub fn entity_add(&mut self, mut entity: Entity) -> EcsResult<EntityMut<'_>> {
        let id = entity.id();
        if id.is_null() || self.entities.contains(id) {
            return Err(EcsError::DuplicateEntity(id));
        }

        entity.clear_components();
        entity.clear_links();
        self.ids.reserve(id.raw());
        self.register(entity)
    }

    fn register(&mut self, entity: Entity) -> EcsResult<EntityMut<'_>> {
        let Self {
            registry,
            entities,
            ids,
            events,
            ..
        } = self;

        let entity = entities.push_primary(entity)?;
        debug!(entity = entity.id().raw(), name = entity.name(), "entity created");
        events.resolve();
        Ok(EntityMut::new(entity, registry, ids, events))
    }

    /// Removes the entity and all of its descendants, components included,
    /// and detaches it from its parent.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnknownEntity`] if `id` is not registered.
    pub fn entity_remove(&mut self, id: EntityId) -> EcsResult<()> {
        let parent = self
            .entities
            .get(id)
            .ok_or(EcsError::UnknownEntity(id))?
            .parent();

        let descendants = self.entity_descendants(id);
        let mut removed = 0;
        for &descendant in descendants.iter().rev() {
            removed += self.remove_single(descendant);
        }
        removed += self.remove_single(id);

        if let Some(parent) = parent.and_then(|parent| self.entities.get_mut(parent)) {
            parent.remove_child(id);
        }
        self.events.resolve();

        debug!(
            entity = id.raw(),
            descendants = descendants.len(),
            components = removed,
            "entity removed"
        );
        Ok(())
    }

    /// Drops one entity and its records, returning how many records went.
    fn remove_single(&mut self, id: EntityId) -> usize {
        let Some(mask) = self.entities.get(id).map(Entity::mask) else {
            return 0;
        };

        let mut removed = 0;
        for kind in mask.kinds() {
            if let Some(store) = self.registry.get_mut(kind) {
                removed += store.remove_entity(id);
            }
        }
        self.entities.remove(id);
        removed
    }

    /// Read access to an entity in either buffer.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<EntityRef<'_>> {
        self.entities
            .get(id)
            .map(|entity| EntityRef::new(entity, &self.registry))
    }

    /// Mutable access to an entity in either buffer.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<EntityMut<'_>> {
        let Self {
            registry,
            entities,
            ids,
            events,
            ..
        } = self;

        let entity = entities.get_mut(id)?;
        Some(EntityMut::new(entity, registry, ids, events))
    }

    /// First entity (primary buffer first) with the given name.
    #[must_use]
    pub fn entity_by_name(&self, name: &str) -> Option<EntityRef<'_>> {
        self.entities()
            .find(|entity| entity.name() == name)
    }

    /// Whether `id` is registered in either buffer.
    #[inline]
    #[must_use]
    pub fn entity_exists(&self, id: EntityId) -> bool {
        self.entities.contains(id)
    }

    /// Number of entities in both buffers.
    #[inline]
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Every entity, primary buffer first.
    pub fn entities(&self) -> impl Iterator<Item = EntityRef<'_>> {
        let registry = &self.registry;
        self.entities
            .iter()
            .map(move |entity| EntityRef::new(entity, registry))
    }

    /// Entities ticked this frame.
    #[inline]
    #[must_use]
    pub fn primary(&self) -> &[Entity] {
        self.entities.primary()
    }

    /// Entities created during the last tick, merged at the next one.
    #[inline]
    #[must_use]
    pub fn secondary(&self) -> &[Entity] {
        self.entities.secondary()
    }

    // =========================================================================
    // Hierarchy
    // =========================================================================

    /// Attaches `child` under `parent`, or makes it a root when `parent` is
    /// `None`. The child is appended to the new parent's children.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnknownEntity`] if either entity is missing, or
    /// [`EcsError::HierarchyCycle`] if `parent` is `child` or one of its
    /// descendants. Nothing changes in either case.
    pub fn set_parent(&mut self, child: EntityId, parent: Option<EntityId>) -> EcsResult<()> {
        let old = self
            .entities
            .get(child)
            .ok_or(EcsError::UnknownEntity(child))?
            .parent();

        if let Some(parent) = parent {
            let mut cursor = Some(parent);
            while let Some(current) = cursor {
                if current == child {
                    return Err(EcsError::HierarchyCycle {
                        entity: child,
                        parent,
                    });
                }
                cursor = self
                    .entities
                    .get(current)
                    .ok_or(EcsError::UnknownEntity(current))?
                    .parent();
            }
        }
        if old == parent {
            return Ok(());
        }

        if let Some(old) = old.and_then(|old| self.entities.get_mut(old)) {
            old.remove_child(child);
        }
        if let Some(new) = parent.and_then(|parent| self.entities.get_mut(parent)) {
            new.add_child(child);
        }
        if let Some(entity) = self.entities.get_mut(child) {
            entity.set_parent_link(parent);
        }
        self.events.resolve();

        debug!(
            entity = child.raw(),
            parent = parent.map_or(0, EntityId::raw),
            "entity re-parented"
        );
        Ok(())
    }

    /// Entities without a parent, primary buffer first.
    pub fn entity_roots(&self) -> impl Iterator<Item = EntityRef<'_>> {
        self.entities().filter(|entity| entity.is_root())
    }

    /// Every descendant of `id`, depth first, parents before children.
    ///
    /// Empty if `id` is unknown or has no children.
    #[must_use]
    pub fn entity_descendants(&self, id: EntityId) -> Vec<EntityId> {
        let mut descendants = Vec::new();
        let mut stack: Vec<EntityId> = self
            .entities
            .get(id)
            .map(|entity| entity.children().iter().rev().copied().collect())
            .unwrap_or_default();

        while let Some(next) = stack.pop() {
            if let Some(entity) = self.entities.get(next) {
                descendants.push(next);
                stack.extend(entity.children().iter().rev().copied());
            }
        }
        descendants
    }

    // =========================================================================
    // Stores
    // =========================================================================

    /// The typed store for `T`, read-only. Records are added and removed
    /// through [`EntityMut`] so that masks stay in step.
    ///
    /// # Errors
    ///
    /// Returns an error if no store holds `T`.
    pub fn store<T: Component>(&self) -> EcsResult<&Store<T>> {
        self.registry.store::<T>()
    }

    /// The type-erased store for `kind`.
    #[must_use]
    pub fn store_of_kind(&self, kind: ComponentKind) -> Option<&(dyn ErasedStore + 'static)> {
        self.registry.get(kind)
    }

    /// Visits every store once, in declaration order.
    pub fn iterate_managers<F>(&self, mut visitor: F)
    where
        F: FnMut(&dyn ErasedStore),
    {
        for store in self.registry.iter() {
            visitor(store);
        }
    }

    /// Total number of component records across all stores.
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.registry.record_count()
    }

    // =========================================================================
    // Simulation
    // =========================================================================

    /// Starts the simulation. Active records receive `on_start` before their
    /// next tick.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.stop_pending = false;
        self.events.publish(WorldEvent::Started);
        info!(name = %self.config.name, "simulation started");
    }

    /// Stops the simulation. Started records receive `on_stop` on the next
    /// tick.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.stop_pending = true;
        self.events.publish(WorldEvent::Stopped);
        info!(name = %self.config.name, "simulation stopped");
    }

    /// Whether the simulation is running.
    #[inline]
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Number of ticks run so far.
    #[inline]
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Advances the world by one frame.
    ///
    /// Entities spawned through commands during this frame are placed in the
    /// secondary buffer and first ticked next frame.
    pub fn tick(&mut self, delta_time: f32) {
        let merged = self.entities.merge_secondary();
        if merged > 0 {
            debug!(merged, "secondary entities merged");
        }

        self.frame += 1;
        let stopping = std::mem::take(&mut self.stop_pending);
        let mut queue = std::mem::take(&mut self.pending);

        {
            let commands = Commands::new(&mut self.ids, &mut queue);
            let mut ctx =
                TickContext::new(delta_time, self.frame, self.running, stopping, commands);
            for store in self.registry.iter_mut() {
                store.run_frame(&mut ctx);
            }
        }

        for command in queue.drain(..) {
            if let Err(err) = self.apply(&command) {
                warn!(?command, %err, "deferred command skipped");
            }
        }
        self.pending = queue;
    }

    fn apply(&mut self, command: &Command) -> EcsResult<()> {
        match command {
            Command::Spawn { entity, name } => {
                self.entities
                    .push_secondary(Entity::new(*entity, name.as_str()))?;
                self.events.resolve();
                debug!(entity = entity.raw(), %name, "entity spawned");
                Ok(())
            }
            Command::Despawn { entity } => self.entity_remove(*entity),
            Command::AddComponent { entity, kind } => self
                .entity_mut(*entity)
                .ok_or(EcsError::UnknownEntity(*entity))?
                .add_component_of_kind(*kind)
                .map(drop),
            Command::RemoveComponent { entity, component } => self
                .entity_mut(*entity)
                .ok_or(EcsError::UnknownEntity(*entity))?
                .remove_component_by_id(*component),
            Command::SetActive { entity, active } => {
                self.entity_mut(*entity)
                    .ok_or(EcsError::UnknownEntity(*entity))?
                    .set_active(*active);
                Ok(())
            }
            Command::SetParent { entity, parent } => self.set_parent(*entity, *parent),
        }
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Opens a channel that receives every [`WorldEvent`] from now on.
    #[must_use]
    pub fn subscribe(&mut self) -> EventReceiver {
        self.events.subscribe()
    }

    /// Whether structure changed since the last [`World::take_dirty`].
    #[inline]
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.events.is_dirty()
    }

    /// Returns and clears the dirty flag.
    pub fn take_dirty(&mut self) -> bool {
        self.events.take_dirty()
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Removes every entity and every component record.
    ///
    /// Ids are not recycled: ids handed out before the unload stay unused.
    pub fn unload(&mut self) {
        let count = self.entities.len();
        self.entities.clear();
        self.registry = StoreRegistry::new(self.config.store_capacity);
        self.pending.clear();
        self.events.publish(WorldEvent::Unloaded);
        self.events.resolve();
        info!(name = %self.config.name, entities = count, "world unloaded");
    }

    /// Verifies every store's maps and the entity mask invariant.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::Inconsistent`] describing the first violation.
    pub fn check_consistency(&self) -> EcsResult<()> {
        for store in self.registry.iter() {
            store.check_consistency()?;

            let mut orphan = None;
            store.for_each_erased(&mut |component| {
                if orphan.is_none() && !self.entities.contains(component.owner_id()) {
                    orphan = Some(component.owner_id());
                }
            });
            if let Some(owner) = orphan {
                return Err(EcsError::Inconsistent {
                    kind: store.kind(),
                    detail: format!("record owned by unregistered entity {owner}"),
                });
            }
        }

        for entity in self.entities.iter() {
            let mut owned = 0;
            for kind in ComponentKind::ALL {
                let Some(store) = self.registry.get(kind) else {
                    continue;
                };
                let ids = store.component_ids(entity.id());
                if entity.has_component(kind) == ids.is_empty() {
                    return Err(EcsError::Inconsistent {
                        kind,
                        detail: format!(
                            "entity {} mask bit is {} but store holds {} records",
                            entity.id(),
                            entity.has_component(kind),
                            ids.len()
                        ),
                    });
                }
                if ids.iter().any(|id| entity.kind_of(*id) != Some(kind)) {
                    return Err(EcsError::Inconsistent {
                        kind,
                        detail: format!("entity {} id table is stale", entity.id()),
                    });
                }
                owned += ids.len();
            }
            self.check_links(entity)?;
            if owned != entity.component_count() {
                return Err(EcsError::Inconsistent {
                    kind: ComponentKind::Transform,
                    detail: format!(
                        "entity {} tracks {} components but stores hold {owned}",
                        entity.id(),
                        entity.component_count()
                    ),
                });
            }
        }

        Ok(())
    }

    fn check_links(&self, entity: &Entity) -> EcsResult<()> {
        let broken = |detail: String| EcsError::BrokenHierarchy {
            entity: entity.id(),
            detail,
        };

        if let Some(parent) = entity.parent() {
            let listed = self
                .entities
                .get(parent)
                .is_some_and(|parent| parent.children().contains(&entity.id()));
            if !listed {
                return Err(broken(format!("parent {parent} does not list it")));
            }
        }
        for &child in entity.children() {
            let linked = self
                .entities
                .get(child)
                .is_some_and(|child| child.parent() == Some(entity.id()));
            if !linked {
                return Err(broken(format!("child {child} does not point back")));
            }
        }
        Ok(())
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
