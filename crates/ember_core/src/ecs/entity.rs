//! # Entity Management
//!
//! An entity is an identity (id, name, flags) plus a capability mask that
//! summarizes which component variants it owns. The components themselves
//! live in the stores; the entity only remembers their ids.
//!
//! Borrowed access goes through two facades:
//! - [`EntityRef`] for reads, borrowing the world immutably
//! - [`EntityMut`] for structural changes, borrowing the world mutably

use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;

use tracing::debug;

use super::component::{Component, ComponentId, ErasedComponent, Record};
use super::error::{EcsError, EcsResult};
use super::kind::{ComponentKind, ComponentMask};
use super::registry::StoreRegistry;
use crate::components::{
    AudioListener, AudioSource, Camera, Collider, Constraint, Light, Renderable, RigidBody,
    Script, Skybox, Transform,
};
use crate::events::EventBus;

/// Unique identifier for an entity.
///
/// Entity and component ids come from one shared generator, so an id is
/// never reused for either within a world's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct EntityId(u32);

impl EntityId {
    /// Null/invalid entity id. Also marks the reserved store slot.
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

    /// Checks if this entity id is null/invalid.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic id source shared by entities and components.
#[derive(Clone, Debug)]
pub struct IdGenerator {
    next: u32,
}

impl IdGenerator {
    /// Creates a generator whose first id is 1.
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 1 }
    }

    fn allocate(&mut self) -> u32 {
        let id = self.next;
        self.next = self.next.saturating_add(1);
        id
    }

    /// Allocates a fresh entity id.
    pub fn next_entity(&mut self) -> EntityId {
        EntityId(self.allocate())
    }

    /// Allocates a fresh component id.
    pub fn next_component(&mut self) -> ComponentId {
        ComponentId::from_raw(self.allocate())
    }

    /// Marks `raw` as used so later allocations never return it.
    pub fn reserve(&mut self, raw: u32) {
        if raw >= self.next {
            self.next = raw.saturating_add(1);
        }
    }

    /// Returns the id the next allocation will produce.
    #[inline]
    #[must_use]
    pub const fn peek(&self) -> u32 {
        self.next
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Entity identity and capability summary.
///
/// Invariant: `mask` has the bit for a variant set iff the matching store
/// holds at least one component owned by this entity.
///
/// Hierarchy links are ids only. The world keeps `parent` and the parent's
/// `children` in agreement.
#[derive(Clone, Debug)]
pub struct Entity {
    id: EntityId,
    name: String,
    active: bool,
    visible_in_hierarchy: bool,
    mask: ComponentMask,
    kinds: HashMap<ComponentId, ComponentKind>,
    transform: Option<ComponentId>,
    renderable: Option<ComponentId>,
    parent: Option<EntityId>,
    children: Vec<EntityId>,
}

impl Entity {
    /// Creates an active, visible entity with no components.
    #[must_use]
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            active: true,
            visible_in_hierarchy: true,
            mask: ComponentMask::EMPTY,
            kinds: HashMap::new(),
            transform: None,
            renderable: None,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Returns the entity id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the display name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the display name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Whether the entity (and therefore its components) is ticked.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Whether editors should list this entity.
    #[inline]
    #[must_use]
    pub const fn is_visible_in_hierarchy(&self) -> bool {
        self.visible_in_hierarchy
    }

    /// Shows or hides the entity in editor hierarchies.
    pub fn set_hierarchy_visibility(&mut self, visible: bool) {
        self.visible_in_hierarchy = visible;
    }

    /// Returns the capability mask.
    #[inline]
    #[must_use]
    pub const fn mask(&self) -> ComponentMask {
        self.mask
    }

    /// O(1) capability test. Never touches a store.
    #[inline]
    #[must_use]
    pub const fn has_component(&self, kind: ComponentKind) -> bool {
        self.mask.contains(kind)
    }

    /// Typed form of [`Entity::has_component`].
    #[inline]
    #[must_use]
    pub const fn has<T: Component>(&self) -> bool {
        self.mask.contains(T::KIND)
    }

    /// Returns the variant of an owned component id.
    #[must_use]
    pub fn kind_of(&self, component: ComponentId) -> Option<ComponentKind> {
        self.kinds.get(&component).copied()
    }

    /// Number of components owned across all stores.
    #[inline]
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.kinds.len()
    }

    /// Owned component ids with their variants, ordered by id.
    #[must_use]
    pub fn component_ids(&self) -> Vec<(ComponentId, ComponentKind)> {
        let mut ids: Vec<_> = self.kinds.iter().map(|(&id, &kind)| (id, kind)).collect();
        ids.sort_unstable_by_key(|(id, _)| *id);
        ids
    }

    /// Cached id of the transform component.
    #[inline]
    #[must_use]
    pub const fn transform_id(&self) -> Option<ComponentId> {
        self.transform
    }

    /// Cached id of the renderable component.
    #[inline]
    #[must_use]
    pub const fn renderable_id(&self) -> Option<ComponentId> {
        self.renderable
    }

    /// Parent in the scene hierarchy, `None` for a root.
    #[inline]
    #[must_use]
    pub const fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    /// Direct children, in attachment order.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[EntityId] {
        &self.children
    }

    /// Whether the entity has no parent.
    #[inline]
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub(crate) fn set_parent_link(&mut self, parent: Option<EntityId>) {
        self.parent = parent;
    }

    pub(crate) fn add_child(&mut self, child: EntityId) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    pub(crate) fn remove_child(&mut self, child: EntityId) {
        self.children.retain(|&id| id != child);
    }

    /// Drops links that point into another world.
    pub(crate) fn clear_links(&mut self) {
        self.parent = None;
        self.children.clear();
    }

    pub(crate) fn set_active_flag(&mut self, active: bool) {
        self.active = active;
    }

    pub(crate) fn record_added(&mut self, component: ComponentId, kind: ComponentKind) {
        self.mask.insert(kind);
        self.kinds.insert(component, kind);
        match kind {
            ComponentKind::Transform => self.transform = Some(component),
            ComponentKind::Renderable => self.renderable = Some(component),
            _ => {}
        }
    }

    /// `first_remaining` is the store's new first component for this entity.
    pub(crate) fn record_removed(
        &mut self,
        component: ComponentId,
        kind: ComponentKind,
        first_remaining: Option<ComponentId>,
    ) {
        self.kinds.remove(&component);
        if first_remaining.is_none() {
            self.mask.remove(kind);
        }
        match kind {
            ComponentKind::Transform => self.transform = first_remaining,
            ComponentKind::Renderable => self.renderable = first_remaining,
            _ => {}
        }
    }

    pub(crate) fn clear_components(&mut self) {
        self.mask = ComponentMask::EMPTY;
        self.kinds.clear();
        self.transform = None;
        self.renderable = None;
    }
}

/// Read-only view of an entity and its components.
#[derive(Clone, Copy)]
pub struct EntityRef<'w> {
    entity: &'w Entity,
    registry: &'w StoreRegistry,
}

impl<'w> EntityRef<'w> {
    pub(crate) const fn new(entity: &'w Entity, registry: &'w StoreRegistry) -> Self {
        Self { entity, registry }
    }

    /// Returns the underlying entity.
    #[inline]
    #[must_use]
    pub const fn entity(&self) -> &'w Entity {
        self.entity
    }

    /// First component of type `T` (lowest id).
    #[must_use]
    pub fn get_component<T: Component>(&self) -> Option<&'w Record<T>> {
        if !self.entity.has::<T>() {
            return None;
        }
        self.registry.store::<T>().ok()?.get(self.entity.id)
    }

    /// Every component of type `T`, ordered by id.
    #[must_use]
    pub fn get_components<T: Component>(&self) -> Vec<&'w Record<T>> {
        if !self.entity.has::<T>() {
            return Vec::new();
        }
        self.registry
            .store::<T>()
            .map(|store| store.get_all(self.entity.id))
            .unwrap_or_default()
    }

    /// The component with id `component`, whatever its variant.
    #[must_use]
    pub fn get_component_by_id(&self, component: ComponentId) -> Option<&'w dyn ErasedComponent> {
        let kind = self.entity.kind_of(component)?;
        self.registry.get(kind)?.component(self.entity.id, component)
    }

    /// Every component of this entity, in store declaration order.
    #[must_use]
    pub fn get_all_components(&self) -> Vec<&'w dyn ErasedComponent> {
        self.entity
            .mask
            .kinds()
            .filter_map(|kind| self.registry.get(kind))
            .flat_map(|store| store.components_of(self.entity.id))
            .collect()
    }

    /// The transform, through the cached handle.
    #[must_use]
    pub fn transform(&self) -> Option<&'w Record<Transform>> {
        let component = self.entity.transform?;
        self.registry
            .store::<Transform>()
            .ok()?
            .get_by_id(self.entity.id, component)
    }

    /// The renderable, through the cached handle.
    #[must_use]
    pub fn renderable(&self) -> Option<&'w Record<Renderable>> {
        let component = self.entity.renderable?;
        self.registry
            .store::<Renderable>()
            .ok()?
            .get_by_id(self.entity.id, component)
    }
}

impl Deref for EntityRef<'_> {
    type Target = Entity;

    fn deref(&self) -> &Entity {
        self.entity
    }
}

impl fmt::Debug for EntityRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EntityRef").field(self.entity).finish()
    }
}

/// Mutable view of an entity, able to add and remove components.
///
/// Holds disjoint borrows of the world's parts so that the entity, its
/// stores and the id generator can be updated together.
pub struct EntityMut<'w> {
    entity: &'w mut Entity,
    registry: &'w mut StoreRegistry,
    ids: &'w mut IdGenerator,
    events: &'w mut EventBus,
}

impl<'w> EntityMut<'w> {
    pub(crate) fn new(
        entity: &'w mut Entity,
        registry: &'w mut StoreRegistry,
        ids: &'w mut IdGenerator,
        events: &'w mut EventBus,
    ) -> Self {
        Self {
            entity,
            registry,
            ids,
            events,
        }
    }

    /// Read-only view of the same entity.
    #[must_use]
    pub fn view(&self) -> EntityRef<'_> {
        EntityRef::new(self.entity, self.registry)
    }

    /// Returns the underlying entity.
    #[inline]
    #[must_use]
    pub fn entity(&self) -> &Entity {
        self.entity
    }

    /// Sets the display name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.entity.set_name(name);
    }

    /// Shows or hides the entity in editor hierarchies.
    pub fn set_hierarchy_visibility(&mut self, visible: bool) {
        self.entity.set_hierarchy_visibility(visible);
    }

    /// Activates or deactivates the entity and every component it owns.
    pub fn set_active(&mut self, active: bool) {
        self.entity.set_active_flag(active);
        let id = self.entity.id;
        for kind in self.entity.mask.kinds() {
            if let Some(store) = self.registry.get_mut(kind) {
                store.set_entity_active(id, active);
            }
        }
    }

    /// Adds a default-constructed `T`.
    ///
    /// For single-instance variants an existing component is returned
    /// unchanged instead.
    ///
    /// # Errors
    ///
    /// Returns an error if no store is registered for `T`.
    pub fn add_component<T: Component>(&mut self) -> EcsResult<&mut Record<T>> {
        self.attach::<T>(None)
    }

    /// Adds a default-constructed component of `kind`, returning its id.
    ///
    /// # Errors
    ///
    /// Returns an error if no store is registered for `kind`.
    pub fn add_component_of_kind(&mut self, kind: ComponentKind) -> EcsResult<ComponentId> {
        self.attach_kind(kind, None)
    }

    /// Adds a component, optionally under a fixed id (used when loading).
    ///
    /// A fixed id must not already be owned by this entity, and a fixed-id
    /// single-instance add is rejected rather than deduplicated.
    pub(crate) fn attach<T: Component>(
        &mut self,
        fixed: Option<ComponentId>,
    ) -> EcsResult<&mut Record<T>> {
        let kind = T::KIND;
        let owner = self.entity.id;
        let store = self.registry.store_mut::<T>()?;

        if !kind.is_multi_instance() && self.entity.has_component(kind) {
            if let Some(component) = fixed {
                return Err(EcsError::DuplicateComponent {
                    entity: owner,
                    component,
                    kind,
                });
            }
            return store.get_mut(owner).ok_or_else(|| EcsError::Inconsistent {
                kind,
                detail: format!("mask set for entity {owner} but store has no record"),
            });
        }

        let component = match fixed {
            Some(component) => {
                if self.entity.kinds.contains_key(&component) {
                    return Err(EcsError::DuplicateComponent {
                        entity: owner,
                        component,
                        kind,
                    });
                }
                self.ids.reserve(component.raw());
                component
            }
            None => self.ids.next_component(),
        };

        let record = store.insert(Record::new(component, owner, T::default()))?;
        self.entity.record_added(component, kind);
        record.set_entity_active(self.entity.active);
        record.data_mut().on_initialize();
        self.events.resolve();

        debug!(entity = owner.raw(), component = component.raw(), %kind, "component added");
        Ok(record)
    }

    /// Maps a runtime variant tag to its concrete type.
    pub(crate) fn attach_kind(
        &mut self,
        kind: ComponentKind,
        fixed: Option<ComponentId>,
    ) -> EcsResult<ComponentId> {
        match kind {
            ComponentKind::Transform => self.attach::<Transform>(fixed).map(|r| r.id()),
            ComponentKind::AudioSource => self.attach::<AudioSource>(fixed).map(|r| r.id()),
            ComponentKind::AudioListener => self.attach::<AudioListener>(fixed).map(|r| r.id()),
            ComponentKind::Constraint => self.attach::<Constraint>(fixed).map(|r| r.id()),
            ComponentKind::Collider => self.attach::<Collider>(fixed).map(|r| r.id()),
            ComponentKind::RigidBody => self.attach::<RigidBody>(fixed).map(|r| r.id()),
            ComponentKind::Light => self.attach::<Light>(fixed).map(|r| r.id()),
            ComponentKind::Renderable => self.attach::<Renderable>(fixed).map(|r| r.id()),
            ComponentKind::Script => self.attach::<Script>(fixed).map(|r| r.id()),
            ComponentKind::Skybox => self.attach::<Skybox>(fixed).map(|r| r.id()),
            ComponentKind::Camera => self.attach::<Camera>(fixed).map(|r| r.id()),
        }
    }

    /// First component of type `T` (lowest id).
    #[must_use]
    pub fn get_component<T: Component>(&self) -> Option<&Record<T>> {
        self.view().get_component::<T>()
    }

    /// First component of type `T`, mutably.
    pub fn get_component_mut<T: Component>(&mut self) -> Option<&mut Record<T>> {
        if !self.entity.has::<T>() {
            return None;
        }
        self.registry.store_mut::<T>().ok()?.get_mut(self.entity.id)
    }

    /// Every component of type `T`, ordered by id.
    #[must_use]
    pub fn get_components<T: Component>(&self) -> Vec<&Record<T>> {
        self.view().get_components::<T>()
    }

    /// The component with id `component`, mutably and type-erased.
    pub fn get_component_by_id_mut(
        &mut self,
        component: ComponentId,
    ) -> Option<&mut dyn ErasedComponent> {
        let kind = self.entity.kind_of(component)?;
        self.registry
            .get_mut(kind)?
            .component_mut(self.entity.id, component)
    }

    /// Every component of this entity, in store declaration order.
    #[must_use]
    pub fn get_all_components(&self) -> Vec<&dyn ErasedComponent> {
        self.view().get_all_components()
    }

    /// The transform, through the cached handle.
    pub fn transform_mut(&mut self) -> Option<&mut Record<Transform>> {
        let component = self.entity.transform?;
        self.registry
            .store_mut::<Transform>()
            .ok()?
            .get_by_id_mut(self.entity.id, component)
    }

    /// Removes the first component of type `T`.
    ///
    /// Returns `Ok(None)` if the entity has none.
    ///
    /// # Errors
    ///
    /// Returns an error if no store is registered for `T`.
    pub fn remove_component<T: Component>(&mut self) -> EcsResult<Option<Record<T>>> {
        if !self.entity.has::<T>() {
            return Ok(None);
        }
        let owner = self.entity.id;
        let store = self.registry.store_mut::<T>()?;
        let Some(record) = store.remove(owner) else {
            return Ok(None);
        };
        let first_remaining = store.get(owner).map(Record::id);
        self.entity
            .record_removed(record.id(), T::KIND, first_remaining);
        self.events.resolve();

        debug!(entity = owner.raw(), component = record.id().raw(), kind = %T::KIND, "component removed");
        Ok(Some(record))
    }

    /// Removes one specific component, leaving siblings of the same variant.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnknownComponent`] if this entity does not own
    /// `component`. Nothing changes in that case.
    pub fn remove_component_by_id(&mut self, component: ComponentId) -> EcsResult<()> {
        let owner = self.entity.id;
        let kind = self
            .entity
            .kind_of(component)
            .ok_or(EcsError::UnknownComponent {
                entity: owner,
                component,
            })?;
        let store = self
            .registry
            .get_mut(kind)
            .ok_or(EcsError::StoreNotRegistered(kind))?;

        store.remove_component(owner, component)?;
        let first_remaining = store.component_ids(owner).first().copied();
        self.entity
            .record_removed(component, kind, first_remaining);
        self.events.resolve();

        debug!(entity = owner.raw(), component = component.raw(), %kind, "component removed");
        Ok(())
    }
}

impl Deref for EntityMut<'_> {
    type Target = Entity;

    fn deref(&self) -> &Entity {
        self.entity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_generator_is_shared_and_monotonic() {
        let mut ids = IdGenerator::new();
        let entity = ids.next_entity();
        let component = ids.next_component();
        assert_eq!(entity.raw(), 1);
        assert_eq!(component.raw(), 2);

        ids.reserve(10);
        assert_eq!(ids.next_entity().raw(), 11);
        ids.reserve(4);
        assert_eq!(ids.peek(), 12);
    }

    #[test]
    fn test_null_entity() {
        assert!(EntityId::NULL.is_null());
        assert!(EntityId::default().is_null());
        assert!(!EntityId::from_raw(3).is_null());
        assert_eq!(EntityId::from_raw(3).to_string(), "3");
    }

    #[test]
    fn test_entity_bookkeeping() {
        let mut entity = Entity::new(EntityId::from_raw(1), "Player");
        assert_eq!(entity.name(), "Player");
        assert!(entity.is_active());
        assert!(entity.mask().is_empty());

        let transform = ComponentId::from_raw(2);
        entity.record_added(transform, ComponentKind::Transform);
        assert!(entity.has::<Transform>());
        assert_eq!(entity.transform_id(), Some(transform));
        assert_eq!(entity.kind_of(transform), Some(ComponentKind::Transform));

        entity.record_removed(transform, ComponentKind::Transform, None);
        assert!(!entity.has_component(ComponentKind::Transform));
        assert_eq!(entity.transform_id(), None);
        assert_eq!(entity.component_count(), 0);
    }

    #[test]
    fn test_mask_kept_while_instances_remain() {
        let mut entity = Entity::new(EntityId::from_raw(1), "Scripted");
        let first = ComponentId::from_raw(5);
        let second = ComponentId::from_raw(6);
        entity.record_added(first, ComponentKind::Script);
        entity.record_added(second, ComponentKind::Script);

        entity.record_removed(first, ComponentKind::Script, Some(second));
        assert!(entity.has::<Script>());
        assert_eq!(
            entity.component_ids(),
            vec![(second, ComponentKind::Script)]
        );
    }

    #[test]
    fn test_child_links_are_unique() {
        let mut parent = Entity::new(EntityId::from_raw(1), "Parent");
        let child = EntityId::from_raw(2);
        assert!(parent.is_root());

        parent.add_child(child);
        parent.add_child(child);
        assert_eq!(parent.children(), &[child]);

        parent.remove_child(child);
        assert!(parent.children().is_empty());

        parent.set_parent_link(Some(EntityId::from_raw(9)));
        parent.add_child(child);
        parent.clear_links();
        assert!(parent.is_root());
        assert!(parent.children().is_empty());
    }
}
