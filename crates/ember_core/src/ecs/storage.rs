//! # Component Storage
//!
//! Dense, per-variant component storage with O(1) add, lookup and removal.
//!
//! The storage uses a packed array plus two index maps:
//! - Slot 0 is reserved; live records occupy slots `[1, size)` with no gaps
//! - Forward map: entity id → (component id → slot)
//! - Reverse map: slot → owning entity id
//!
//! Removal swaps the last record into the vacated slot, so slots move but
//! component ids never do.
//!
//! ```text
//! slots:    [ - | A | B | C | D ]      remove B       [ - | A | D | C ]
//! reverse:  [ - | e1| e2| e3| e4]   ──────────────>   [ - | e1| e4| e3]
//! forward:  e4 → { D: 4 }                             e4 → { D: 2 }
//! ```

use std::any::Any;
use std::collections::{BTreeMap, HashMap};

use super::commands::TickContext;
use super::component::{Component, ComponentId, ErasedComponent, Record};
use super::entity::EntityId;
use super::error::{EcsError, EcsResult};
use super::kind::ComponentKind;
use crate::io::StreamWriter;

/// The reserved, never-populated slot.
const RESERVED_SLOT: usize = 0;

/// First slot that can hold a live record.
const FIRST_SLOT: usize = 1;

/// Packed storage for a single component variant.
///
/// This storage guarantees:
/// - Density: slots `[1, size)` are all live
/// - For every live slot `s`: `forward[reverse[s]][id_at(s)] == s`
/// - Lookup of "the" component of an entity returns the lowest component id
///
/// # Type Parameters
///
/// * `T` - The component payload type to store
///
/// # Example
///
/// ```rust,ignore
/// let mut store: Store<Transform> = Store::with_capacity(1024);
/// store.insert(Record::new(component_id, entity_id, Transform::default()))?;
/// let transform = store.get(entity_id);
/// ```
pub struct Store<T: Component> {
    /// Packed records. `records[i]` lives in slot `i + 1`.
    records: Vec<Record<T>>,
    /// entity → (component → slot). Ordered so "first" is deterministic.
    forward: HashMap<EntityId, BTreeMap<ComponentId, usize>>,
    /// slot → owning entity. `reverse[0]` is the reserved slot.
    reverse: Vec<EntityId>,
}

impl<T: Component> Store<T> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty store with room for `capacity` records.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let mut reverse = Vec::with_capacity(capacity + FIRST_SLOT);
        reverse.push(EntityId::NULL);

        Self {
            records: Vec::with_capacity(capacity),
            forward: HashMap::with_capacity(capacity),
            reverse,
        }
    }

    /// Returns the variant this store holds.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> ComponentKind {
        T::KIND
    }

    /// One past the last live slot. An empty store has size 1.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.records.len() + FIRST_SLOT
    }

    /// Returns the number of live records.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the store holds no records.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Inserts a freshly constructed record at slot `size`.
    ///
    /// The record is retrievable by its owner and by its own id on return.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::DuplicateComponent`] if the owner already has a
    /// component with this id. The store is unchanged in that case.
    pub fn insert(&mut self, record: Record<T>) -> EcsResult<&mut Record<T>> {
        let owner = record.owner();
        let id = record.id();

        if self
            .forward
            .get(&owner)
            .is_some_and(|components| components.contains_key(&id))
        {
            return Err(EcsError::DuplicateComponent {
                entity: owner,
                component: id,
                kind: T::KIND,
            });
        }

        let slot = self.size();
        self.records.push(record);
        self.reverse.push(owner);
        self.forward.entry(owner).or_default().insert(id, slot);

        let index = self.records.len() - 1;
        Ok(&mut self.records[index])
    }

    /// Returns the first component of `entity` (lowest component id).
    #[must_use]
    pub fn get(&self, entity: EntityId) -> Option<&Record<T>> {
        let slot = self.first_slot(entity)?;
        self.record_at(slot)
    }

    /// Returns the first component of `entity` mutably.
    pub fn get_mut(&mut self, entity: EntityId) -> Option<&mut Record<T>> {
        let slot = self.first_slot(entity)?;
        self.record_at_mut(slot)
    }

    /// Returns the component with id `component` if `entity` owns it.
    #[must_use]
    pub fn get_by_id(&self, entity: EntityId, component: ComponentId) -> Option<&Record<T>> {
        let slot = self.slot_of(entity, component)?;
        self.record_at(slot)
    }

    /// Returns the component with id `component` mutably if `entity` owns it.
    pub fn get_by_id_mut(
        &mut self,
        entity: EntityId,
        component: ComponentId,
    ) -> Option<&mut Record<T>> {
        let slot = self.slot_of(entity, component)?;
        self.record_at_mut(slot)
    }

    /// Returns every component of `entity`, ordered by component id.
    #[must_use]
    pub fn get_all(&self, entity: EntityId) -> Vec<&Record<T>> {
        self.forward
            .get(&entity)
            .map(|components| {
                components
                    .values()
                    .filter_map(|&slot| self.record_at(slot))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the ids of every component of `entity`, ascending.
    #[must_use]
    pub fn ids_of(&self, entity: EntityId) -> Vec<ComponentId> {
        self.forward
            .get(&entity)
            .map(|components| components.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Checks whether `entity` owns at least one component in this store.
    #[inline]
    #[must_use]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.forward.contains_key(&entity)
    }

    /// Removes the first component of `entity` (the one [`Store::get`] returns).
    ///
    /// Returns `None` if the entity owns no component here.
    pub fn remove(&mut self, entity: EntityId) -> Option<Record<T>> {
        let (id, slot) = {
            let components = self.forward.get(&entity)?;
            let (&id, &slot) = components.iter().next()?;
            (id, slot)
        };
        Some(self.swap_remove(entity, id, slot))
    }

    /// Removes one specific component, leaving siblings untouched.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnknownComponent`] if `entity` does not own
    /// `component`. The store is unchanged in that case.
    pub fn remove_by_id(
        &mut self,
        entity: EntityId,
        component: ComponentId,
    ) -> EcsResult<Record<T>> {
        let slot = self
            .slot_of(entity, component)
            .ok_or(EcsError::UnknownComponent { entity, component })?;
        Ok(self.swap_remove(entity, component, slot))
    }

    /// Removes every component of `entity`.
    pub fn remove_all(&mut self, entity: EntityId) -> Vec<Record<T>> {
        let mut removed = Vec::new();
        while let Some(record) = self.remove(entity) {
            removed.push(record);
        }
        removed
    }

    /// Visits every live record in slot order.
    pub fn for_each<F>(&self, mut visitor: F)
    where
        F: FnMut(&Record<T>),
    {
        for record in &self.records {
            visitor(record);
        }
    }

    /// Iterates live records in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Record<T>> {
        self.records.iter()
    }

    /// Iterates live records mutably in slot order.
    ///
    /// The store cannot be mutated structurally while this borrow is alive.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Record<T>> {
        self.records.iter_mut()
    }

    /// Returns the slot currently holding `component`.
    #[must_use]
    pub fn slot_of(&self, entity: EntityId, component: ComponentId) -> Option<usize> {
        self.forward.get(&entity)?.get(&component).copied()
    }

    /// Returns the owner recorded for a live slot.
    #[must_use]
    pub fn owner_at(&self, slot: usize) -> Option<EntityId> {
        if slot == RESERVED_SLOT {
            return None;
        }
        self.reverse.get(slot).copied()
    }

    /// Returns the record in a live slot.
    #[must_use]
    pub fn record_at(&self, slot: usize) -> Option<&Record<T>> {
        self.records.get(slot.checked_sub(FIRST_SLOT)?)
    }

    fn record_at_mut(&mut self, slot: usize) -> Option<&mut Record<T>> {
        self.records.get_mut(slot.checked_sub(FIRST_SLOT)?)
    }

    fn first_slot(&self, entity: EntityId) -> Option<usize> {
        self.forward.get(&entity)?.values().next().copied()
    }

    /// Propagates the owner's active flag to its records.
    pub fn set_entity_active(&mut self, entity: EntityId, active: bool) {
        let Some(components) = self.forward.get(&entity) else {
            return;
        };
        for &slot in components.values() {
            if let Some(record) = self.records.get_mut(slot - FIRST_SLOT) {
                record.set_entity_active(active);
            }
        }
    }

    /// Swap-removes the record in `slot`, which must be `entity`'s `id`.
    fn swap_remove(&mut self, entity: EntityId, id: ComponentId, slot: usize) -> Record<T> {
        let last_slot = self.size() - 1;

        let now_empty = match self.forward.get_mut(&entity) {
            Some(components) => {
                components.remove(&id);
                components.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.forward.remove(&entity);
        }

        // Both vectors move their last element into `slot`.
        let removed = self.records.swap_remove(slot - FIRST_SLOT);
        self.reverse.swap_remove(slot);

        if slot != last_slot {
            // reverse[slot] now holds the old reverse[last_slot]: the true owner
            // of the moved record, which may differ from `entity`.
            let moved_owner = self.reverse[slot];
            let moved_id = self.records[slot - FIRST_SLOT].id();
            if let Some(components) = self.forward.get_mut(&moved_owner) {
                components.insert(moved_id, slot);
            }
        }

        debug_assert_eq!(self.reverse.len(), self.size());
        removed
    }

    /// Verifies density and forward/reverse agreement.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::Inconsistent`] describing the first disagreement.
    pub fn check_consistency(&self) -> EcsResult<()> {
        let fail = |detail: String| EcsError::Inconsistent {
            kind: T::KIND,
            detail,
        };

        if self.reverse.len() != self.size() {
            return Err(fail(format!(
                "reverse map has {} entries for size {}",
                self.reverse.len(),
                self.size()
            )));
        }
        if self.reverse[RESERVED_SLOT] != EntityId::NULL {
            return Err(fail("reserved slot 0 is populated".to_string()));
        }

        for (index, record) in self.records.iter().enumerate() {
            let slot = index + FIRST_SLOT;
            let owner = self.reverse[slot];
            if record.owner() != owner {
                return Err(fail(format!(
                    "slot {slot} reverse owner {owner} but record owner {}",
                    record.owner()
                )));
            }
            if self.slot_of(owner, record.id()) != Some(slot) {
                return Err(fail(format!(
                    "forward[{owner}][{}] does not point at slot {slot}",
                    record.id()
                )));
            }
        }

        let mut mapped = 0;
        for (entity, components) in &self.forward {
            if components.is_empty() {
                return Err(fail(format!("entity {entity} has an empty forward entry")));
            }
            mapped += components.len();
        }
        if mapped != self.records.len() {
            return Err(fail(format!(
                "forward map has {mapped} entries for {} records",
                self.records.len()
            )));
        }

        Ok(())
    }
}

impl<T: Component> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Variant-agnostic interface over a [`Store`].
///
/// The world keeps one boxed `ErasedStore` per variant so cross-cutting code
/// (entity removal, enumeration, saving, ticking) can walk all stores
/// without naming their types.
pub trait ErasedStore {
    /// Returns the variant this store holds.
    fn kind(&self) -> ComponentKind;

    /// Returns the number of live records.
    fn len(&self) -> usize;

    /// Returns true if the store holds no records.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks whether `entity` owns at least one component in this store.
    fn contains_entity(&self, entity: EntityId) -> bool;

    /// Ids of every component of `entity`, ascending.
    fn component_ids(&self, entity: EntityId) -> Vec<ComponentId>;

    /// Type-erased view of one component.
    fn component(&self, entity: EntityId, component: ComponentId) -> Option<&dyn ErasedComponent>;

    /// Type-erased mutable view of one component.
    fn component_mut(
        &mut self,
        entity: EntityId,
        component: ComponentId,
    ) -> Option<&mut dyn ErasedComponent>;

    /// Type-erased views of every component of `entity`, ordered by id.
    fn components_of(&self, entity: EntityId) -> Vec<&dyn ErasedComponent>;

    /// Visits every live record in slot order.
    fn for_each_erased(&self, visitor: &mut dyn FnMut(&dyn ErasedComponent));

    /// Removes one specific component.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnknownComponent`] if `entity` does not own it.
    fn remove_component(&mut self, entity: EntityId, component: ComponentId) -> EcsResult<()>;

    /// Removes every component of `entity`, returning how many were removed.
    fn remove_entity(&mut self, entity: EntityId) -> usize;

    /// Propagates the owner's active flag to its records.
    fn set_entity_active(&mut self, entity: EntityId, active: bool);

    /// Runs start/stop/tick hooks for every record in slot order.
    fn run_frame(&mut self, ctx: &mut TickContext<'_>);

    /// Writes `len` followed by `(owner, id, payload)` for every record.
    fn serialize_all(&self, stream: &mut StreamWriter);

    /// Verifies the store's internal invariants.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::Inconsistent`] on the first disagreement.
    fn check_consistency(&self) -> EcsResult<()>;

    /// Returns self as `Any` for downcasting to `Store<T>`.
    fn as_any(&self) -> &dyn Any;

    /// Returns self as mutable `Any` for downcasting to `Store<T>`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ErasedStore for Store<T> {
    fn kind(&self) -> ComponentKind {
        T::KIND
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn contains_entity(&self, entity: EntityId) -> bool {
        self.contains(entity)
    }

    fn component_ids(&self, entity: EntityId) -> Vec<ComponentId> {
        self.ids_of(entity)
    }

    fn component(&self, entity: EntityId, component: ComponentId) -> Option<&dyn ErasedComponent> {
        self.get_by_id(entity, component)
            .map(|record| record as &dyn ErasedComponent)
    }

    fn component_mut(
        &mut self,
        entity: EntityId,
        component: ComponentId,
    ) -> Option<&mut dyn ErasedComponent> {
        self.get_by_id_mut(entity, component)
            .map(|record| record as &mut dyn ErasedComponent)
    }

    fn components_of(&self, entity: EntityId) -> Vec<&dyn ErasedComponent> {
        self.get_all(entity)
            .into_iter()
            .map(|record| record as &dyn ErasedComponent)
            .collect()
    }

    fn for_each_erased(&self, visitor: &mut dyn FnMut(&dyn ErasedComponent)) {
        for record in &self.records {
            visitor(record as &dyn ErasedComponent);
        }
    }

    fn remove_component(&mut self, entity: EntityId, component: ComponentId) -> EcsResult<()> {
        self.remove_by_id(entity, component).map(drop)
    }

    fn remove_entity(&mut self, entity: EntityId) -> usize {
        self.remove_all(entity).len()
    }

    fn set_entity_active(&mut self, entity: EntityId, active: bool) {
        Store::set_entity_active(self, entity, active);
    }

    fn run_frame(&mut self, ctx: &mut TickContext<'_>) {
        for record in &mut self.records {
            record.run_frame(ctx);
        }
    }

    fn serialize_all(&self, stream: &mut StreamWriter) {
        stream.write_u32(u32::try_from(self.records.len()).unwrap_or(u32::MAX));
        for record in &self.records {
            stream.write_u32(record.owner().raw());
            stream.write_u32(record.id().raw());
            record.write_payload(stream);
        }
    }

    fn check_consistency(&self) -> EcsResult<()> {
        Store::check_consistency(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
