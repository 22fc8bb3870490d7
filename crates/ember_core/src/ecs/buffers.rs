//! # Entity Buffers
//!
//! The world's entity population, split in two lists:
//!
//! ```text
//!   primary   [ e1 e2 e3 ... ]   iterated and ticked this frame
//!   secondary [ e9 e10 ]         created while iterating
//!                  │
//!                  └── merge_secondary() at the next frame boundary
//! ```
//!
//! Both lists keep insertion order. A shared lookup table makes id
//! resolution O(1) regardless of which list holds the entity.

use std::collections::HashMap;

use super::entity::{Entity, EntityId};
use super::error::{EcsError, EcsResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Buffer {
    Primary,
    Secondary,
}

#[derive(Clone, Copy, Debug)]
struct Location {
    buffer: Buffer,
    index: usize,
}

/// Primary and secondary entity lists.
#[derive(Debug, Default)]
pub struct EntityBuffers {
    primary: Vec<Entity>,
    secondary: Vec<Entity>,
    lookup: HashMap<EntityId, Location>,
}

impl EntityBuffers {
    /// Creates empty buffers with room for `capacity` primary entities.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            primary: Vec::with_capacity(capacity),
            secondary: Vec::new(),
            lookup: HashMap::with_capacity(capacity),
        }
    }

    fn push(&mut self, buffer: Buffer, entity: Entity) -> EcsResult<&mut Entity> {
        let id = entity.id();
        if id.is_null() || self.lookup.contains_key(&id) {
            return Err(EcsError::DuplicateEntity(id));
        }

        let list = match buffer {
            Buffer::Primary => &mut self.primary,
            Buffer::Secondary => &mut self.secondary,
        };
        let index = list.len();
        list.push(entity);
        self.lookup.insert(id, Location { buffer, index });
        Ok(&mut list[index])
    }

    /// Appends an entity to the primary list.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::DuplicateEntity`] if the id is null or already
    /// registered in either list.
    pub fn push_primary(&mut self, entity: Entity) -> EcsResult<&mut Entity> {
        self.push(Buffer::Primary, entity)
    }

    /// Appends an entity to the secondary list.
    ///
    /// # Errors
    ///
    /// Same as [`EntityBuffers::push_primary`].
    pub fn push_secondary(&mut self, entity: Entity) -> EcsResult<&mut Entity> {
        self.push(Buffer::Secondary, entity)
    }

    /// Looks an entity up in either list.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        let location = self.lookup.get(&id)?;
        self.list(location.buffer).get(location.index)
    }

    /// Looks an entity up in either list, mutably.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let location = *self.lookup.get(&id)?;
        match location.buffer {
            Buffer::Primary => self.primary.get_mut(location.index),
            Buffer::Secondary => self.secondary.get_mut(location.index),
        }
    }

    /// Checks whether either list holds `id`.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.lookup.contains_key(&id)
    }

    /// Whether `id` is waiting in the secondary list.
    #[must_use]
    pub fn is_pending(&self, id: EntityId) -> bool {
        self.lookup
            .get(&id)
            .is_some_and(|location| location.buffer == Buffer::Secondary)
    }

    /// Removes an entity, preserving the order of the rest.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let location = self.lookup.remove(&id)?;
        let list = match location.buffer {
            Buffer::Primary => &mut self.primary,
            Buffer::Secondary => &mut self.secondary,
        };
        let entity = list.remove(location.index);

        for (index, shifted) in list.iter().enumerate().skip(location.index) {
            if let Some(slot) = self.lookup.get_mut(&shifted.id()) {
                slot.index = index;
            }
        }
        Some(entity)
    }

    /// Moves every secondary entity to the end of the primary list.
    ///
    /// Returns how many entities were merged.
    pub fn merge_secondary(&mut self) -> usize {
        let merged = self.secondary.len();
        for entity in self.secondary.drain(..) {
            let index = self.primary.len();
            self.lookup.insert(
                entity.id(),
                Location {
                    buffer: Buffer::Primary,
                    index,
                },
            );
            self.primary.push(entity);
        }
        merged
    }

    fn list(&self, buffer: Buffer) -> &[Entity] {
        match buffer {
            Buffer::Primary => &self.primary,
            Buffer::Secondary => &self.secondary,
        }
    }

    /// Entities iterated this frame.
    #[inline]
    #[must_use]
    pub fn primary(&self) -> &[Entity] {
        &self.primary
    }

    /// Entities created during the current frame.
    #[inline]
    #[must_use]
    pub fn secondary(&self) -> &[Entity] {
        &self.secondary
    }

    /// Iterates primary then secondary entities.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.primary.iter().chain(self.secondary.iter())
    }

    /// Ids of every entity, primary first.
    #[must_use]
    pub fn ids(&self) -> Vec<EntityId> {
        self.iter().map(Entity::id).collect()
    }

    /// Total number of entities in both lists.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    /// Returns true if both lists are empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }

    /// Drops every entity.
    pub fn clear(&mut self) {
        self.primary.clear();
        self.secondary.clear();
        self.lookup.clear();
    }
}
