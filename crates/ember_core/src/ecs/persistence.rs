//! # World Persistence
//!
//! Byte-stream snapshots of whole worlds and single entities.
//!
//! ## World Format
//!
//! ```text
//! ┌────────┬─────────┬───────┬──────────────┬──────────────────────┐
//! │ "EMBW" │ version │ count │ ids[count]   │ entity[count] ...    │
//! │ 4 B    │ u32     │ u32   │ u32 each     │                      │
//! └────────┴─────────┴───────┴──────────────┴──────────────────────┘
//!
//! entity:
//!   active bool | visible bool | id u32 | name str
//!   parent u32 (0 for a root) | c u32 | child id u32 × c
//!   n u32 | (kind u32, component id u32) × n
//!   payload × n                               (same order as the pairs)
//! ```
//!
//! Every component of an entity is created before any payload is read, so
//! payloads may refer to sibling components. Parent links are restored
//! once every entity of the stream exists, in the stored child order.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::component::ComponentId;
use super::entity::{Entity, EntityId};
use super::error::{EcsError, EcsResult};
use super::kind::ComponentKind;
use super::world::World;
use crate::events::WorldEvent;
use crate::io::{StreamReader, StreamWriter};

/// World file magic bytes.
pub const WORLD_MAGIC: &[u8; 4] = b"EMBW";

/// World format version.
pub const WORLD_VERSION: u32 = 2;

/// Extension appended to world file paths that lack it.
pub const WORLD_EXTENSION: &str = "world";

impl World {
    /// Writes every entity and component to `stream`.
    pub fn save(&mut self, stream: &mut StreamWriter) {
        stream.write_bytes(WORLD_MAGIC);
        stream.write_u32(WORLD_VERSION);

        let ids = self.entities.ids();
        stream.write_u32(u32::try_from(ids.len()).unwrap_or(u32::MAX));
        for id in &ids {
            stream.write_u32(id.raw());
        }
        for entity in self.entities() {
            serialize_entity(&entity, stream);
        }

        self.events.publish(WorldEvent::Saved);
        info!(name = %self.name(), entities = ids.len(), bytes = stream.len(), "world saved");
    }

    /// Replaces the current population with the one stored in `stream`.
    ///
    /// Component ids are restored exactly and reserved in the id generator.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is truncated, has the wrong magic or
    /// version, or describes conflicting ids. The world is left empty in
    /// that case.
    pub fn load(&mut self, stream: &mut StreamReader<'_>) -> EcsResult<()> {
        self.unload();

        match self.load_entities(stream) {
            Ok(count) => {
                self.events.publish(WorldEvent::Loaded);
                info!(name = %self.name(), entities = count, "world loaded");
                Ok(())
            }
            Err(err) => {
                self.unload();
                Err(err)
            }
        }
    }

    fn load_entities(&mut self, stream: &mut StreamReader<'_>) -> EcsResult<usize> {
        if stream.read_bytes(WORLD_MAGIC.len())? != WORLD_MAGIC {
            return Err(EcsError::InvalidFormat("not a world stream".to_string()));
        }
        let version = stream.read_u32()?;
        if version != WORLD_VERSION {
            return Err(EcsError::InvalidFormat(format!(
                "unsupported world version {version}"
            )));
        }

        let count = stream.read_u32()? as usize;
        let mut ids = Vec::with_capacity(count.min(stream.remaining() / 4));
        for _ in 0..count {
            ids.push(EntityId::from_raw(stream.read_u32()?));
        }

        for &id in &ids {
            self.entity_add(Entity::new(id, ""))?;
        }
        let mut links = Vec::with_capacity(ids.len());
        for &id in &ids {
            links.push(self.deserialize_entity(stream, id)?);
        }
        for link in &links {
            for &child in &link.children {
                if !self.entity_exists(child) {
                    return Err(EcsError::InvalidFormat(format!(
                        "entity {} lists missing child {child}",
                        link.id
                    )));
                }
                self.set_parent(child, Some(link.id))?;
            }
        }
        for link in &links {
            let linked = self.entity(link.id).and_then(|entity| entity.parent());
            if linked != link.parent {
                return Err(EcsError::InvalidFormat(format!(
                    "entity {} stores a parent its parent does not list",
                    link.id
                )));
            }
        }
        Ok(ids.len())
    }

    /// Writes one entity, all of its components included.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnknownEntity`] if `id` is not registered.
    pub fn serialize_entity(&self, id: EntityId, stream: &mut StreamWriter) -> EcsResult<()> {
        let entity = self.entity(id).ok_or(EcsError::UnknownEntity(id))?;
        serialize_entity(&entity, stream);
        Ok(())
    }

    /// Reads one entity written by [`World::serialize_entity`] into the
    /// primary buffer, keeping its saved ids.
    ///
    /// The entity is attached to its stored parent when that parent exists
    /// in this world, and stays a root otherwise. Stored children are not
    /// linked.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is malformed or an id is taken. The
    /// world is left as it was before the call.
    pub fn deserialize_entity_new(&mut self, stream: &mut StreamReader<'_>) -> EcsResult<EntityId> {
        let active = stream.read_bool()?;
        let visible = stream.read_bool()?;
        let id = EntityId::from_raw(stream.read_u32()?);
        let name = stream.read_string()?;
        self.entity_add(Entity::new(id, ""))?;

        let result = match self.deserialize_body(stream, id, name, active, visible) {
            Ok(StoredLinks {
                parent: Some(parent),
                ..
            }) if self.entity_exists(parent) => self.set_parent(id, Some(parent)),
            Ok(_) => Ok(()),
            Err(err) => Err(err),
        };
        if let Err(err) = result {
            self.entity_remove(id)?;
            return Err(err);
        }
        Ok(id)
    }

    /// Reads the entity `expected`, which the caller has already added.
    fn deserialize_entity(
        &mut self,
        stream: &mut StreamReader<'_>,
        expected: EntityId,
    ) -> EcsResult<StoredLinks> {
        let active = stream.read_bool()?;
        let visible = stream.read_bool()?;
        let id = EntityId::from_raw(stream.read_u32()?);
        let name = stream.read_string()?;
        if expected != id {
            return Err(EcsError::InvalidFormat(format!(
                "entity {id} found where {expected} was listed"
            )));
        }
        self.deserialize_body(stream, id, name, active, visible)
    }

    fn deserialize_body(
        &mut self,
        stream: &mut StreamReader<'_>,
        id: EntityId,
        name: String,
        active: bool,
        visible: bool,
    ) -> EcsResult<StoredLinks> {
        let parent = EntityId::from_raw(stream.read_u32()?);
        let child_count = stream.read_u32()? as usize;
        let mut children = Vec::with_capacity(child_count.min(stream.remaining() / 4));
        for _ in 0..child_count {
            children.push(EntityId::from_raw(stream.read_u32()?));
        }

        let count = stream.read_u32()? as usize;
        let mut components = Vec::with_capacity(count.min(stream.remaining() / 8));
        for _ in 0..count {
            let kind = ComponentKind::from_tag(stream.read_u32()?)?;
            let component = ComponentId::from_raw(stream.read_u32()?);
            components.push((kind, component));
        }

        let mut entity = self.entity_mut(id).ok_or(EcsError::UnknownEntity(id))?;
        entity.set_name(name);
        entity.set_hierarchy_visibility(visible);

        for &(kind, component) in &components {
            entity.attach_kind(kind, Some(component))?;
        }
        for &(_, component) in &components {
            entity
                .get_component_by_id_mut(component)
                .ok_or(EcsError::UnknownComponent {
                    entity: id,
                    component,
                })?
                .read_payload(stream)?;
        }
        entity.set_active(active);

        debug!(entity = id.raw(), components = components.len(), "entity deserialized");
        Ok(StoredLinks {
            id,
            parent: (!parent.is_null()).then_some(parent),
            children,
        })
    }

    /// Duplicates an entity and all of its descendants with fresh ids.
    ///
    /// Names and flags are copied. Every component is re-created by variant
    /// and its payload copied through a byte stream, so runtime-only state
    /// (such as a script's behavior) is not carried over. The cloned root
    /// gets the source's parent and the cloned children keep their order.
    ///
    /// Returns the id of the cloned root.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnknownEntity`] if `id` is not registered. Every
    /// partially built clone is removed before any other error is returned.
    pub fn entity_clone(&mut self, id: EntityId) -> EcsResult<EntityId> {
        let parent = self.entity(id).ok_or(EcsError::UnknownEntity(id))?.parent();

        let mut created = Vec::new();
        match self.clone_subtree(id, parent, &mut created) {
            Ok(clone) => {
                debug!(source = id.raw(), clone = clone.raw(), entities = created.len(), "entity cloned");
                Ok(clone)
            }
            Err(err) => {
                for &clone in created.iter().rev() {
                    if self.entity_exists(clone) {
                        self.entity_remove(clone)?;
                    }
                }
                Err(err)
            }
        }
    }

    fn clone_subtree(
        &mut self,
        id: EntityId,
        parent: Option<EntityId>,
        created: &mut Vec<EntityId>,
    ) -> EcsResult<EntityId> {
        let source = self.entity(id).ok_or(EcsError::UnknownEntity(id))?;
        let name = source.name().to_owned();
        let active = source.is_active();
        let visible = source.is_visible_in_hierarchy();
        let children = source.children().to_vec();

        let mut payloads = StreamWriter::new();
        let kinds: Vec<ComponentKind> = source
            .get_all_components()
            .into_iter()
            .map(|component| {
                component.write_payload(&mut payloads);
                component.component_kind()
            })
            .collect();

        let clone = self.entity_create_named(name)?.id();
        created.push(clone);
        self.fill_clone(clone, &kinds, payloads.as_slice(), active, visible)?;
        if parent.is_some() {
            self.set_parent(clone, parent)?;
        }

        for child in children {
            self.clone_subtree(child, Some(clone), created)?;
        }
        Ok(clone)
    }

    fn fill_clone(
        &mut self,
        clone: EntityId,
        kinds: &[ComponentKind],
        payloads: &[u8],
        active: bool,
        visible: bool,
    ) -> EcsResult<()> {
        let mut entity = self
            .entity_mut(clone)
            .ok_or(EcsError::UnknownEntity(clone))?;
        entity.set_hierarchy_visibility(visible);

        let mut reader = StreamReader::new(payloads);
        for &kind in kinds {
            let component = entity.attach_kind(kind, None)?;
            entity
                .get_component_by_id_mut(component)
                .ok_or(EcsError::UnknownComponent {
                    entity: clone,
                    component,
                })?
                .read_payload(&mut reader)?;
        }
        entity.set_active(active);
        Ok(())
    }

    /// Saves the world to `path`, appending the `.world` extension if it is
    /// missing. The world takes the file stem as its name.
    ///
    /// Returns the path actually written.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::Io`] if the file cannot be written.
    pub fn save_to_file(&mut self, path: impl AsRef<Path>) -> EcsResult<PathBuf> {
        let path = with_world_extension(path.as_ref());
        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
            self.set_name(stem);
        }

        let mut stream = StreamWriter::with_capacity(4096);
        self.save(&mut stream);

        let mut file = BufWriter::new(File::create(&path)?);
        file.write_all(stream.as_slice())?;
        file.flush()?;

        info!(path = %path.display(), "world file written");
        Ok(path)
    }

    /// Loads the world from `path`, appending the `.world` extension if it
    /// is missing.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::Io`] if the file cannot be read, or any error of
    /// [`World::load`].
    pub fn load_from_file(&mut self, path: impl AsRef<Path>) -> EcsResult<()> {
        let path = with_world_extension(path.as_ref());
        let bytes = std::fs::read(&path)?;
        self.load(&mut StreamReader::new(&bytes))?;

        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
            self.set_name(stem);
        }
        Ok(())
    }
}

/// Hierarchy links read back from a stream, linked once every entity exists.
struct StoredLinks {
    id: EntityId,
    parent: Option<EntityId>,
    children: Vec<EntityId>,
}

fn serialize_entity(entity: &super::entity::EntityRef<'_>, stream: &mut StreamWriter) {
    stream.write_bool(entity.is_active());
    stream.write_bool(entity.is_visible_in_hierarchy());
    stream.write_u32(entity.id().raw());
    stream.write_str(entity.name());

    stream.write_u32(entity.parent().map_or(0, EntityId::raw));
    stream.write_u32(u32::try_from(entity.children().len()).unwrap_or(u32::MAX));
    for child in entity.children() {
        stream.write_u32(child.raw());
    }

    let components = entity.get_all_components();
    stream.write_u32(u32::try_from(components.len()).unwrap_or(u32::MAX));
    for component in &components {
        stream.write_u32(component.component_kind().tag());
        stream.write_u32(component.component_id().raw());
    }
    for component in &components {
        component.write_payload(stream);
    }
}

fn with_world_extension(path: &Path) -> PathBuf {
    if path.extension().is_some_and(|ext| ext == WORLD_EXTENSION) {
        path.to_path_buf()
    } else {
        let mut with_ext = path.as_os_str().to_owned();
        with_ext.push(".");
        with_ext.push(WORLD_EXTENSION);
        PathBuf::from(with_ext)
    }
}
