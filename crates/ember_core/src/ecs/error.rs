//! # ECS Error Types
//!
//! All errors that can occur while mutating or persisting the world.
//!
//! "Not found" is never an error here: lookups that can legitimately come up
//! empty return `Option` or an empty `Vec`. The variants below signal caller
//! mistakes, corrupted input, or a broken store invariant.

use thiserror::Error;

use super::component::ComponentId;
use super::entity::EntityId;
use super::kind::ComponentKind;

/// Errors that can occur in the entity/component store.
#[derive(Error, Debug)]
pub enum EcsError {
    /// The entity id is not registered in either entity buffer.
    #[error("unknown entity: {0}")]
    UnknownEntity(EntityId),

    /// The entity does not own a component with this id.
    #[error("entity {entity} owns no component with id {component}")]
    UnknownComponent {
        /// The entity that was queried.
        entity: EntityId,
        /// The component id that was not found.
        component: ComponentId,
    },

    /// An entity with this id is already registered.
    #[error("entity {0} already exists")]
    DuplicateEntity(EntityId),

    /// The component id (or a second single-instance component) is already
    /// stored for this entity.
    #[error("entity {entity} already has a {kind} component with id {component}")]
    DuplicateComponent {
        /// The owning entity.
        entity: EntityId,
        /// The conflicting component id.
        component: ComponentId,
        /// The store the conflict was detected in.
        kind: ComponentKind,
    },

    /// No store is registered for the variant.
    #[error("no store registered for {0}")]
    StoreNotRegistered(ComponentKind),

    /// Parenting would make an entity its own ancestor.
    #[error("entity {parent} cannot become the parent of its ancestor {entity}")]
    HierarchyCycle {
        /// The entity being re-parented.
        entity: EntityId,
        /// The rejected parent.
        parent: EntityId,
    },

    /// The store registered under a variant holds a different record type.
    #[error("store registered for {kind} does not hold {requested} records")]
    KindMismatch {
        /// The variant the store is registered under.
        kind: ComponentKind,
        /// The Rust type name that was requested.
        requested: &'static str,
    },

    /// Forward map, reverse map, packed array or entity mask disagree.
    #[error("{kind} store is inconsistent: {detail}")]
    Inconsistent {
        /// The store that failed the check.
        kind: ComponentKind,
        /// What disagreed.
        detail: String,
    },

    /// Parent and child links disagree.
    #[error("hierarchy of entity {entity} is inconsistent: {detail}")]
    BrokenHierarchy {
        /// The entity whose links failed the check.
        entity: EntityId,
        /// What disagreed.
        detail: String,
    },

    /// A variant tag read from a stream does not name a known variant.
    #[error("unknown component kind tag: {0}")]
    UnknownKind(u32),

    /// The stream ended before a value could be read.
    #[error("unexpected end of stream: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof {
        /// Bytes the read required.
        needed: usize,
        /// Bytes left in the stream.
        remaining: usize,
    },

    /// A string in the stream is not valid UTF-8.
    #[error("string in stream is not valid utf-8")]
    InvalidUtf8,

    /// The stream is well-formed bytes but not a valid world or entity.
    #[error("invalid world data: {0}")]
    InvalidFormat(String),

    /// Reading or writing a world file failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration file or value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for store and world operations.
pub type EcsResult<T> = Result<T, EcsError>;
