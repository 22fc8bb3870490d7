//! # Entity Component Store
//!
//! Entities, typed component stores, and the world that ties them together.
//!
//! ## Design
//!
//! - One dense store per component variant, slot 0 reserved
//! - Forward (entity → component → slot) and reverse (slot → entity) maps
//! - Swap-removal keeps stores gap-free; component ids never move
//! - Entity capability masks answer "has a T?" without touching a store
//! - Structural changes during a tick are queued and applied afterwards

mod buffers;
mod commands;
mod component;
mod entity;
mod error;
mod kind;
mod persistence;
mod registry;
mod storage;
mod world;

pub use buffers::EntityBuffers;
pub use commands::{Command, Commands, TickContext};
pub use component::{Component, ComponentId, ErasedComponent, Record};
pub use entity::{Entity, EntityId, EntityMut, EntityRef, IdGenerator};
pub use error::{EcsError, EcsResult};
pub use kind::{ComponentKind, ComponentMask};
pub use persistence::{WORLD_EXTENSION, WORLD_MAGIC, WORLD_VERSION};
pub use registry::StoreRegistry;
pub use storage::{ErasedStore, Store};
pub use world::{World, DEFAULT_ENTITY_NAME};
