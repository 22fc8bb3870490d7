//! # EMBER Core
//!
//! Entity/component data store for the EMBER runtime:
//! - Dense per-variant component stores with O(1) add, lookup and removal
//! - Entities with capability masks and cached transform/renderable handles
//! - A world that ticks every store in a fixed order and defers structural
//!   changes made while ticking to the next frame boundary
//!
//! ## Architecture Rules
//!
//! 1. **Stores own components** - everything else holds a `ComponentId`
//! 2. **Validate before mutating** - a failed call leaves state untouched
//! 3. **No mutation during iteration** - tick hooks queue commands instead
//!
//! ## Example
//!
//! ```rust,ignore
//! use ember_core::{components::Transform, World};
//!
//! let mut world = World::new();
//! let mut entity = world.entity_create_named("Player")?;
//! entity.add_component::<Transform>()?;
//! world.tick(1.0 / 60.0);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod components;
pub mod config;
pub mod ecs;
pub mod events;
pub mod io;

pub use config::WorldConfig;
pub use ecs::{
    Command, Commands, Component, ComponentId, ComponentKind, ComponentMask, EcsError, EcsResult,
    Entity, EntityId, EntityMut, EntityRef, ErasedComponent, ErasedStore, Record, Store,
    TickContext, World,
};
pub use events::{EventBus, EventReceiver, WorldEvent};
pub use io::{StreamReader, StreamWriter};
