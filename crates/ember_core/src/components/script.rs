//! Externally driven scripts.
//!
//! A [`Script`] names a script asset and optionally carries a native
//! [`ScriptBehavior`] that runs its hooks. Entities may own any number of
//! scripts.

use std::fmt;

use crate::ecs::{Component, ComponentKind, EcsResult, TickContext};
use crate::io::{StreamReader, StreamWriter};

/// Native behavior attached to a [`Script`].
///
/// Structural changes to the world go through
/// [`TickContext::commands`](crate::ecs::TickContext::commands).
pub trait ScriptBehavior {
    /// Called once before the first tick of a running simulation.
    fn start(&mut self, _ctx: &mut TickContext<'_>) {}

    /// Called once per frame while the owning entity is active.
    fn tick(&mut self, ctx: &mut TickContext<'_>);

    /// Called when the simulation stops.
    fn stop(&mut self) {}
}

/// Script component.
///
/// Only `path` is serialized. The behavior is runtime state that the host
/// re-attaches after a load or clone.
#[derive(Default)]
pub struct Script {
    /// Asset path of the script source.
    pub path: String,
    behavior: Option<Box<dyn ScriptBehavior>>,
    ticks: u64,
    elapsed: f32,
}

impl Script {
    /// Creates a script for `path` with no behavior.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Attaches a behavior, replacing any previous one.
    pub fn set_behavior(&mut self, behavior: impl ScriptBehavior + 'static) {
        self.behavior = Some(Box::new(behavior));
    }

    /// Detaches and returns the behavior.
    pub fn take_behavior(&mut self) -> Option<Box<dyn ScriptBehavior>> {
        self.behavior.take()
    }

    /// Whether a behavior is attached.
    #[must_use]
    pub fn has_behavior(&self) -> bool {
        self.behavior.is_some()
    }

    /// Frames this script has been ticked.
    #[inline]
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Seconds of simulated time this script has been ticked for.
    #[inline]
    #[must_use]
    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Script")
            .field("path", &self.path)
            .field("has_behavior", &self.behavior.is_some())
            .field("ticks", &self.ticks)
            .field("elapsed", &self.elapsed)
            .finish()
    }
}

impl Component for Script {
    const KIND: ComponentKind = ComponentKind::Script;

    fn on_start(&mut self, ctx: &mut TickContext<'_>) {
        if let Some(behavior) = self.behavior.as_mut() {
            behavior.start(ctx);
        }
    }

    fn on_stop(&mut self) {
        if let Some(behavior) = self.behavior.as_mut() {
            behavior.stop();
        }
    }

    fn on_tick(&mut self, ctx: &mut TickContext<'_>) {
        self.ticks += 1;
        self.elapsed += ctx.delta_time();
        if let Some(behavior) = self.behavior.as_mut() {
            behavior.tick(ctx);
        }
    }

    fn serialize(&self, stream: &mut StreamWriter) {
        stream.write_str(&self.path);
    }

    fn deserialize(&mut self, stream: &mut StreamReader<'_>) -> EcsResult<()> {
        self.path = stream.read_string()?;
        Ok(())
    }
}
