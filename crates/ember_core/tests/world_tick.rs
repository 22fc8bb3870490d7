//! Integration tests for ticking, deferred commands and world events.

use std::cell::Cell;
use std::rc::Rc;

use ember_core::components::{Script, ScriptBehavior, Transform};
use ember_core::{ComponentKind, EntityId, TickContext, World, WorldEvent};

/// Spawns one child carrying a script on its first tick.
struct Spawner {
    child: Rc<Cell<Option<EntityId>>>,
}

impl ScriptBehavior for Spawner {
    fn tick(&mut self, ctx: &mut TickContext<'_>) {
        if self.child.get().is_some() {
            return;
        }
        let child = ctx.commands().spawn("Child");
        ctx.commands().add_component(child, ComponentKind::Script);
        self.child.set(Some(child));
    }
}

/// Removes its own entity on the first tick.
struct SelfDestruct;

impl ScriptBehavior for SelfDestruct {
    fn tick(&mut self, ctx: &mut TickContext<'_>) {
        let entity = ctx.entity();
        ctx.commands().despawn(entity);
    }
}

/// Records start and stop calls.
struct Lifecycle {
    starts: Rc<Cell<u32>>,
    stops: Rc<Cell<u32>>,
}

impl ScriptBehavior for Lifecycle {
    fn start(&mut self, _ctx: &mut TickContext<'_>) {
        self.starts.set(self.starts.get() + 1);
    }

    fn tick(&mut self, _ctx: &mut TickContext<'_>) {}

    fn stop(&mut self) {
        self.stops.set(self.stops.get() + 1);
    }
}

fn script_ticks(world: &World, id: EntityId) -> u64 {
    world
        .entity(id)
        .unwrap()
        .get_component::<Script>()
        .unwrap()
        .ticks()
}

// ============================================================================
// ITERATION DURING CREATION
// ============================================================================

#[test]
fn entity_spawned_during_tick_waits_for_next_frame() {
    let mut world = World::new();
    let child = Rc::new(Cell::new(None));

    let mut parent = world.entity_create_named("Parent").unwrap();
    parent
        .add_component::<Script>()
        .unwrap()
        .set_behavior(Spawner {
            child: Rc::clone(&child),
        });
    let parent = parent.id();

    world.tick(1.0 / 60.0);
    let child = child.get().unwrap();

    assert_eq!(world.secondary().len(), 1);
    assert_eq!(world.secondary()[0].id(), child);
    assert!(world.primary().iter().all(|entity| entity.id() != child));
    assert_eq!(script_ticks(&world, parent), 1);
    assert_eq!(script_ticks(&world, child), 0);
    assert_eq!(world.entity(child).unwrap().name(), "Child");

    world.tick(1.0 / 60.0);
    assert!(world.secondary().is_empty());
    assert_eq!(world.primary().last().unwrap().id(), child);
    assert_eq!(script_ticks(&world, parent), 2);
    assert_eq!(script_ticks(&world, child), 1);
    world.check_consistency().unwrap();
}

#[test]
fn despawn_command_applies_after_iteration() {
    let mut world = World::new();
    let mut doomed = world.entity_create().unwrap();
    doomed.add_component::<Transform>().unwrap();
    doomed
        .add_component::<Script>()
        .unwrap()
        .set_behavior(SelfDestruct);
    let doomed = doomed.id();

    world.tick(0.016);
    assert!(!world.entity_exists(doomed));
    assert_eq!(world.component_count(), 0);
    world.check_consistency().unwrap();
}

#[test]
fn failing_command_is_skipped() {
    struct BadTarget;

    impl ScriptBehavior for BadTarget {
        fn tick(&mut self, ctx: &mut TickContext<'_>) {
            ctx.commands()
                .add_component(EntityId::from_raw(999_999), ComponentKind::Light);
            let me = ctx.entity();
            ctx.commands().set_active(me, false);
        }
    }

    let mut world = World::new();
    let mut entity = world.entity_create().unwrap();
    entity
        .add_component::<Script>()
        .unwrap()
        .set_behavior(BadTarget);
    let id = entity.id();

    world.tick(0.016);
    assert!(!world.entity(id).unwrap().is_active());

    world.tick(0.016);
    assert_eq!(script_ticks(&world, id), 1);
}

// ============================================================================
// LIFECYCLE
// ============================================================================

#[test]
fn start_runs_once_and_stop_once() {
    let starts = Rc::new(Cell::new(0));
    let stops = Rc::new(Cell::new(0));

    let mut world = World::new();
    let mut entity = world.entity_create().unwrap();
    entity
        .add_component::<Script>()
        .unwrap()
        .set_behavior(Lifecycle {
            starts: Rc::clone(&starts),
            stops: Rc::clone(&stops),
        });

    world.start();
    for _ in 0..3 {
        world.tick(0.016);
    }
    assert_eq!(starts.get(), 1);
    assert_eq!(stops.get(), 0);

    world.stop();
    world.tick(0.016);
    world.tick(0.016);
    assert_eq!(stops.get(), 1);

    world.start();
    world.tick(0.016);
    assert_eq!(starts.get(), 2);
}

#[test]
fn elapsed_time_accumulates() {
    let mut world = World::new();
    let mut entity = world.entity_create().unwrap();
    entity.add_component::<Script>().unwrap();
    let id = entity.id();

    for _ in 0..4 {
        world.tick(0.25);
    }
    let elapsed = world
        .entity(id)
        .unwrap()
        .get_component::<Script>()
        .unwrap()
        .elapsed();
    assert!((elapsed - 1.0).abs() < 1e-6);
}

// ============================================================================
// EVENTS
// ============================================================================

#[test]
fn structural_changes_raise_resolve() {
    let mut world = World::new();
    let events = world.subscribe();

    let mut entity = world.entity_create().unwrap();
    entity.add_component::<Transform>().unwrap();
    let id = entity.id();
    world.entity_remove(id).unwrap();

    let received = events.drain();
    assert!(received.len() >= 3);
    assert!(received.iter().all(|event| *event == WorldEvent::Resolve));
    assert!(world.take_dirty());
    assert!(!world.is_dirty());
}

#[test]
fn lifecycle_events_are_published() {
    let mut world = World::new();
    let events = world.subscribe();

    world.start();
    world.stop();
    world.unload();

    let received = events.drain();
    assert_eq!(
        &received[..3],
        &[WorldEvent::Started, WorldEvent::Stopped, WorldEvent::Unloaded]
    );
}
