//! Integration tests for parent/child links: roots, cascading removal,
//! deferred re-parenting and persistence of the tree.

use ember_core::components::{Camera, Script, ScriptBehavior, Transform};
use ember_core::{EcsError, EntityId, StreamReader, StreamWriter, TickContext, World};

fn ids(world: &World) -> Vec<EntityId> {
    world.entity_roots().map(|entity| entity.id()).collect()
}

/// Builds `car -> (wheel_front, wheel_back -> hubcap)` plus a free `camera`.
fn garage(world: &mut World) -> [EntityId; 5] {
    let car = world.entity_create_named("Car").unwrap().id();
    let mut wheel_front = world.entity_create_named("WheelFront").unwrap();
    wheel_front.add_component::<Transform>().unwrap();
    let wheel_front = wheel_front.id();
    let mut wheel_back = world.entity_create_named("WheelBack").unwrap();
    wheel_back.add_component::<Transform>().unwrap();
    let wheel_back = wheel_back.id();
    let hubcap = world.entity_create_named("Hubcap").unwrap().id();
    let mut camera = world.entity_create_named("Camera").unwrap();
    camera.add_component::<Camera>().unwrap();
    let camera = camera.id();

    world.set_parent(wheel_front, Some(car)).unwrap();
    world.set_parent(wheel_back, Some(car)).unwrap();
    world.set_parent(hubcap, Some(wheel_back)).unwrap();
    [car, wheel_front, wheel_back, hubcap, camera]
}

#[test]
fn test_roots_exclude_children() {
    let mut world = World::new();
    let [car, wheel_front, wheel_back, hubcap, camera] = garage(&mut world);

    let roots = ids(&world);
    assert_eq!(roots, vec![car, camera]);
    for child in [wheel_front, wheel_back, hubcap] {
        assert!(!roots.contains(&child));
    }
    assert_eq!(
        world.entity_descendants(car),
        vec![wheel_front, wheel_back, hubcap]
    );
}

#[test]
fn test_removing_parent_removes_children() {
    let mut world = World::new();
    let [car, wheel_front, wheel_back, hubcap, camera] = garage(&mut world);
    assert_eq!(world.component_count(), 3);

    world.entity_remove(car).unwrap();

    for gone in [car, wheel_front, wheel_back, hubcap] {
        assert!(!world.entity_exists(gone));
        assert!(matches!(
            world.entity_remove(gone),
            Err(EcsError::UnknownEntity(_))
        ));
    }
    assert_eq!(world.entity_count(), 1);
    assert_eq!(world.component_count(), 1);
    assert_eq!(ids(&world), vec![camera]);
    world.check_consistency().unwrap();
}

#[test]
fn test_removing_child_detaches_it_from_parent() {
    let mut world = World::new();
    let [car, wheel_front, wheel_back, hubcap, _] = garage(&mut world);

    world.entity_remove(wheel_back).unwrap();
    assert!(!world.entity_exists(hubcap));
    assert_eq!(world.entity(car).unwrap().children(), &[wheel_front]);
    world.check_consistency().unwrap();
}

#[test]
fn test_reparenting_moves_subtree() {
    let mut world = World::new();
    let [car, _, wheel_back, hubcap, camera] = garage(&mut world);

    world.set_parent(wheel_back, Some(camera)).unwrap();
    assert_eq!(world.entity_descendants(camera), vec![wheel_back, hubcap]);
    assert!(!world.entity_descendants(car).contains(&hubcap));

    assert!(matches!(
        world.set_parent(camera, Some(hubcap)),
        Err(EcsError::HierarchyCycle { .. })
    ));
    world.check_consistency().unwrap();
}

/// Detaches its own entity from whatever parent it has.
struct Runaway;

impl ScriptBehavior for Runaway {
    fn tick(&mut self, ctx: &mut TickContext<'_>) {
        let me = ctx.entity();
        ctx.commands().set_parent(me, None);
    }
}

#[test]
fn test_deferred_detach_during_tick() {
    let mut world = World::new();
    let [car, wheel_front, ..] = garage(&mut world);
    world
        .entity_mut(wheel_front)
        .unwrap()
        .add_component::<Script>()
        .unwrap()
        .set_behavior(Runaway);

    world.tick(0.016);
    assert!(world.entity(wheel_front).unwrap().is_root());
    assert!(!world.entity(car).unwrap().children().contains(&wheel_front));
    world.check_consistency().unwrap();
}

#[test]
fn test_tree_survives_save_and_load() {
    let mut source = World::new();
    let [car, wheel_front, wheel_back, hubcap, camera] = garage(&mut source);

    let mut stream = StreamWriter::new();
    source.save(&mut stream);

    let mut target = World::new();
    target.load(&mut StreamReader::new(stream.as_slice())).unwrap();

    assert_eq!(ids(&target), vec![car, camera]);
    assert_eq!(target.entity(car).unwrap().children(), &[wheel_front, wheel_back]);
    assert_eq!(target.entity(hubcap).unwrap().parent(), Some(wheel_back));
    target.check_consistency().unwrap();

    target.entity_remove(car).unwrap();
    assert_eq!(target.entity_count(), 1);
}
