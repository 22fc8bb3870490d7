//! Integration tests for store density, index maps and entity masks.

use ember_core::components::{Camera, Light, Script, Transform};
use ember_core::{ComponentKind, EcsError, EntityId, World};

fn entity_with_transform(world: &mut World) -> (EntityId, ember_core::ComponentId) {
    let mut entity = world.entity_create().unwrap();
    let component = entity.add_component::<Transform>().unwrap().id();
    (entity.id(), component)
}

// ============================================================================
// SWAP-REMOVAL
// ============================================================================

#[test]
fn swap_remove_moves_last_record_into_hole() {
    let mut world = World::new();
    let (_e1, a) = entity_with_transform(&mut world);
    let (e2, b) = entity_with_transform(&mut world);
    let (e3, c) = entity_with_transform(&mut world);
    let (e4, d) = entity_with_transform(&mut world);

    {
        let store = world.store::<Transform>().unwrap();
        assert_eq!(store.size(), 5);
        assert_eq!(store.slot_of(e2, b), Some(2));
        assert_eq!(store.slot_of(e4, d), Some(4));
    }

    world
        .entity_mut(e2)
        .unwrap()
        .remove_component_by_id(b)
        .unwrap();

    let store = world.store::<Transform>().unwrap();
    assert_eq!(store.size(), 4);
    assert_eq!(store.record_at(2).unwrap().id(), d);
    assert_eq!(store.owner_at(2), Some(e4));
    assert_eq!(store.slot_of(e4, d), Some(2));
    assert_eq!(store.slot_of(e3, c), Some(3));
    assert!(store.get(e2).is_none());
    assert!(store.get_by_id(e2, b).is_none());
    assert!(store.iter().any(|record| record.id() == a));
    store.check_consistency().unwrap();
    world.check_consistency().unwrap();
}

#[test]
fn random_removal_order_keeps_store_dense() {
    let mut world = World::new();
    let ids: Vec<_> = (0..32).map(|_| entity_with_transform(&mut world).0).collect();

    // Deterministic shuffle: stride through the ids with a step coprime to 32.
    for index in (0..32).map(|i| (i * 13) % 32) {
        world
            .entity_mut(ids[index])
            .unwrap()
            .remove_component::<Transform>()
            .unwrap();

        let store = world.store::<Transform>().unwrap();
        assert_eq!(store.iter().count() + 1, store.size());
        store.check_consistency().unwrap();
    }
    assert!(world.store::<Transform>().unwrap().is_empty());
    world.check_consistency().unwrap();
}

// ============================================================================
// MULTI-INSTANCE
// ============================================================================

#[test]
fn removing_one_script_keeps_its_sibling() {
    let mut world = World::new();
    let mut entity = world.entity_create().unwrap();
    let s1 = entity.add_component::<Script>().unwrap().id();
    let s2 = entity.add_component::<Script>().unwrap().id();
    assert_ne!(s1, s2);

    entity.remove_component_by_id(s1).unwrap();
    assert!(entity.has::<Script>());
    let remaining: Vec<_> = entity
        .get_components::<Script>()
        .iter()
        .map(|script| script.id())
        .collect();
    assert_eq!(remaining, vec![s2]);

    entity.remove_component_by_id(s2).unwrap();
    assert!(!entity.has::<Script>());
    world.check_consistency().unwrap();
}

#[test]
fn first_script_is_lowest_id() {
    let mut world = World::new();
    let mut entity = world.entity_create().unwrap();
    let first = entity.add_component::<Script>().unwrap().id();
    entity.add_component::<Script>().unwrap();

    assert_eq!(entity.get_component::<Script>().unwrap().id(), first);
    let removed = entity.remove_component::<Script>().unwrap().unwrap();
    assert_eq!(removed.id(), first);
}

// ============================================================================
// MASK INVARIANT
// ============================================================================

#[test]
fn mask_tracks_store_membership_through_failures() {
    let mut world = World::new();
    let mut entity = world.entity_create().unwrap();
    let light = entity.add_component::<Light>().unwrap().id();
    entity.add_component::<Camera>().unwrap();

    assert!(matches!(
        entity.remove_component_by_id(ember_core::ComponentId::from_raw(10_000)),
        Err(EcsError::UnknownComponent { .. })
    ));
    assert!(entity.has_component(ComponentKind::Light));
    assert!(entity.has_component(ComponentKind::Camera));

    entity.remove_component_by_id(light).unwrap();
    assert!(!entity.has_component(ComponentKind::Light));
    assert!(matches!(
        entity.remove_component_by_id(light),
        Err(EcsError::UnknownComponent { .. })
    ));
    assert_eq!(entity.mask().kinds().collect::<Vec<_>>(), vec![ComponentKind::Camera]);
    world.check_consistency().unwrap();
}

#[test]
fn single_instance_add_returns_existing() {
    let mut world = World::new();
    let mut entity = world.entity_create().unwrap();
    entity.add_component::<Camera>().unwrap().far_plane = 77.0;
    let again = entity.add_component::<Camera>().unwrap();
    assert!((again.far_plane - 77.0).abs() < f32::EPSILON);
    assert_eq!(world.store::<Camera>().unwrap().len(), 1);
}

#[test]
fn add_by_kind_matches_typed_add() {
    let mut world = World::new();
    let mut entity = world.entity_create().unwrap();
    for kind in ComponentKind::ALL {
        entity.add_component_of_kind(kind).unwrap();
    }
    assert_eq!(entity.component_count(), ComponentKind::COUNT);
    assert_eq!(entity.get_all_components().len(), ComponentKind::COUNT);
    assert!(entity.transform_id().is_some());
    assert!(entity.renderable_id().is_some());
    world.check_consistency().unwrap();
}
