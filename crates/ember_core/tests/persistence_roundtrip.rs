//! Integration tests for world save/load and entity cloning.

use ember_core::components::{AudioSource, Renderable, Script, Transform};
use ember_core::{StreamReader, StreamWriter, World, WorldConfig};

fn temp_world_path() -> std::path::PathBuf {
    let id = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("test_world_{id}"))
}

fn sample_world() -> World {
    let mut world = World::from_config(WorldConfig {
        name: "Sample".to_string(),
        create_default_entities: true,
        ..WorldConfig::default()
    })
    .unwrap();
    world.initialize().unwrap();

    let mut crate_entity = world.entity_create_named("Crate").unwrap();
    crate_entity.add_component::<Transform>().unwrap().position = [3.0, 0.5, -2.0];
    let renderable = crate_entity.add_component::<Renderable>().unwrap();
    renderable.mesh = "meshes/crate.mesh".to_string();
    renderable.material = "materials/wood.mat".to_string();
    crate_entity.add_component::<AudioSource>().unwrap().clip = "sfx/creak.ogg".to_string();
    crate_entity.add_component::<Script>().unwrap().path = "scripts/spin.lua".to_string();
    crate_entity.add_component::<Script>().unwrap().path = "scripts/bob.lua".to_string();
    crate_entity.set_hierarchy_visibility(false);
    crate_entity.set_active(false);

    world
}

#[test]
fn saved_world_loads_identically() {
    let mut source = sample_world();
    let mut stream = StreamWriter::new();
    source.save(&mut stream);

    let mut target = World::new();
    target
        .load(&mut StreamReader::new(stream.as_slice()))
        .unwrap();

    assert_eq!(target.entity_count(), source.entity_count());
    assert_eq!(target.component_count(), source.component_count());

    for original in source.entities() {
        let loaded = target.entity(original.id()).unwrap();
        assert_eq!(loaded.name(), original.name());
        assert_eq!(loaded.is_active(), original.is_active());
        assert_eq!(loaded.is_visible_in_hierarchy(), original.is_visible_in_hierarchy());
        assert_eq!(loaded.mask(), original.mask());
        assert_eq!(loaded.component_ids(), original.component_ids());
        assert_eq!(loaded.transform_id(), original.transform_id());
    }

    let crate_entity = target.entity_by_name("Crate").unwrap();
    assert_eq!(crate_entity.transform().unwrap().position, [3.0, 0.5, -2.0]);
    assert_eq!(crate_entity.renderable().unwrap().material, "materials/wood.mat");
    let paths: Vec<_> = crate_entity
        .get_components::<Script>()
        .iter()
        .map(|script| script.path.clone())
        .collect();
    assert_eq!(paths, vec!["scripts/spin.lua", "scripts/bob.lua"]);

    // Inactive owners propagate to their records.
    let store = target.store::<AudioSource>().unwrap();
    assert!(store.iter().all(|record| !record.is_entity_active()));
    target.check_consistency().unwrap();

    let mut resaved = StreamWriter::new();
    target.save(&mut resaved);
    assert_eq!(resaved.as_slice(), stream.as_slice());
}

#[test]
fn loaded_ids_are_never_reissued() {
    let mut source = sample_world();
    let mut stream = StreamWriter::new();
    source.save(&mut stream);

    let highest = source
        .entities()
        .flat_map(|entity| {
            let mut ids = vec![entity.id().raw()];
            ids.extend(entity.component_ids().iter().map(|(id, _)| id.raw()));
            ids
        })
        .max()
        .unwrap();

    let mut target = World::new();
    target
        .load(&mut StreamReader::new(stream.as_slice()))
        .unwrap();
    let mut fresh = target.entity_create().unwrap();
    let component = fresh.add_component::<Transform>().unwrap().id();
    assert!(fresh.id().raw() > highest);
    assert!(component.raw() > highest);
}

#[test]
fn world_file_roundtrip() {
    let path = temp_world_path();
    let mut source = sample_world();
    let written = source.save_to_file(&path).unwrap();
    assert_eq!(written.extension().unwrap(), "world");

    let mut target = World::new();
    target.load_from_file(&path).unwrap();
    assert_eq!(target.entity_count(), source.entity_count());
    assert_eq!(target.name(), source.name());
    assert!(target.entity_by_name("DirectionalLight").is_some());

    std::fs::remove_file(written).unwrap();
}

#[test]
fn missing_file_reports_io_error() {
    let mut world = World::new();
    let err = world.load_from_file(temp_world_path()).unwrap_err();
    assert!(matches!(err, ember_core::EcsError::Io(_)));
}

#[test]
fn clone_copies_components_not_identities() {
    let mut world = sample_world();
    let original = world.entity_by_name("Crate").unwrap().id();
    let before = world.component_count();

    let clone = world.entity_clone(original).unwrap();
    let cloned = world.entity(clone).unwrap();
    let source = world.entity(original).unwrap();

    assert_eq!(cloned.name(), "Crate");
    assert_eq!(cloned.mask(), source.mask());
    assert!(!cloned.is_active());
    assert_ne!(cloned.transform_id(), source.transform_id());
    assert_eq!(
        cloned.get_component::<AudioSource>().unwrap().clip,
        "sfx/creak.ogg"
    );
    assert_eq!(
        cloned.get_components::<Script>().len(),
        source.get_components::<Script>().len()
    );
    assert_eq!(world.component_count(), before + 5);
}
