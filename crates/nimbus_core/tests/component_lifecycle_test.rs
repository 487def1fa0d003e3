//! Integration tests for the component store lifecycle.

use std::sync::Arc;

use nimbus_core::{
    json, ComponentDefinition, ComponentKind, ComponentRegistry, EcsError, Schema, Value, World,
};
use parking_lot::Mutex;

fn player_schema() -> Schema {
    Schema::object([
        ("name", Schema::required(Schema::string())),
        (
            "health",
            Schema::number().with_validate(|value, _, _| value.as_f64().is_some_and(|v| v >= 0.0)),
        ),
    ])
}

fn register(registry: &ComponentRegistry, definition: ComponentDefinition) -> ComponentKind {
    registry.register(definition).unwrap()
}

#[test]
fn test_required_value_error_propagates() {
    let registry = ComponentRegistry::new();
    let player = register(
        &registry,
        ComponentDefinition::builder("PlayerComponent")
            .schema(player_schema())
            .build(),
    );
    let mut world = World::new(registry);
    let entity = world.spawn();

    let error = world
        .set_component(entity, &player, Some(json!({"health": 10.0})))
        .unwrap_err();
    assert_eq!(error, EcsError::MissingRequiredValue { key: "name".to_string() });
    assert_eq!(error.to_string(), "missing required value for key name");

    // A failed first attach leaves nothing behind.
    assert!(!world.has_component(entity, &player));
    assert!(world.get_optional_component(entity, &player).is_none());
}

#[test]
fn test_validator_error_keeps_previous_state() {
    let registry = ComponentRegistry::new();
    let player = register(
        &registry,
        ComponentDefinition::builder("PlayerComponent")
            .schema(player_schema())
            .build(),
    );
    let mut world = World::new(registry);
    let entity = world.spawn();

    world
        .set_component(entity, &player, Some(json!({"name": "ada", "health": 5.0})))
        .unwrap();
    let error = world
        .set_component(entity, &player, Some(json!({"name": "ada", "health": -1.0})))
        .unwrap_err();
    assert_eq!(error, EcsError::InvalidValue { key: "health".to_string() });

    assert!(world.has_component(entity, &player));
    assert_eq!(
        world.get_component(entity, &player).unwrap(),
        &json!({"name": "ada", "health": 5.0})
    );
}

#[test]
fn test_membership_matches_state_after_mixed_operations() {
    let registry = ComponentRegistry::new();
    let kinds: Vec<ComponentKind> = (0..4)
        .map(|i| {
            register(
                &registry,
                ComponentDefinition::builder(format!("C{i}"))
                    .schema(Schema::object([("v", Schema::number())]))
                    .build(),
            )
        })
        .collect();
    let mut world = World::new(registry);
    let entities: Vec<_> = (0..8).map(|_| world.spawn()).collect();

    for (step, &entity) in entities.iter().enumerate() {
        for (i, kind) in kinds.iter().enumerate() {
            if (step + i) % 2 == 0 {
                world
                    .set_component(entity, kind, Some(json!({"v": step as f64})))
                    .unwrap();
            }
        }
        if step % 3 == 0 {
            world.remove_component(entity, &kinds[0]).unwrap();
        }
    }
    world.despawn(entities[5]);

    for &entity in &entities {
        for kind in &kinds {
            assert_eq!(
                world.has_component(entity, kind),
                world.get_optional_component(entity, kind).is_some(),
                "membership drifted for {entity} / {}",
                kind.name()
            );
        }
    }
}

#[test]
fn test_teardown_order_and_final_state() {
    let log: Arc<Mutex<Vec<String>>> = Arc::default();
    let registry = ComponentRegistry::new();

    let on_remove_log = Arc::clone(&log);
    let reactor_log = Arc::clone(&log);
    let kind = register(
        &registry,
        ComponentDefinition::builder("Light")
            .schema(Schema::object([("intensity", Schema::number())]))
            .on_remove(move |_, state| {
                on_remove_log.lock().push(format!("on_remove {}", state["intensity"]));
                Ok(())
            })
            .reactor(move |_, context| {
                let log = Arc::clone(&reactor_log);
                log.lock().push(format!("run {:?}", context.event));
                let kind = context.kind.clone();
                let entity = context.entity;
                Some(Box::new(move |world: &mut World| {
                    let state = world
                        .get_optional_component(entity, &kind)
                        .map_or(Value::Null, |state| state["intensity"].clone());
                    let attached = world.has_component(entity, &kind);
                    log.lock().push(format!("cleanup {state} attached={attached}"));
                }))
            })
            .build(),
    );

    let mut world = World::new(registry);
    let entity = world.spawn();
    world
        .set_component(entity, &kind, Some(json!({"intensity": 1.0})))
        .unwrap();
    world
        .set_component(entity, &kind, Some(json!({"intensity": 2.0})))
        .unwrap();
    world.flush_reactors();
    world.remove_component(entity, &kind).unwrap();

    assert_eq!(
        *log.lock(),
        vec![
            "run Attached".to_string(),
            "cleanup 2.0 attached=true".to_string(),
            "run Updated".to_string(),
            "on_remove 2.0".to_string(),
            "cleanup 2.0 attached=false".to_string(),
        ]
    );
    assert!(world.get_optional_component(entity, &kind).is_none());
}

#[test]
fn test_failing_on_remove_still_tears_down() {
    let registry = ComponentRegistry::new();
    let kind = register(
        &registry,
        ComponentDefinition::builder("Fragile")
            .on_remove(|_, _| {
                Err(EcsError::HookFailed {
                    component: "Fragile".to_string(),
                    reason: "refused".to_string(),
                })
            })
            .build(),
    );
    let other = register(&registry, ComponentDefinition::builder("Other").build());

    let mut world = World::new(registry);
    let entity = world.spawn();
    world.set_component(entity, &kind, Some(json!(1))).unwrap();
    world.set_component(entity, &other, Some(json!(2))).unwrap();

    assert!(world.remove_component(entity, &kind).is_err());
    assert!(!world.has_component(entity, &kind));
    assert!(world.get_optional_component(entity, &kind).is_none());

    world.set_component(entity, &kind, Some(json!(1))).unwrap();
    world.remove_all_components(entity);
    assert!(world.get_all_components(entity).is_empty());
}

#[test]
fn test_registry_reset_isolates_worlds() {
    let registry = ComponentRegistry::new();
    register(
        &registry,
        ComponentDefinition::builder("First").json_id("first").build(),
    );
    registry.reset();

    let second = register(
        &registry,
        ComponentDefinition::builder("Second").json_id("second").build(),
    );
    assert_eq!(second.index(), 0);
    assert!(registry.lookup_by_json_id("first").is_none());

    let mut world = World::new(registry.clone());
    let entity = world.spawn();
    world.set_component(entity, &second, Some(json!("ok"))).unwrap();
    assert_eq!(world.get_all_components(entity), vec![second]);
}

#[test]
fn test_world_from_before_reset_rejects_new_kinds() {
    let registry = ComponentRegistry::new();
    let old = register(&registry, ComponentDefinition::builder("Old").build());
    let mut world = World::new(registry.clone());
    let entity = world.spawn();
    world.set_component(entity, &old, Some(json!("old state"))).unwrap();

    registry.reset();
    let new = register(&registry, ComponentDefinition::builder("New").build());
    assert_eq!(new.index(), old.index());

    // Same index, different epoch: no aliasing onto the old table.
    assert!(!world.has_component(entity, &new));
    assert!(world.get_optional_component(entity, &new).is_none());
    assert!(world.query(&[&new]).is_empty());
    assert!(world.get_all_components(entity).is_empty());
    assert_eq!(
        world.set_component(entity, &new, Some(json!("new state"))).unwrap_err(),
        EcsError::StaleComponent("New".to_string())
    );

    let mut rebuilt = World::new(registry);
    let fresh = rebuilt.spawn();
    rebuilt.set_component(fresh, &new, Some(json!("new state"))).unwrap();
    assert!(rebuilt.has_component(fresh, &new));
}

#[test]
fn test_reactor_sees_schedule_from_other_components() {
    let registry = ComponentRegistry::new();
    let source = register(
        &registry,
        ComponentDefinition::builder("Source")
            .schema(Schema::object([("n", Schema::number())]))
            .build(),
    );
    let mirror = register(
        &registry,
        ComponentDefinition::builder("Mirror")
            .schema(Schema::object([("n", Schema::number())]))
            .build(),
    );

    let source_kind = source.clone();
    let mirror_kind = mirror.clone();
    let driver = register(
        &registry,
        ComponentDefinition::builder("Driver")
            .reactor(move |world, context| {
                let n = world
                    .get_optional_component(context.entity, &source_kind)
                    .map_or(Value::Null, |state| state["n"].clone());
                world
                    .set_component(context.entity, &mirror_kind, Some(json!({ "n": n })))
                    .ok();
                None
            })
            .build(),
    );

    let mut world = World::new(registry);
    let entity = world.spawn();
    world.set_component(entity, &source, Some(json!({"n": 3.0}))).unwrap();
    world.set_component(entity, &driver, Some(json!(true))).unwrap();
    assert_eq!(world.get_component(entity, &mirror).unwrap()["n"], json!(3.0));
}
