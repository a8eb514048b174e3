//! Integration test for stage start, in-pass reclassification and drawing.

use bytemuck::{Pod, Zeroable};
use parking_lot::Mutex;
use retrograde_core::{
    editable_var, ActiveFlag, ClassId, CreatePolicy, ForeachCursor, GroupId, ObjectCallbacks,
    Payload, SlotId, VarType, Vector2, World, WorldConfig,
};
use std::any::Any;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
struct Spark {
    lifetime: i32,
    spin: i32,
}

impl Payload for Spark {}

#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
struct SparkStatics {
    spawned: u32,
    stage_loads: u32,
}

fn world_with_screens(screen_count: usize) -> World {
    World::new(&WorldConfig {
        screen_count,
        strict_foreach: true,
        ..WorldConfig::default()
    })
}

/// A spark that burns down and retires its own slot.
fn register_spark(world: &mut World) -> ClassId {
    world.register_class::<Spark, SparkStatics>(
        "Spark",
        ObjectCallbacks::new()
            .stage_load(|world| {
                let spark = world.get_object_by_name("Spark");
                world.static_vars_mut::<SparkStatics>(spark).unwrap().stage_loads += 1;
            })
            .create(|world, slot, data| {
                let lifetime = data.and_then(|d| d.downcast_ref::<i32>()).copied().unwrap_or(2);
                world.payload_mut::<Spark>(slot).unwrap().lifetime = lifetime;
                let entity = world.entity_mut(slot);
                entity.active = ActiveFlag::Normal;
                entity.visible = true;

                let spark = world.get_object_by_name("Spark");
                world.static_vars_mut::<SparkStatics>(spark).unwrap().spawned += 1;
            })
            .update(|world, slot| {
                let spark = world.payload_mut::<Spark>(slot).unwrap();
                spark.lifetime -= 1;
                if spark.lifetime <= 0 {
                    world.destroy_entity(slot);
                }
            })
            .serialize(|world| {
                editable_var!(world, Spark, VarType::I32, lifetime);
                editable_var!(world, Spark, VarType::I32, spin);
            }),
    )
}

#[test]
fn test_entity_retires_itself() {
    let mut world = world_with_screens(1);
    let spark = register_spark(&mut world);
    let slot = world.create_entity(spark, Some(&2_i32 as &dyn Any), Vector2::ZERO);

    world.process_objects();
    assert_eq!(world.entity(slot).class_id(), spark);
    assert_eq!(world.get_entity_count(spark, true), 1);

    world.process_objects();
    assert!(world.entity(slot).is_free());
    assert_eq!(world.get_entity_count(spark, false), 0);
    assert_eq!(world.get_entity_count(spark, true), 0);
}

#[test]
fn test_entity_changes_class_mid_pass() {
    let mut world = world_with_screens(1);
    let spark = register_spark(&mut world);
    let ember = world.register_class::<Spark, ()>(
        "Ember",
        ObjectCallbacks::new().update(|world, slot| {
            let spark = world.get_object_by_name("Spark");
            world.reset_entity(slot, spark);
            world.entity_mut(slot).active = ActiveFlag::Normal;
            world.payload_mut::<Spark>(slot).unwrap().lifetime = 5;
        }),
    );

    let slot = world.create_entity(ember, None, Vector2::ZERO);
    world.process_objects();

    // The new class's update does not run in the pass that created it.
    assert_eq!(world.entity(slot).class_id(), spark);
    assert_eq!(world.payload::<Spark>(slot).unwrap().lifetime, 5);
    assert_eq!(world.get_entity_count(ember, false), 0);
    assert_eq!(world.get_entity_count(spark, false), 1);

    world.process_objects();
    assert_eq!(world.payload::<Spark>(slot).unwrap().lifetime, 4);
}

#[test]
fn test_init_objects_runs_placed_creates() {
    let mut world = world_with_screens(1);
    let spark = register_spark(&mut world);

    let placed = [SlotId::clamped(300), SlotId::clamped(120)];
    for slot in placed {
        world.place_entity(slot, spark, Vector2::from_pixels(16, 16));
        assert_eq!(world.entity(slot).active, ActiveFlag::Never);
    }
    let statics = world.static_vars_mut::<SparkStatics>(spark).unwrap();
    statics.spawned = 99;

    world.init_objects();

    let statics = world.static_vars::<SparkStatics>(spark).unwrap();
    assert_eq!(statics.stage_loads, 1);
    assert_eq!(statics.spawned, 2);
    for slot in placed {
        assert_eq!(world.entity(slot).active, ActiveFlag::Normal);
        assert_eq!(world.payload::<Spark>(slot).unwrap().lifetime, 2);
    }

    // Placed entities join the groups after their first pass.
    assert_eq!(world.get_entity_count(spark, true), 0);
    world.process_objects();
    assert_eq!(world.get_entity_count(spark, true), 2);

    // A second stage start does not create them again.
    world.init_objects();
    assert_eq!(world.static_vars::<SparkStatics>(spark).unwrap().spawned, 0);
}

#[test]
fn test_clear_stage_objects() {
    let mut world = world_with_screens(1);
    let spark = register_spark(&mut world);
    let player = SlotId::clamped(0);
    world.place_entity(player, spark, Vector2::ZERO);
    for _ in 0..10 {
        world.create_entity(spark, None, Vector2::ZERO);
    }
    world.place_entity(SlotId::clamped(500), spark, Vector2::ZERO);

    world.clear_stage_objects();
    assert_eq!(world.get_entity_count(spark, false), 1);
    assert_eq!(world.entity(player).class_id(), spark);

    world.init_objects();
    assert_eq!(world.entity(player).active, ActiveFlag::Normal);
    assert!(world.entity(SlotId::clamped(500)).is_free());
}

#[test]
fn test_reused_placed_slot_is_created_once() {
    let mut world = world_with_screens(1);
    let spark = register_spark(&mut world);

    let placed = SlotId::clamped(64);
    world.place_entity(placed, spark, Vector2::ZERO);
    world.destroy_entity(placed);
    let reused = world.create_entity_with(CreatePolicy::SceneFirst, spark, None, Vector2::ZERO);
    assert_eq!(reused, placed);
    assert_eq!(world.static_vars::<SparkStatics>(spark).unwrap().spawned, 1);

    // Placed, then reset in place: the placement's create is cancelled.
    let reset = SlotId::clamped(70);
    world.place_entity(reset, spark, Vector2::ZERO);
    world.reset_entity(reset, spark);

    world.init_objects();
    let statics = world.static_vars::<SparkStatics>(spark).unwrap();
    assert_eq!(statics.stage_loads, 1);
    assert_eq!(statics.spawned, 0);
    assert_eq!(world.entity(reset).active, ActiveFlag::Never);
}

#[test]
fn test_moved_placed_entity_is_created_at_its_new_slot() {
    let mut world = world_with_screens(1);
    let spark = register_spark(&mut world);

    let from = SlotId::clamped(80);
    let to = SlotId::clamped(90);
    world.place_entity(from, spark, Vector2::ZERO);
    world.copy_entity(to, from, true);

    world.init_objects();
    assert_eq!(world.static_vars::<SparkStatics>(spark).unwrap().spawned, 1);
    assert_eq!(world.entity(to).active, ActiveFlag::Normal);
    assert!(world.entity(from).is_free());
}

fn walk_group(world: &mut World, group: GroupId) -> Vec<SlotId> {
    let mut slots = Vec::new();
    let mut cursor = ForeachCursor::new();
    while let Some(slot) = world.get_active_entities(group, &mut cursor) {
        slots.push(slot);
    }
    slots
}

#[test]
fn test_clear_stage_objects_keeps_reserved_group_members() {
    let mut world = world_with_screens(1);
    let spark = register_spark(&mut world);
    let ember = world.register_class::<Spark, ()>("Ember", ObjectCallbacks::new());

    let player = SlotId::clamped(0);
    world.place_entity(player, spark, Vector2::ZERO);
    world.init_objects();
    world.entity_mut(player).group = GroupId::CUSTOM0.raw();

    let scene_spark = world.create_entity_with(
        CreatePolicy::SceneFirst,
        spark,
        Some(&10_i32 as &dyn Any),
        Vector2::ZERO,
    );
    world.entity_mut(scene_spark).group = GroupId::CUSTOM0.raw();
    let temp_ember = world.create_entity(ember, None, Vector2::ZERO);

    world.process_objects();
    assert_eq!(walk_group(&mut world, GroupId::ALL), vec![player, scene_spark, temp_ember]);
    assert_eq!(walk_group(&mut world, GroupId::CUSTOM0), vec![player, scene_spark]);
    assert_eq!(world.get_entity_count(spark, true), 2);
    assert_eq!(world.get_entity_count(ember, true), 1);

    world.clear_stage_objects();
    assert_eq!(walk_group(&mut world, GroupId::ALL), vec![player]);
    assert_eq!(walk_group(&mut world, GroupId::CUSTOM0), vec![player]);
    assert_eq!(walk_group(&mut world, GroupId::of_class(spark)), vec![player]);
    assert!(walk_group(&mut world, GroupId::of_class(ember)).is_empty());
    assert_eq!(world.get_entity_count(spark, true), 1);
    assert_eq!(world.get_entity_count(ember, true), 0);
}

#[test]
fn test_draw_order_and_screens() {
    let drawn = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&drawn);

    let mut world = world_with_screens(2);
    let glyph = world.register_object(
        "Glyph",
        0,
        0,
        ObjectCallbacks::new().draw(move |world, slot| {
            log.lock().push((world.current_screen(), slot));
        }),
    );

    let back = world.create_entity(glyph, None, Vector2::ZERO);
    let front = world.create_entity(glyph, None, Vector2::ZERO);
    let middle = world.create_entity(glyph, None, Vector2::ZERO);
    let hidden = world.create_entity(glyph, None, Vector2::ZERO);
    world.entity_mut(back).draw_order = 1;
    world.entity_mut(front).draw_order = 6;
    world.entity_mut(middle).draw_order = 3;
    world.entity_mut(middle).active_screens = 0b01;
    world.entity_mut(hidden).visible = false;

    world.step();

    let drawn = drawn.lock().clone();
    assert_eq!(
        drawn,
        vec![(0, back), (0, middle), (0, front), (1, back), (1, front)]
    );
    assert_eq!(world.current_screen(), 0);
    assert_eq!(world.draw_list().layer(1, 6).collect::<Vec<_>>(), vec![front]);
}

#[test]
fn test_draw_skips_entities_hidden_mid_draw() {
    let drawn = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&drawn);

    let mut world = world_with_screens(1);
    let glyph = world.register_object(
        "Glyph",
        0,
        0,
        ObjectCallbacks::new().draw(move |world, slot| {
            log.lock().push(slot);
            let next = SlotId::clamped(slot.index() + 1);
            world.entity_mut(next).visible = false;
        }),
    );
    let first = world.create_entity(glyph, None, Vector2::ZERO);
    let second = world.create_entity(glyph, None, Vector2::ZERO);
    assert_eq!(second.index(), first.index() + 1);

    world.step();
    assert_eq!(*drawn.lock(), vec![first]);
}

#[test]
fn test_paused_step_keeps_drawing() {
    let drawn = Arc::new(AtomicU32::new(0));
    let log = Arc::clone(&drawn);

    let mut world = world_with_screens(1);
    let glyph = world.register_object(
        "Glyph",
        0,
        0,
        ObjectCallbacks::new().draw(move |_, _| {
            log.fetch_add(1, Ordering::Relaxed);
        }),
    );
    world.create_entity(glyph, None, Vector2::ZERO);

    world.step();
    world.set_paused(true);
    world.step();
    assert_eq!(drawn.load(Ordering::Relaxed), 2);
}

#[test]
fn test_editable_vars_by_field() {
    let mut world = world_with_screens(1);
    let spark = register_spark(&mut world);

    let vars = world.load_editable_vars(spark).to_vec();
    assert_eq!(vars.len(), 2);
    assert_eq!(vars[0].offset, 0);
    assert_eq!(vars[1].offset, 4);
    assert_eq!(vars[1].var_type, VarType::I32);

    let child = world.register_object("SparkChild", 8, 0, ObjectCallbacks::new().inherit(spark));
    assert_eq!(world.load_editable_vars(child).len(), 2);
}
