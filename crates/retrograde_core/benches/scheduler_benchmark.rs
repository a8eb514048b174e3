//! # Scheduler Benchmark
//!
//! Frame cost with a full stage of entities:
//! - A normal pass over ~2000 bounds-gated entities
//! - Create/destroy churn through the temporary ring
//! - Group and class iteration over a full stage
//!
//! Run with: `cargo bench --package retrograde_core`

// Benchmarks don't need docs
#![allow(missing_docs)]

use bytemuck::{Pod, Zeroable};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use retrograde_core::{
    ActiveFlag, ClassId, CreatePolicy, ForeachCursor, GroupId, ObjectCallbacks, Payload, Vector2, World,
    WorldConfig,
};

/// Entities placed for the pass benchmarks.
const STAGE_ENTITIES: usize = 2000;

#[derive(Clone, Copy, Default, Pod, Zeroable)]
#[repr(C)]
struct Mover {
    velocity: Vector2,
    timer: i32,
}

impl Payload for Mover {}

fn mover_class(world: &mut World) -> ClassId {
    world.register_class::<Mover, ()>(
        "Mover",
        ObjectCallbacks::new()
            .create(|world, slot, _| {
                let (entity, mover) = world.entity_and_payload_mut::<Mover>(slot).unwrap();
                entity.active = ActiveFlag::Bounds;
                entity.visible = true;
                mover.velocity = Vector2::new(0x8000, 0);
            })
            .update(|world, slot| {
                let (entity, mover) = world.entity_and_payload_mut::<Mover>(slot).unwrap();
                entity.position += mover.velocity;
                mover.timer = mover.timer.wrapping_add(1);
            }),
    )
}

/// Spreads entities over a stage four screens wide, so some fall out of bounds.
fn populated_world(count: usize) -> (World, ClassId) {
    let mut world = World::new(&WorldConfig::default());
    let mover = mover_class(&mut world);
    for i in 0..count {
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let x = (i % 1696) as i32 - 848;
        world.create_entity_with(
            CreatePolicy::SceneFirst,
            mover,
            None,
            Vector2::from_pixels(x, 0),
        );
    }
    (world, mover)
}

fn bench_process_objects(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_objects");

    for count in [500, STAGE_ENTITIES] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let (mut world, _) = populated_world(count);
            b.iter(|| {
                world.process_objects();
                black_box(world.frame())
            });
        });
    }

    group.finish();
}

fn bench_step(c: &mut Criterion) {
    let (mut world, _) = populated_world(STAGE_ENTITIES);
    c.bench_function("step_2000_with_draw", |b| {
        b.iter(|| {
            world.step();
            black_box(world.draw_list().screen(0).len())
        });
    });
}

fn bench_create_destroy_churn(c: &mut Criterion) {
    let (mut world, mover) = populated_world(STAGE_ENTITIES);
    c.bench_function("create_destroy_churn_64", |b| {
        b.iter(|| {
            let mut slots = [None; 64];
            for slot in &mut slots {
                *slot = Some(world.create_entity(mover, None, Vector2::ZERO));
            }
            for slot in slots.into_iter().flatten() {
                world.destroy_entity(black_box(slot));
            }
        });
    });
}

fn bench_group_iteration(c: &mut Criterion) {
    let (mut world, mover) = populated_world(STAGE_ENTITIES);
    world.process_objects();

    c.bench_function("get_active_entities_2000", |b| {
        b.iter(|| {
            let mut visited = 0;
            let mut cursor = ForeachCursor::new();
            while let Some(slot) = world.get_active_entities(GroupId::of_class(mover), &mut cursor) {
                visited += black_box(slot).index();
            }
            visited
        });
    });

    c.bench_function("get_entities_2000", |b| {
        b.iter(|| {
            let mut visited = 0;
            let mut cursor = ForeachCursor::new();
            while let Some(slot) = world.get_entities(mover, &mut cursor) {
                visited += black_box(slot).index();
            }
            visited
        });
    });
}

criterion_group!(
    benches,
    bench_process_objects,
    bench_step,
    bench_create_destroy_churn,
    bench_group_iteration,
);

criterion_main!(benches);
