//! Decal microbenchmarks using Criterion.
//!
//! These benchmarks measure individual operations in isolation:
//! - Registration and tier moves
//! - One every-step pass, and catch-up firing of a timed tier
//! - Fade sampling through the scheduler
//! - Ray casts and placement math

use std::time::Duration;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rusty_decals::placement::look_rotation;
use rusty_decals::prelude::*;

const STEP: Duration = Duration::from_micros(16_667);

/// Does nothing but read its context.
struct Noop(InstanceHandle);

impl Modifier for Noop {
    fn instance(&self) -> InstanceHandle {
        self.0
    }

    fn perform(&mut self, ctx: &mut Context<'_>) -> Result<()> {
        black_box(ctx.delta());
        Ok(())
    }
}

fn noop_scheduler(
    count: usize,
    tier: Tier,
    active: bool,
) -> (Scheduler, MemoryPool, Vec<ModifierKey>) {
    let mut pool = MemoryPool::new();
    let mut scheduler = Scheduler::new();
    let keys = (0..count)
        .map(|index| {
            let key = scheduler.insert(Noop(InstanceHandle::new(index as u32, 0)), tier);
            if active {
                scheduler.activate(key, &mut pool).unwrap();
            }
            key
        })
        .collect();
    (scheduler, pool, keys)
}

// =============================================================================
// Scheduler Benchmarks
// =============================================================================

fn bench_registration(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheduler/registration");

    for count in [100, 1_000, 10_000] {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("register_deregister", count), &count, |b, &n| {
            let (mut scheduler, _pool, keys) = noop_scheduler(n, Tier::EveryStep, false);
            b.iter(|| {
                for &key in &keys {
                    black_box(scheduler.register(key));
                }
                for &key in &keys {
                    black_box(scheduler.deregister(key));
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("set_tier", count), &count, |b, &n| {
            let (mut scheduler, _pool, keys) = noop_scheduler(n, Tier::EveryStep, true);
            b.iter(|| {
                for &key in &keys {
                    scheduler.set_tier(key, Tier::TenHz);
                }
                for &key in &keys {
                    scheduler.set_tier(key, Tier::EveryStep);
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("insert_remove", count), &count, |b, &n| {
            let mut pool = MemoryPool::new();
            let mut scheduler = Scheduler::new();
            let mut keys = Vec::with_capacity(n);
            b.iter(|| {
                for index in 0..n {
                    let noop = Noop(InstanceHandle::new(index as u32, 0));
                    keys.push(scheduler.spawn(noop, Tier::OneHz, &mut pool).unwrap());
                }
                for key in keys.drain(..) {
                    black_box(scheduler.remove(key));
                }
            });
        });
    }

    group.finish();
}

fn bench_passes(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheduler/passes");

    for count in [1_000, 10_000, 100_000] {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("every_step", count), &count, |b, &n| {
            let (mut scheduler, mut pool, _keys) = noop_scheduler(n, Tier::EveryStep, true);
            b.iter(|| black_box(scheduler.step(STEP, &mut pool).unwrap()));
        });

        // one second of accumulated time fires the ten hertz pass ten times
        group.bench_with_input(BenchmarkId::new("ten_hz_catch_up", count), &count, |b, &n| {
            let (mut scheduler, mut pool, _keys) = noop_scheduler(n, Tier::TenHz, true);
            b.iter(|| black_box(scheduler.advance(Duration::from_secs(1), &mut pool).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("idle_advance", count), &count, |b, &n| {
            let (mut scheduler, mut pool, _keys) = noop_scheduler(n, Tier::OneHz, true);
            b.iter(|| black_box(scheduler.advance(Duration::ZERO, &mut pool).unwrap()));
        });
    }

    group.finish();
}

fn bench_fade(c: &mut Criterion) {
    let mut group = c.benchmark_group("modifiers/fade");

    for count in [1_000, 10_000] {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("every_step", count), &count, |b, &n| {
            let mut pool = MemoryPool::new();
            let mut scheduler = Scheduler::new();
            let settings = FadeSettings {
                curve: Curve::new([(0.0, 0.0), (0.5, 1.0), (1.5, 0.2), (2.0, 0.0)]),
                wrap: Wrap::PingPong,
                property: Property::Opacity,
            };
            for _ in 0..n {
                let instance = pool.acquire(TemplateId(0)).unwrap();
                scheduler
                    .spawn(Fade::new(instance, settings.clone()), Tier::EveryStep, &mut pool)
                    .unwrap();
            }
            b.iter(|| black_box(scheduler.step(STEP, &mut pool).unwrap()));
        });
    }

    group.finish();
}

// =============================================================================
// Placement Benchmarks
// =============================================================================

fn scattered_scene(obstacles: usize) -> Shapes {
    let mut scene = Shapes::new().with(Shape::plane(Vec3::ZERO, Vec3::Y), LayerMask::ALL);
    for index in 0..obstacles {
        let angle = index as f32 * 0.7;
        let center = Vec3::new(angle.cos() * 20.0, 1.0, angle.sin() * 20.0);
        scene.push(Shape::sphere(center, 0.8), LayerMask::ALL);
    }
    scene
}

fn bench_placement(c: &mut Criterion) {
    let mut group = c.benchmark_group("placement");

    for obstacles in [10, 100, 1_000] {
        let scene = scattered_scene(obstacles);
        let ray = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.6, -0.4, 0.2)).unwrap();

        group.bench_with_input(BenchmarkId::new("cast", obstacles), &scene, |b, scene| {
            b.iter(|| black_box(scene.cast(black_box(ray), 100.0, LayerMask::ALL)));
        });

        group.bench_with_input(BenchmarkId::new("reproject", obstacles), &scene, |b, scene| {
            let mut pool = MemoryPool::new();
            let mut positioner = Positioner::new(
                PositionerSettings {
                    template: Some(TemplateId(0)),
                    ..Default::default()
                },
                TrackedRay::default(),
            );
            b.iter(|| {
                black_box(
                    positioner
                        .reproject(ray, 100.0, Vec3::Y, scene, &mut pool, None)
                        .unwrap(),
                )
            });
        });
    }

    group.bench_function("look_rotation", |b| {
        let normal = Vec3::new(0.3, 0.9, -0.2).normalize();
        b.iter(|| black_box(look_rotation(black_box(-normal), black_box(Vec3::Y))));
    });

    group.finish();
}

// =============================================================================
// Criterion Configuration
// =============================================================================

criterion_group!(
    benches,
    bench_registration,
    bench_passes,
    bench_fade,
    bench_placement,
);

criterion_main!(benches);
