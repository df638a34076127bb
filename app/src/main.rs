//! Headless decal demo.
//!
//! A muzzle sweeps across a small room shooting bullet holes into whatever it hits, while a
//! crosshair follows the muzzle and a cursor marker follows a pointer circling the screen. Every
//! bullet hole carries a fade and a cull, driven by one scheduler. Log records are captured
//! through a channel and printed once per step.

use std::time::Duration;

use log::{LevelFilter, info, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rusty_decals::core::log::ChannelLogger;
use rusty_decals::prelude::*;

const BULLET_HOLE: TemplateId = TemplateId(0);
const CROSSHAIR: TemplateId = TemplateId(1);
const CURSOR_MARK: TemplateId = TemplateId(2);

const WORLD: LayerMask = LayerMask::layer(0);
const GLASS: LayerMask = LayerMask::layer(1);

/// Knobs of the demo run.
#[derive(Debug, Clone)]
struct DemoConfig {
    steps: u64,
    step_delta: Duration,
    seed: u64,
    shots_per_second: u32,
    /// Shot spread around the muzzle direction, in radians.
    spread: f32,
    hole_lifetime: Duration,
    /// How long before the end of its life a hole starts fading out.
    hole_fade: Duration,
    /// Pool capacity, positioner instances included.
    pool_capacity: usize,
    log_level: LevelFilter,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            steps: 600,
            step_delta: Duration::from_millis(16),
            seed: 7,
            shots_per_second: 8,
            spread: 0.08,
            hole_lifetime: Duration::from_secs(4),
            hole_fade: Duration::from_millis(1_500),
            pool_capacity: 64,
            log_level: LevelFilter::Info,
        }
    }
}

/// A pointer moving around the screen on its own.
struct CirclingMouse {
    camera: Camera,
    cursor: Vec2,
}

impl View for CirclingMouse {
    fn cursor(&self) -> Option<Vec2> {
        Some(self.cursor)
    }

    fn primary_camera(&self) -> Option<Camera> {
        Some(self.camera)
    }
}

struct BulletHole {
    instance: InstanceHandle,
    fade: ModifierKey,
    cull: ModifierKey,
}

struct Demo {
    config: DemoConfig,
    rng: ChaCha8Rng,
    pool: MemoryPool,
    scene: Shapes,
    scheduler: Scheduler,
    crosshair: Positioner<TrackedRay>,
    cursor: Positioner<PointerRay<CirclingMouse>>,
    trigger: Interval,
    report: Interval,
    holes: Vec<BulletHole>,
    shots: u64,
    misses: u64,
}

fn room() -> Shapes {
    Shapes::new()
        .with(Shape::plane(Vec3::ZERO, Vec3::Y), WORLD)
        .with(Shape::plane(Vec3::new(0.0, 0.0, -8.0), Vec3::Z), WORLD)
        .with(Shape::plane(Vec3::new(-6.0, 0.0, 0.0), Vec3::X), WORLD)
        .with(Shape::plane(Vec3::new(6.0, 0.0, 0.0), Vec3::NEG_X), WORLD)
        .with(Shape::cuboid(Vec3::new(-2.0, 1.0, -4.0), Vec3::splat(1.0)), WORLD)
        .with(Shape::sphere(Vec3::new(2.5, 1.0, -5.0), 1.0), WORLD)
        // a pane of glass the shots go through
        .with(Shape::cuboid(Vec3::new(0.0, 1.5, -2.0), Vec3::new(3.0, 1.5, 0.05)), GLASS)
}

impl Demo {
    fn new(config: DemoConfig, scheduler: Scheduler) -> Result<Self> {
        let mut pool = MemoryPool::with_capacity(config.pool_capacity);

        let mut crosshair = Positioner::new(
            PositionerSettings {
                template: Some(CROSSHAIR),
                layers: WORLD,
                ..Default::default()
            },
            TrackedRay {
                offset: Vec3::new(0.0, 0.0, -0.5),
                cast_length: 30.0,
                ..TrackedRay::new(Demo::muzzle(Duration::ZERO))
            },
        );
        crosshair.enable(&mut pool, None)?;

        let camera = Camera {
            pose: Pose::looking_to(Vec3::new(0.0, 6.0, 6.0), Vec3::new(0.0, -6.0, -10.0), Vec3::Y),
            ..Default::default()
        };
        let mut cursor = Positioner::new(
            PositionerSettings {
                template: Some(CURSOR_MARK),
                layers: WORLD.with(GLASS),
                always_visible: true,
            },
            PointerRay::new(CirclingMouse {
                camera,
                cursor: camera.viewport * 0.5,
            }),
        );
        cursor.enable(&mut pool, None)?;

        let trigger = Interval::new(Duration::from_secs(1) / config.shots_per_second.max(1));
        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            pool,
            scene: room(),
            scheduler,
            crosshair,
            cursor,
            trigger,
            report: Interval::new(Duration::from_secs(1)),
            holes: Vec::new(),
            shots: 0,
            misses: 0,
        })
    }

    /// Muzzle pose at `elapsed`: chest height, sweeping left and right across the room.
    fn muzzle(elapsed: Duration) -> Pose {
        let yaw = (elapsed.as_secs_f32() * 0.6).sin() * 0.9;
        let pitch = -0.15 + (elapsed.as_secs_f32() * 1.3).sin() * 0.1;
        let rotation = Quat::from_rotation_y(yaw) * Quat::from_rotation_x(pitch);
        Pose::new(Vec3::new(0.0, 1.5, 4.0), rotation)
    }

    fn step(&mut self, time: &Time) -> Result<()> {
        self.scheduler.update(time, &mut self.pool)?;

        let muzzle = Demo::muzzle(time.elapsed);
        self.crosshair.source_mut().target = muzzle;
        self.crosshair.tick(&self.scene, &mut self.pool, Some(&mut self.scheduler))?;

        let angle = time.elapsed.as_secs_f32();
        let mouse = &mut self.cursor.source_mut().view;
        mouse.cursor = mouse.camera.viewport * 0.5 + Vec2::new(angle.cos(), angle.sin()) * 250.0;
        self.cursor.tick(&self.scene, &mut self.pool, Some(&mut self.scheduler))?;

        self.trigger.accumulate(time.delta);
        while self.trigger.consume() {
            self.fire(muzzle)?;
        }
        self.sweep();

        self.report.accumulate(time.delta);
        while self.report.consume() {
            info!(
                "t={:.1}s shots={} misses={} holes={} visible={} modifiers={} (step {}, ten hz {}, one hz {})",
                time.elapsed.as_secs_f32(),
                self.shots,
                self.misses,
                self.holes.len(),
                self.pool.visible(),
                self.scheduler.len(),
                self.scheduler.roster_len(Tier::EveryStep),
                self.scheduler.roster_len(Tier::TenHz),
                self.scheduler.roster_len(Tier::OneHz),
            );
        }
        Ok(())
    }

    fn fire(&mut self, muzzle: Pose) -> Result<()> {
        self.shots += 1;
        let spread = self.config.spread;
        let kick = Quat::from_rotation_y(self.rng.gen_range(-spread..=spread))
            * Quat::from_rotation_x(self.rng.gen_range(-spread..=spread));
        let Some(ray) = Ray::new(muzzle.translation, muzzle.rotation * kick * Vec3::NEG_Z) else {
            return Ok(());
        };
        let Some(hit) = self.scene.cast(ray, 50.0, WORLD) else {
            self.misses += 1;
            return Ok(());
        };

        let instance = match self.pool.acquire(BULLET_HOLE) {
            Ok(instance) => instance,
            Err(Error::PoolExhausted(template)) => {
                warn!("No free {template:?} left, dropping shot {}", self.shots);
                return Ok(());
            }
            Err(error) => return Err(error),
        };
        let placement = Placement::from_hit(&hit, muzzle.up());
        self.pool.set_transform(instance, placement.position, placement.orientation)?;
        self.pool.set_active(instance, true)?;

        let lifetime = self.config.hole_lifetime.as_secs_f32();
        let fade_start = (lifetime - self.config.hole_fade.as_secs_f32()).max(0.0);
        let fade = self.scheduler.spawn(
            Fade::new(
                instance,
                FadeSettings {
                    curve: Curve::new([(0.0, 1.0), (fade_start, 1.0), (lifetime, 0.0)]),
                    ..Default::default()
                },
            ),
            Tier::TenHz,
            &mut self.pool,
        )?;
        let cull = self.scheduler.spawn(
            Cull::new(
                instance,
                CullSettings {
                    lifetime: self.config.hole_lifetime,
                    action: CullAction::Release,
                },
            ),
            Tier::OneHz,
            &mut self.pool,
        )?;
        self.holes.push(BulletHole { instance, fade, cull });
        Ok(())
    }

    /// Drop the modifiers of holes whose instance went back to the pool.
    fn sweep(&mut self) {
        self.holes.retain(|hole| {
            let alive = self.pool.get(hole.instance).is_some();
            if !alive {
                self.scheduler.remove(hole.fade);
                self.scheduler.remove(hole.cull);
            }
            alive
        });
    }
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let config = DemoConfig::default();

    let (logger, logs) = ChannelLogger::with_receiver(config.log_level);
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(config.log_level);

    let stop = Cancel::new();
    let sim = SimLoop {
        pacing: Pacing::Simulated {
            delta: config.step_delta,
        },
        max_steps: Some(config.steps),
    };
    let demo = Demo::new(config, Scheduler::with_cancel(stop.clone()))?;

    let mut demo = sim.run(
        demo,
        |time, demo| {
            let stepped = demo.step(time);
            for line in logs.try_iter() {
                println!("{line}");
            }
            stepped
        },
        &stop,
    )?;

    demo.scheduler.shutdown();
    info!(
        "Done: {} shots, {} holes still on the walls, {} instances live",
        demo.shots,
        demo.holes.len(),
        demo.pool.live()
    );
    for line in logs.try_iter() {
        println!("{line}");
    }
    Ok(())
}
