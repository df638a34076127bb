//! Positioner sweep.
//!
//! Tracked-ray positioners stand on a floor cluttered with boxes and spheres and turn in place,
//! so every step each one casts, hits (or misses) and rewrites its decal's transform.

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rusty_decals::prelude::*;

use crate::scenarios::Scenario;

const MARKER: TemplateId = TemplateId(0);

#[derive(Debug, Clone)]
pub struct PositionerConfig {
    pub positioner_count: usize,
    /// Boxes and spheres scattered over the floor.
    pub obstacle_count: usize,
    /// Half the side of the square the scene spans.
    pub extent: f32,
    pub step_delta: Duration,
    pub seed: u64,
}

impl Default for PositionerConfig {
    fn default() -> Self {
        Self {
            positioner_count: 1_000,
            obstacle_count: 200,
            extent: 50.0,
            step_delta: Duration::from_micros(16_667),
            seed: 12345,
        }
    }
}

struct Turret {
    positioner: Positioner<TrackedRay>,
    base: Pose,
    /// Radians per second.
    turn_rate: f32,
}

pub struct PositionerScenario {
    config: PositionerConfig,
    pool: MemoryPool,
    scene: Shapes,
    turrets: Vec<Turret>,
    time: Time,
    hits: u64,
    misses: u64,
}

impl PositionerScenario {
    pub fn new() -> Self {
        Self::with_config(PositionerConfig::default())
    }

    pub fn with_config(config: PositionerConfig) -> Self {
        Self {
            config,
            pool: MemoryPool::new(),
            scene: Shapes::new(),
            turrets: Vec::new(),
            time: Time::default(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn pool(&self) -> &MemoryPool {
        &self.pool
    }

    pub fn scene(&self) -> &Shapes {
        &self.scene
    }

    /// Valid and invalid placements since setup.
    pub fn hits(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    fn build_scene(&mut self, rng: &mut ChaCha8Rng) {
        let extent = self.config.extent;
        self.scene = Shapes::new().with(Shape::plane(Vec3::ZERO, Vec3::Y), LayerMask::ALL);
        for index in 0..self.config.obstacle_count {
            let center = Vec3::new(
                rng.gen_range(-extent..extent),
                rng.gen_range(0.5..3.0),
                rng.gen_range(-extent..extent),
            );
            let shape = if index % 2 == 0 {
                Shape::sphere(center, rng.gen_range(0.5..2.0))
            } else {
                Shape::cuboid(center, Vec3::splat(rng.gen_range(0.5..2.0)))
            };
            self.scene.push(shape, LayerMask::ALL);
        }
    }
}

impl Default for PositionerScenario {
    fn default() -> Self {
        Self::new()
    }
}

impl Scenario for PositionerScenario {
    fn name(&self) -> &'static str {
        "positioners"
    }

    fn description(&self) -> &'static str {
        "Tracked-ray positioners sweeping over a cluttered scene"
    }

    fn decal_count(&self) -> usize {
        self.config.positioner_count
    }

    fn setup(&mut self) -> Result<()> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        self.build_scene(&mut rng);

        let extent = self.config.extent;
        let settings = PositionerSettings {
            template: Some(MARKER),
            ..Default::default()
        };
        self.turrets.reserve(self.config.positioner_count);
        for _ in 0..self.config.positioner_count {
            let position = Vec3::new(
                rng.gen_range(-extent..extent),
                rng.gen_range(2.0..8.0),
                rng.gen_range(-extent..extent),
            );
            let rotation = Quat::from_rotation_y(rng.gen_range(0.0..std::f32::consts::TAU))
                * Quat::from_rotation_x(rng.gen_range(-1.2..-0.4));
            let base = Pose::new(position, rotation);
            let mut positioner = Positioner::new(
                settings,
                TrackedRay {
                    cast_length: 40.0,
                    ..TrackedRay::new(base)
                },
            );
            positioner.enable(&mut self.pool, None)?;
            self.turrets.push(Turret {
                positioner,
                base,
                turn_rate: rng.gen_range(-1.0..1.0),
            });
        }
        Ok(())
    }

    fn update(&mut self) -> Result<()> {
        self.time.advance(self.config.step_delta);
        let elapsed = self.time.elapsed.as_secs_f32();
        for turret in &mut self.turrets {
            let turn = Quat::from_rotation_y(turret.turn_rate * elapsed);
            turret.positioner.source_mut().target =
                Pose::new(turret.base.translation, turn * turret.base.rotation);
            if turret.positioner.tick(&self.scene, &mut self.pool, None)?.valid {
                self.hits += 1;
            } else {
                self.misses += 1;
            }
        }
        Ok(())
    }

    fn teardown(&mut self) -> Result<()> {
        for mut turret in self.turrets.drain(..) {
            turret.positioner.disable(&mut self.pool, None)?;
            if let Some(handle) = turret.positioner.active() {
                self.pool.release(handle)?;
            }
        }
        Ok(())
    }
}
