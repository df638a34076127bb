//! Bullet hole churn.
//!
//! Every hole fades out over its lifetime (mostly on `TenHz`, a share on `EveryStep`) and is
//! released by a `OneHz` cull. Culled holes are replaced right away, so the population stays at
//! `hole_count` and the scheduler sees a steady stream of inserts and removals.

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rusty_decals::prelude::*;

use crate::scenarios::Scenario;

const BULLET_HOLE: TemplateId = TemplateId(0);

#[derive(Debug, Clone)]
pub struct BulletHoleConfig {
    pub hole_count: usize,
    pub step_delta: Duration,
    /// Lifetimes are drawn uniformly from this range.
    pub min_lifetime: Duration,
    pub max_lifetime: Duration,
    /// Fraction of fades scheduled on `EveryStep` instead of `TenHz`.
    pub every_step_share: f64,
    pub seed: u64,
}

impl Default for BulletHoleConfig {
    fn default() -> Self {
        Self {
            hole_count: 10_000,
            step_delta: Duration::from_micros(16_667),
            min_lifetime: Duration::from_secs(1),
            max_lifetime: Duration::from_secs(5),
            every_step_share: 0.1,
            seed: 12345,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Hole {
    instance: InstanceHandle,
    fade: ModifierKey,
    cull: ModifierKey,
}

pub struct BulletHoleScenario {
    config: BulletHoleConfig,
    rng: ChaCha8Rng,
    pool: MemoryPool,
    scheduler: Scheduler,
    time: Time,
    holes: Vec<Hole>,
    respawned: u64,
}

impl BulletHoleScenario {
    pub fn new() -> Self {
        Self::with_config(BulletHoleConfig::default())
    }

    pub fn with_config(config: BulletHoleConfig) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            pool: MemoryPool::new(),
            scheduler: Scheduler::new(),
            time: Time::default(),
            holes: Vec::new(),
            respawned: 0,
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn pool(&self) -> &MemoryPool {
        &self.pool
    }

    /// Holes replaced after being culled since setup.
    pub fn respawned(&self) -> u64 {
        self.respawned
    }

    fn spawn_hole(&mut self) -> Result<Hole> {
        let instance = self.pool.acquire(BULLET_HOLE)?;
        let position = Vec3::new(
            self.rng.gen_range(-50.0..50.0),
            self.rng.gen_range(0.0..10.0),
            self.rng.gen_range(-50.0..50.0),
        );
        self.pool.set_transform(instance, position, Quat::IDENTITY)?;
        self.pool.set_active(instance, true)?;

        let lifetime = self.rng.gen_range(self.config.min_lifetime..=self.config.max_lifetime);
        let fade_tier = if self.rng.gen_bool(self.config.every_step_share.clamp(0.0, 1.0)) {
            Tier::EveryStep
        } else {
            Tier::TenHz
        };
        let fade = Fade::new(
            instance,
            FadeSettings {
                curve: Curve::linear(1.0, 0.0, lifetime.as_secs_f32()),
                ..Default::default()
            },
        );
        let cull = Cull::new(
            instance,
            CullSettings {
                lifetime,
                action: CullAction::Release,
            },
        );
        Ok(Hole {
            instance,
            fade: self.scheduler.spawn(fade, fade_tier, &mut self.pool)?,
            cull: self.scheduler.spawn(cull, Tier::OneHz, &mut self.pool)?,
        })
    }

    fn forget(&mut self, hole: Hole) {
        self.scheduler.remove(hole.fade);
        self.scheduler.remove(hole.cull);
    }
}

impl Default for BulletHoleScenario {
    fn default() -> Self {
        Self::new()
    }
}

impl Scenario for BulletHoleScenario {
    fn name(&self) -> &'static str {
        "bullet_holes"
    }

    fn description(&self) -> &'static str {
        "Fading, self-culling decals respawned as they expire"
    }

    fn decal_count(&self) -> usize {
        self.config.hole_count
    }

    fn setup(&mut self) -> Result<()> {
        self.holes.reserve(self.config.hole_count);
        for _ in 0..self.config.hole_count {
            let hole = self.spawn_hole()?;
            self.holes.push(hole);
        }
        Ok(())
    }

    fn update(&mut self) -> Result<()> {
        self.time.advance(self.config.step_delta);
        self.scheduler.update(&self.time, &mut self.pool)?;

        for index in 0..self.holes.len() {
            let hole = self.holes[index];
            if self.pool.get(hole.instance).is_none() {
                self.forget(hole);
                self.holes[index] = self.spawn_hole()?;
                self.respawned += 1;
            }
        }
        Ok(())
    }

    fn teardown(&mut self) -> Result<()> {
        while let Some(hole) = self.holes.pop() {
            self.forget(hole);
            if self.pool.get(hole.instance).is_some() {
                self.pool.release(hole.instance)?;
            }
        }
        Ok(())
    }
}
