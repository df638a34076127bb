//! Realistic decal workloads.
//!
//! - **Bullet holes**: thousands of decals, each with a fade and a cull spread over the tiers,
//!   respawned as soon as they are culled. Exercises the scheduler passes and command churn.
//! - **Positioners**: many tracked-ray positioners sweeping over a cluttered scene every step.
//!   Exercises ray casting and the placement math.

pub mod bullet_holes;
pub mod positioners;

use rusty_decals::Result;

pub use bullet_holes::{BulletHoleConfig, BulletHoleScenario};
pub use positioners::{PositionerConfig, PositionerScenario};

/// Common shape of a benchmark scenario.
pub trait Scenario {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Number of decals the scenario keeps alive.
    fn decal_count(&self) -> usize;

    /// Build the pool, the scene and the decals.
    fn setup(&mut self) -> Result<()>;

    /// Run one simulation step.
    fn update(&mut self) -> Result<()>;

    /// Give everything back.
    fn teardown(&mut self) -> Result<()>;
}
