//! Timed per-instance effects and the tiered scheduler that drives them.
//!
//! A [`Modifier`] is a small behavior bound to one decal instance (fade it out, cull it after a
//! while). Modifiers never own a timer. Each one is assigned a [`Tier`] and the [`Scheduler`]
//! calls [`Modifier::perform`] on every registered modifier at that tier's cadence:
//!
//! ```text
//! Scheduler
//!   ├── EveryStep ─► [m3, m7, ...]   once per simulation step (`Scheduler::step`)
//!   ├── TenHz     ─► [m1, ...]       every 100ms accumulated (`Scheduler::advance`)
//!   └── OneHz     ─► [m2, m5, ...]   every 1s accumulated (`Scheduler::advance`)
//! ```
//!
//! # Lifecycle
//!
//! ```text
//!     activate: setup() (first time only), register
//!   Inactive ─────────────────────────────────► Active
//!      ▲                                          │  set_tier: deregister + register
//!      └──────────────── deactivate ◄─────────────┘
//! ```
//!
//! Deactivation keeps the modifier's internal state (elapsed time, ...) for a later
//! reactivation.
//!
//! # Changes from inside `perform`
//!
//! `perform` only sees a [`Context`], never the scheduler. Structural requests made there go
//! through [`Commands`] and are applied in issue order once the running pass finishes, so a
//! pass always invokes exactly the modifiers that were registered when it started.

mod command;
mod cull;
mod curve;
mod fade;
mod scheduler;

use std::time::Duration;

use crate::core::Result;
use crate::pool::{InstanceHandle, InstancePool};

pub use command::{Command, Commands};
pub use cull::{Cull, CullAction, CullSettings};
pub use curve::{Curve, Wrap};
pub use fade::{Fade, FadeSettings};
pub use scheduler::{ModifierKey, Scheduler};

/// Period of the [`Tier::TenHz`] pass.
pub const TEN_HZ_PERIOD: Duration = Duration::from_millis(100);
/// Period of the [`Tier::OneHz`] pass.
pub const ONE_HZ_PERIOD: Duration = Duration::from_secs(1);

/// The cadence a modifier is performed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tier {
    /// Once per simulation step.
    #[default]
    EveryStep,
    /// Every 100ms.
    TenHz,
    /// Every second.
    OneHz,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::EveryStep, Tier::TenHz, Tier::OneHz];

    /// The fixed period of a timed tier. `EveryStep` has none.
    pub const fn period(self) -> Option<Duration> {
        match self {
            Tier::EveryStep => None,
            Tier::TenHz => Some(TEN_HZ_PERIOD),
            Tier::OneHz => Some(ONE_HZ_PERIOD),
        }
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        match self {
            Tier::EveryStep => 0,
            Tier::TenHz => 1,
            Tier::OneHz => 2,
        }
    }
}

/// Whether a modifier is currently registered with the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Inactive,
    Active,
}

/// A timed behavior bound to one decal instance.
pub trait Modifier {
    /// The instance this modifier acts on. Not owned.
    fn instance(&self) -> InstanceHandle;

    /// Name used in diagnostics and errors.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Called on the first activation, right before the modifier is registered.
    fn setup(&mut self, _pool: &mut dyn InstancePool) -> Result<()> {
        Ok(())
    }

    /// Do one unit of work. `ctx.delta()` is the time this invocation accounts for: the step
    /// delta on `EveryStep`, the tier period otherwise.
    fn perform(&mut self, ctx: &mut Context<'_>) -> Result<()>;
}

/// What a modifier sees while it is performed.
pub struct Context<'a> {
    key: ModifierKey,
    tier: Tier,
    delta: Duration,
    /// The pool owning the modifier's instance.
    pub pool: &'a mut dyn InstancePool,
    commands: &'a mut Commands,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        key: ModifierKey,
        tier: Tier,
        delta: Duration,
        pool: &'a mut dyn InstancePool,
        commands: &'a mut Commands,
    ) -> Self {
        Self {
            key,
            tier,
            delta,
            pool,
            commands,
        }
    }

    /// Key of the modifier being performed.
    #[inline]
    pub fn key(&self) -> ModifierKey {
        self.key
    }

    /// Tier the modifier is being performed at.
    #[inline]
    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// Time accounted for by this invocation.
    #[inline]
    pub fn delta(&self) -> Duration {
        self.delta
    }

    #[inline]
    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Deferred scheduler changes, applied after the current pass.
    #[inline]
    pub fn commands(&mut self) -> &mut Commands {
        &mut *self.commands
    }

    /// Deactivate the modifier being performed once the pass is over.
    pub fn deactivate_self(&mut self) {
        let key = self.key;
        self.commands.deactivate(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_periods() {
        assert_eq!(Tier::EveryStep.period(), None);
        assert_eq!(Tier::TenHz.period(), Some(Duration::from_millis(100)));
        assert_eq!(Tier::OneHz.period(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn tier_indices_are_distinct() {
        let mut indices: Vec<_> = Tier::ALL.iter().map(|tier| tier.index()).collect();
        indices.dedup();
        assert_eq!(indices, vec![0, 1, 2]);
    }
}
