use std::time::Duration;

use log::debug;

use super::{Context, Modifier};
use crate::core::{Error, Result};
use crate::pool::InstanceHandle;

/// What happens to an instance when its [`Cull`] expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CullAction {
    /// Give the instance back to the pool.
    #[default]
    Release,
    /// Hide the instance and keep it.
    Hide,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CullSettings {
    pub lifetime: Duration,
    pub action: CullAction,
}

impl Default for CullSettings {
    fn default() -> Self {
        Self {
            lifetime: Duration::from_secs(10),
            action: CullAction::Release,
        }
    }
}

/// Ends an instance's life after a fixed lifetime, then deactivates itself.
///
/// Usually put on `OneHz`: the instance goes away within one period after its lifetime. An
/// instance that was already released elsewhere is left alone and the cull just stops.
#[derive(Debug, Clone)]
pub struct Cull {
    instance: InstanceHandle,
    settings: CullSettings,
    age: Duration,
    culled: bool,
}

impl Cull {
    pub fn new(instance: InstanceHandle, settings: CullSettings) -> Self {
        Self {
            instance,
            settings,
            age: Duration::ZERO,
            culled: false,
        }
    }

    pub fn settings(&self) -> &CullSettings {
        &self.settings
    }

    pub fn age(&self) -> Duration {
        self.age
    }

    pub fn is_culled(&self) -> bool {
        self.culled
    }

    /// Restart the lifetime. A hidden instance stays hidden until shown again.
    pub fn reset(&mut self) {
        self.age = Duration::ZERO;
        self.culled = false;
    }
}

impl Modifier for Cull {
    fn instance(&self) -> InstanceHandle {
        self.instance
    }

    fn name(&self) -> &'static str {
        "cull"
    }

    fn perform(&mut self, ctx: &mut Context<'_>) -> Result<()> {
        if self.culled {
            ctx.deactivate_self();
            return Ok(());
        }
        self.age += ctx.delta();
        if self.age < self.settings.lifetime {
            return Ok(());
        }
        let culled = match self.settings.action {
            CullAction::Release => ctx.pool.release(self.instance),
            CullAction::Hide => ctx.pool.set_active(self.instance, false),
        };
        match culled {
            Ok(()) => debug!(
                "Culled {:?} after {:?} ({:?})",
                self.instance, self.age, self.settings.action
            ),
            Err(Error::UnknownInstance(handle)) if handle == self.instance => {
                debug!("Cull found {handle:?} already released, stopping");
            }
            Err(error) => return Err(error),
        }
        self.culled = true;
        ctx.deactivate_self();
        Ok(())
    }
}
