use std::time::Duration;

use log::info;

use super::{Cancel, Result, Time};

/// How the simulation loop measures the time between steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pacing {
    /// Use the wall clock, sleeping `sleep` between steps to avoid spinning.
    Realtime { sleep: Duration },
    /// Advance by a fixed `delta` per step without sleeping. Deterministic.
    Simulated { delta: Duration },
}

impl Default for Pacing {
    fn default() -> Self {
        Pacing::Realtime {
            sleep: Duration::from_millis(1),
        }
    }
}

/// The core simulation loop. Each iteration produces the next [`Time`] step and hands it to the
/// caller's step routine together with the simulation data. The routine runs the every-step
/// modifier pass, advances the periodic passes and ticks positioners, in whatever order the
/// caller needs.
#[derive(Debug, Clone, Default)]
pub struct SimLoop {
    /// Step pacing.
    pub pacing: Pacing,
    /// Stop after this many steps, if set.
    pub max_steps: Option<u64>,
}

impl SimLoop {
    /// Run the loop until the stop handle is raised, the step budget is spent or the step routine
    /// fails. The caller supplies the seed simulation data and gets it back when the loop ends.
    pub fn run<Data, F>(&self, data: Data, mut on_step: F, stop_handle: &Cancel) -> Result<Data>
    where
        F: FnMut(&Time, &mut Data) -> Result<()>,
    {
        let mut time = Time::new();
        let mut data = data;
        loop {
            if stop_handle.is_cancelled() {
                info!("Ending simulation due to stop handle after {} steps", time.step);
                return Ok(data);
            }
            if self.max_steps.is_some_and(|max| time.step >= max) {
                info!("Ending simulation after step budget of {} steps", time.step);
                return Ok(data);
            }
            match self.pacing {
                Pacing::Realtime { .. } => time = time.next(),
                Pacing::Simulated { delta } => time.advance(delta),
            }
            on_step(&time, &mut data)?;
            if let Pacing::Realtime { sleep } = self.pacing {
                std::thread::sleep(sleep);
            }
        }
    }
}
