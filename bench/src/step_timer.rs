//! Wall-clock timing of simulation steps.
//!
//! A decal step has two phases with very different costs: the every-step pass, which runs on
//! each step, and the timed passes, which only fire when their interval comes due. Timing them
//! separately keeps a rare one-hertz spike from hiding in the every-step average.

use std::time::{Duration, Instant};

/// Statistics over a run of measured steps.
#[derive(Debug, Clone)]
pub struct StepStats {
    /// Number of steps measured.
    pub step_count: usize,
    /// Sum of all step times.
    pub total: Duration,
    pub min: Duration,
    pub max: Duration,
    sorted: Vec<Duration>,
}

impl StepStats {
    pub fn from_times(mut times: Vec<Duration>) -> Self {
        times.sort_unstable();
        Self {
            step_count: times.len(),
            total: times.iter().sum(),
            min: times.first().copied().unwrap_or_default(),
            max: times.last().copied().unwrap_or_default(),
            sorted: times,
        }
    }

    pub fn average(&self) -> Duration {
        match u32::try_from(self.step_count) {
            Ok(0) | Err(_) => Duration::ZERO,
            Ok(count) => self.total / count,
        }
    }

    /// Step time at percentile `p` (0-100).
    pub fn percentile(&self, p: usize) -> Duration {
        let Some(last) = self.sorted.len().checked_sub(1) else {
            return Duration::ZERO;
        };
        self.sorted[(self.sorted.len() * p.min(100) / 100).min(last)]
    }

    pub fn median(&self) -> Duration {
        self.percentile(50)
    }

    pub fn p99(&self) -> Duration {
        self.percentile(99)
    }

    /// Steps per second the measured work alone would allow.
    pub fn steps_per_second(&self) -> f64 {
        let average = self.average();
        if average.is_zero() {
            0.0
        } else {
            1.0 / average.as_secs_f64()
        }
    }
}

impl std::fmt::Display for StepStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ms = |duration: Duration| duration.as_secs_f64() * 1000.0;
        write!(
            f,
            "{} steps, avg: {:.3}ms, median: {:.3}ms, p99: {:.3}ms, max: {:.3}ms",
            self.step_count,
            ms(self.average()),
            ms(self.median()),
            ms(self.p99()),
            ms(self.max),
        )
    }
}

/// Records the duration of individual steps.
pub struct StepTimer {
    times: Vec<Duration>,
    started: Option<Instant>,
}

impl StepTimer {
    pub fn new(expected_steps: usize) -> Self {
        Self {
            times: Vec::with_capacity(expected_steps),
            started: None,
        }
    }

    pub fn begin(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Record the time since `begin`. Does nothing without a matching `begin`.
    pub fn end(&mut self) {
        if let Some(started) = self.started.take() {
            self.times.push(started.elapsed());
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn stats(self) -> StepStats {
        StepStats::from_times(self.times)
    }
}

/// Time `step_fn` over `steps` calls.
pub fn measure_steps<F>(steps: usize, mut step_fn: F) -> StepStats
where
    F: FnMut(usize),
{
    let mut timer = StepTimer::new(steps);
    for step in 0..steps {
        timer.begin();
        step_fn(step);
        timer.end();
    }
    timer.stats()
}

/// Time the two phases of each step separately: `every_step` runs first, then `timed` (which
/// advances the periodic passes). Returns `(every_step, timed)` statistics.
pub fn measure_phases<E, T>(steps: usize, mut every_step: E, mut timed: T) -> (StepStats, StepStats)
where
    E: FnMut(usize),
    T: FnMut(usize),
{
    let mut every_step_timer = StepTimer::new(steps);
    let mut timed_timer = StepTimer::new(steps);
    for step in 0..steps {
        every_step_timer.begin();
        every_step(step);
        every_step_timer.end();

        timed_timer.begin();
        timed(step);
        timed_timer.end();
    }
    (every_step_timer.stats(), timed_timer.stats())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_from_known_times() {
        let stats = StepStats::from_times(
            [4, 1, 3, 2, 10].into_iter().map(Duration::from_millis).collect(),
        );

        assert_eq!(stats.step_count, 5);
        assert_eq!(stats.min, Duration::from_millis(1));
        assert_eq!(stats.max, Duration::from_millis(10));
        assert_eq!(stats.average(), Duration::from_millis(4));
        assert_eq!(stats.median(), Duration::from_millis(3));
        assert_eq!(stats.percentile(100), Duration::from_millis(10));
    }

    #[test]
    fn empty_stats_are_zero() {
        let stats = StepStats::from_times(Vec::new());
        assert_eq!(stats.average(), Duration::ZERO);
        assert_eq!(stats.p99(), Duration::ZERO);
        assert_eq!(stats.steps_per_second(), 0.0);
    }

    #[test]
    fn unmatched_end_is_ignored() {
        let mut timer = StepTimer::new(2);
        timer.end();
        timer.begin();
        timer.end();
        assert_eq!(timer.len(), 1);
    }

    #[test]
    fn phases_are_timed_separately() {
        let (every_step, timed) = measure_phases(
            4,
            |_| std::thread::sleep(Duration::from_micros(200)),
            |_| {},
        );

        assert_eq!(every_step.step_count, 4);
        assert_eq!(timed.step_count, 4);
        assert!(every_step.average() >= Duration::from_micros(200));
    }
}
