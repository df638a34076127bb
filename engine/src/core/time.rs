use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// The clock for a single simulation step. Each step captures the total elapsed time, the delta
/// since the previous step and how many steps have run. New steps are intended to be generated
/// from a previous one using `next()` (wall clock) or `advance()` (fixed delta). Generally this
/// is invoked once per iteration of a game loop.
#[derive(Debug, Copy, Clone)]
pub struct Time {
    // The instant the current step was taken
    instant: Instant,
    /// The time delta since the last step
    pub delta: Duration,
    /// The total elapsed time since the first step
    pub elapsed: Duration,
    /// Number of steps taken so far
    pub step: u64,
}

impl Time {
    /// Construct a new clock with delta and elapsed set to `0`.
    pub fn new() -> Self {
        Self {
            instant: Instant::now(),
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            step: 0,
        }
    }

    /// Create the next step from an existing one. This captures the wall-clock delta since the
    /// last step and updates the cumulative time.
    pub fn next(self) -> Self {
        let delta = self.instant.elapsed();
        Self {
            instant: Instant::now(),
            delta,
            elapsed: self.elapsed + delta,
            step: self.step + 1,
        }
    }

    /// Move the clock forward by a fixed delta, ignoring the wall clock.
    pub fn advance(&mut self, delta: Duration) {
        self.instant = Instant::now();
        self.delta = delta;
        self.elapsed += delta;
        self.step += 1;
    }

    /// The step delta in seconds.
    #[inline]
    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Reset the wall-clock reference to now. This is useful for situations where the loop was
    /// suspended and the gap should not show up as one huge delta.
    pub fn reset_now(&mut self) {
        self.instant = Instant::now();
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

/// A fixed-period accumulator. Feed it step deltas with `accumulate()` and drain whole periods
/// with `consume()`; the remainder is carried into the next step.
#[derive(Debug, Copy, Clone)]
pub struct Interval {
    period: Duration,
    accumulator: Duration,
    fired: u64,
}

impl Interval {
    /// Construct an interval firing once per `period`. The period must be non-zero.
    pub fn new(period: Duration) -> Self {
        assert!(!period.is_zero(), "Interval period must be greater than 0");
        Self {
            period,
            accumulator: Duration::ZERO,
            fired: 0,
        }
    }

    /// The fixed period of this interval.
    #[inline]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// How many times this interval has fired.
    #[inline]
    pub fn fired(&self) -> u64 {
        self.fired
    }

    /// Add elapsed time to the accumulator.
    pub fn accumulate(&mut self, delta: Duration) {
        self.accumulator += delta;
    }

    /// Determine whether a whole period has accumulated.
    #[inline]
    pub fn is_due(&self) -> bool {
        self.accumulator >= self.period
    }

    /// Drain one period if one is due. Returns `true` when the caller should fire.
    pub fn consume(&mut self) -> bool {
        if !self.is_due() {
            return false;
        }
        self.accumulator -= self.period;
        self.fired += 1;
        true
    }

    /// Drop any accumulated remainder.
    pub fn reset(&mut self) {
        self.accumulator = Duration::ZERO;
    }
}

/// A shared cancellation flag. Clones observe the same flag, so a loop and the scheduler it
/// drives can be stopped from one place.
#[derive(Debug, Clone, Default)]
pub struct Cancel(Arc<AtomicBool>);

impl Cancel {
    /// Construct a new, un-raised flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag. Every clone observes it.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether the flag was raised.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
