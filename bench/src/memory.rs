//! Heap allocation probes built on dhat.
//!
//! The scheduler is meant to run its steady state without allocating: rosters, the command
//! buffer and the scratch list keep their capacity between passes. These probes measure what a
//! workload actually allocates so that claim can be checked.
//!
//! Profiling is off unless the `memory_profiling` feature is enabled, and the binary running the
//! probe must install `dhat::Alloc` as its global allocator:
//!
//! ```bash
//! cargo bench -p rusty_decals_bench --features memory_profiling -- memory
//! ```
//!
//! The detailed profile lands in `dhat-heap.json`, viewable with
//! <https://nnethercote.github.io/dh_view/dh_view.html>.

/// Allocation totals over one measurement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryStats {
    pub bytes_allocated: u64,
    pub allocation_count: u64,
    pub peak_bytes: u64,
}

impl MemoryStats {
    /// Bytes allocated per unit of work (per step, per modifier, ...).
    pub fn bytes_per(&self, units: usize) -> f64 {
        if units == 0 {
            0.0
        } else {
            self.bytes_allocated as f64 / units as f64
        }
    }

    /// Allocations per unit of work.
    pub fn allocations_per(&self, units: usize) -> f64 {
        if units == 0 {
            0.0
        } else {
            self.allocation_count as f64 / units as f64
        }
    }
}

impl std::fmt::Display for MemoryStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "allocated: {} bytes ({} allocs), peak: {} bytes",
            self.bytes_allocated, self.allocation_count, self.peak_bytes
        )
    }
}

/// An active heap profile. Only one may exist at a time.
#[cfg(feature = "memory_profiling")]
pub struct MemoryProfiler {
    _profiler: dhat::Profiler,
}

#[cfg(feature = "memory_profiling")]
impl MemoryProfiler {
    pub fn start() -> Self {
        Self {
            _profiler: dhat::Profiler::new_heap(),
        }
    }

    /// Stop profiling. Also writes `dhat-heap.json`.
    pub fn finish(self) -> MemoryStats {
        let stats = dhat::HeapStats::get();
        MemoryStats {
            bytes_allocated: stats.total_bytes as u64,
            allocation_count: stats.total_blocks as u64,
            peak_bytes: stats.max_bytes as u64,
        }
    }
}

#[cfg(not(feature = "memory_profiling"))]
pub struct MemoryProfiler;

#[cfg(not(feature = "memory_profiling"))]
impl MemoryProfiler {
    pub fn start() -> Self {
        Self
    }

    pub fn finish(self) -> MemoryStats {
        MemoryStats::default()
    }
}

/// Run `f` under a heap profile.
pub fn measure_memory<F, R>(f: F) -> (R, MemoryStats)
where
    F: FnOnce() -> R,
{
    let profiler = MemoryProfiler::start();
    let result = f();
    (result, profiler.finish())
}

/// Warm `state` up with `warmup` steps, then profile `steps` more. Only the measured steps count,
/// so one-off growth (rosters reaching their working size) is left out.
pub fn measure_steady_state<S, F>(
    state: &mut S,
    warmup: usize,
    steps: usize,
    mut step: F,
) -> MemoryStats
where
    F: FnMut(&mut S),
{
    for _ in 0..warmup {
        step(state);
    }
    let ((), stats) = measure_memory(|| {
        for _ in 0..steps {
            step(state);
        }
    });
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_stats_display() {
        let stats = MemoryStats {
            bytes_allocated: 2048,
            allocation_count: 16,
            peak_bytes: 512,
        };
        let display = stats.to_string();
        assert!(display.contains("2048 bytes"));
        assert!(display.contains("16 allocs"));
        assert!(display.contains("peak: 512"));
    }

    #[test]
    fn per_unit_ratios() {
        let stats = MemoryStats {
            bytes_allocated: 6400,
            allocation_count: 64,
            peak_bytes: 0,
        };
        assert!((stats.bytes_per(100) - 64.0).abs() < f64::EPSILON);
        assert!((stats.allocations_per(64) - 1.0).abs() < f64::EPSILON);
        assert_eq!(stats.bytes_per(0), 0.0);
    }

    #[cfg(not(feature = "memory_profiling"))]
    #[test]
    fn steady_state_runs_every_step() {
        let mut count = 0;
        let stats = measure_steady_state(&mut count, 3, 5, |count| *count += 1);
        assert_eq!(count, 8);
        assert_eq!(stats, MemoryStats::default());
    }
}
