//! Benchmark utilities for the decal core.
//!
//! - **Microbenchmarks**: single operations in isolation (registration, tier moves, one pass,
//!   catch-up firing, ray casts, placement math).
//! - **Scenario benchmarks**: bullet hole churn and positioner sweeps at realistic counts.
//! - **Memory probes**: steady-state heap allocations via dhat.
//! - **Step timing**: every-step and timed-pass cost measured separately.
//!
//! # Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench -p rusty_decals_bench
//!
//! # Run one group
//! cargo bench -p rusty_decals_bench -- scheduler
//!
//! # With allocation probes (slower)
//! cargo bench -p rusty_decals_bench --features memory_profiling
//! ```
//!
//! Criterion writes its reports to `target/criterion/`.

pub mod memory;
pub mod scenarios;
pub mod step_timer;
