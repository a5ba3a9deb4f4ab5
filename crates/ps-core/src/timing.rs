//! Lightweight performance timing utilities.
//!
//! Timers are off unless enabled programmatically or via the `PS_TIMING`
//! environment variable.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

static ENABLED: AtomicBool = AtomicBool::new(false);

/// Enable performance timing globally.
pub fn enable_timing() {
    ENABLED.store(true, Ordering::Relaxed);
}

/// Check if timing is enabled.
pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed) || std::env::var("PS_TIMING").is_ok()
}

/// A simple timer that measures elapsed time.
pub struct Timer {
    start: Instant,
    enabled: bool,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
            enabled: is_enabled(),
        }
    }

    /// Stop the timer and return elapsed time in seconds.
    /// If timing is disabled, returns None.
    pub fn stop(self) -> Option<f64> {
        if self.enabled {
            Some(self.start.elapsed().as_secs_f64())
        } else {
            None
        }
    }

    /// Stop the timer and add the elapsed time to `acc` if enabled.
    pub fn stop_into(self, acc: &AccumulatingTimer) {
        if let Some(elapsed) = self.stop() {
            acc.record(elapsed);
        }
    }
}

/// Accumulating timer for tracking total time across multiple calls.
pub struct AccumulatingTimer {
    total_ns: AtomicU64,
    count: AtomicU64,
}

impl Default for AccumulatingTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl AccumulatingTimer {
    pub const fn new() -> Self {
        Self {
            total_ns: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Record a timing measurement.
    pub fn record(&self, duration_s: f64) {
        let nanos = (duration_s * 1e9) as u64;
        self.total_ns.fetch_add(nanos, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total time spent (in seconds).
    pub fn total_seconds(&self) -> f64 {
        self.total_ns.load(Ordering::Relaxed) as f64 / 1e9
    }

    /// Get number of calls.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Get average time per call (in seconds).
    pub fn average_seconds(&self) -> f64 {
        let count = self.count();
        if count > 0 {
            self.total_seconds() / count as f64
        } else {
            0.0
        }
    }

    pub fn reset(&self) {
        self.total_ns.store(0, Ordering::Relaxed);
        self.count.store(0, Ordering::Relaxed);
    }
}

/// Hot-path timers for the electrical solver.
pub mod solver_timing {
    use super::AccumulatingTimer;

    /// ECM parameter lookups (all cells, one step)
    pub static PARAM_LOOKUP: AccumulatingTimer = AccumulatingTimer::new();
    /// Group circuit solves (all groups, one candidate current)
    pub static GROUP_SOLVE: AccumulatingTimer = AccumulatingTimer::new();
    /// Bisection current limiting
    pub static LIMITER: AccumulatingTimer = AccumulatingTimer::new();
    /// History chunk flushes
    pub static FLUSH: AccumulatingTimer = AccumulatingTimer::new();

    pub fn reset_all() {
        PARAM_LOOKUP.reset();
        GROUP_SOLVE.reset();
        LIMITER.reset();
        FLUSH.reset();
    }

    pub fn print_summary() {
        if !super::is_enabled() {
            return;
        }

        println!("\n=== Electrical Solver Breakdown ===");
        for (label, timer) in [
            ("param lookup", &PARAM_LOOKUP),
            ("group solve", &GROUP_SOLVE),
            ("limiter", &LIMITER),
            ("flush", &FLUSH),
        ] {
            let count = timer.count();
            if count > 0 {
                println!(
                    "{:<14} {} calls, {:.3}s total, {:.4}ms avg",
                    label,
                    count,
                    timer.total_seconds(),
                    timer.average_seconds() * 1000.0
                );
            }
        }
        println!("===================================\n");
    }
}

/// Performance statistics collector.
#[derive(Default, Debug, Clone)]
pub struct PerfStats {
    pub setup_time_s: f64,
    /// Stepping loop, chunk flushes included
    pub simulate_time_s: f64,
    pub steps: usize,
    /// Final store write after the last step
    pub save_time_s: f64,
}

impl PerfStats {
    pub fn print_summary(&self) {
        if !is_enabled() {
            return;
        }

        println!("\n=== Performance Summary ===");
        if self.setup_time_s > 0.0 {
            println!("Setup time:          {:.3}s", self.setup_time_s);
        }
        if self.simulate_time_s > 0.0 {
            println!("Simulation total:    {:.3}s", self.simulate_time_s);
            if self.steps > 0 {
                println!("  Steps:             {}", self.steps);
                println!(
                    "  Avg step time:     {:.6}s",
                    self.simulate_time_s / self.steps as f64
                );
            }
        }
        if self.save_time_s > 0.0 {
            println!("Store time:          {:.3}s", self.save_time_s);
        }
        println!("==========================\n");

        solver_timing::print_summary();
    }
}
