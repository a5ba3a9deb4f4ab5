//! Module current limiting against per-cell voltage limits.

use ps_params::Mode;

/// Per-cell terminal voltage window.
///
/// The upper limit applies while charging, the lower limit while
/// discharging. A non-finite lower limit disables the discharge check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoltageLimits {
    pub upper: f64,
    pub lower: f64,
}

impl VoltageLimits {
    pub fn new(upper: f64, lower: Option<f64>) -> Self {
        Self {
            upper,
            lower: lower.unwrap_or(f64::NEG_INFINITY),
        }
    }

    /// Limits that never trigger.
    pub fn unbounded() -> Self {
        Self {
            upper: f64::INFINITY,
            lower: f64::NEG_INFINITY,
        }
    }

    pub fn has_lower(&self) -> bool {
        self.lower.is_finite()
    }

    /// Mode-dependent check used to trigger the limiter.
    pub fn violated_in_mode(&self, mode: Mode, voltage: f64) -> bool {
        match mode {
            Mode::Charge => voltage > self.upper,
            Mode::Discharge => self.has_lower() && voltage < self.lower,
        }
    }

    /// Mode-independent check used as the end-of-step safety net.
    pub fn outside(&self, voltage: f64) -> bool {
        voltage > self.upper || (self.has_lower() && voltage < self.lower)
    }

    /// First cell (index, voltage) violating the limits in `mode`.
    pub fn first_violation(&self, mode: Mode, voltages: &[f64]) -> Option<(usize, f64)> {
        voltages
            .iter()
            .copied()
            .enumerate()
            .find(|(_, v)| self.violated_in_mode(mode, *v))
    }
}

/// Outcome of a limiting pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LimitDecision {
    /// Commit the requested current.
    Unchanged,
    /// Commit this reduced current instead.
    Limited { current: f64, evaluations: usize },
}

impl LimitDecision {
    pub fn committed(&self, requested: f64) -> f64 {
        match self {
            LimitDecision::Unchanged => requested,
            LimitDecision::Limited { current, .. } => *current,
        }
    }
}

/// Policy deciding the committed module current once the requested one
/// violates a limit.
///
/// `violates(candidate)` re-solves every group at `candidate` and reports
/// whether any cell leaves its voltage window.
pub trait CurrentLimitPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    fn limit(&self, requested: f64, violates: &mut dyn FnMut(f64) -> bool) -> LimitDecision;
}

/// Never throttles.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLimit;

impl CurrentLimitPolicy for NoLimit {
    fn name(&self) -> &'static str {
        "none"
    }

    fn limit(&self, _requested: f64, _violates: &mut dyn FnMut(f64) -> bool) -> LimitDecision {
        LimitDecision::Unchanged
    }
}

/// Fixed-iteration bisection over the current magnitude on `[0, |I_req|]`.
///
/// The lower (safe) bracket end is committed, so the result is within
/// `|I_req| / 2^iterations` of the violation boundary and never violates
/// when zero current is safe.
#[derive(Debug, Clone, Copy)]
pub struct BisectionLimiter {
    pub iterations: usize,
}

impl Default for BisectionLimiter {
    fn default() -> Self {
        Self { iterations: 20 }
    }
}

impl CurrentLimitPolicy for BisectionLimiter {
    fn name(&self) -> &'static str {
        "bisection"
    }

    fn limit(&self, requested: f64, violates: &mut dyn FnMut(f64) -> bool) -> LimitDecision {
        let sign = if requested < 0.0 { -1.0 } else { 1.0 };
        let mut lo = 0.0;
        let mut hi = requested.abs();

        for _ in 0..self.iterations {
            let mid = 0.5 * (lo + hi);
            if violates(sign * mid) {
                hi = mid;
            } else {
                lo = mid;
            }
        }

        LimitDecision::Limited {
            current: sign * lo,
            evaluations: self.iterations,
        }
    }
}
