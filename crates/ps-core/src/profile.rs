//! Module current profile: the time series every run is driven by.

use crate::CoreError;

/// Ordered `(t, I_module)` samples, strictly increasing in time.
///
/// `current()[k]` drives the interval from `time()[k]` to `time()[k + 1]`;
/// the last sample's current is never integrated.
///
/// Negative current charges the module. The current limiter may overwrite
/// samples with the current it actually committed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DriveProfile {
    time_s: Vec<f64>,
    current_a: Vec<f64>,
}

impl DriveProfile {
    pub fn new(time_s: Vec<f64>, current_a: Vec<f64>) -> Result<Self, CoreError> {
        if time_s.len() != current_a.len() {
            return Err(CoreError::ProfileLength {
                times: time_s.len(),
                currents: current_a.len(),
            });
        }
        for (t, i) in time_s.iter().zip(&current_a) {
            crate::ensure_finite(*t, "profile time")?;
            crate::ensure_finite(*i, "profile current")?;
        }
        if let Some(index) = time_s.windows(2).position(|w| w[1] <= w[0]) {
            return Err(CoreError::ProfileTimeOrder {
                index: index + 1,
                time_s: time_s[index + 1],
            });
        }
        Ok(Self { time_s, current_a })
    }

    /// Constant current sampled every `dt` seconds, `steps + 1` samples.
    pub fn constant(current_a: f64, dt: f64, steps: usize) -> Result<Self, CoreError> {
        let time_s = (0..=steps).map(|i| i as f64 * dt).collect();
        Self::new(time_s, vec![current_a; steps + 1])
    }

    pub fn len(&self) -> usize {
        self.time_s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_s.is_empty()
    }

    /// Number of integration steps (`len - 1`).
    pub fn steps(&self) -> usize {
        self.len().saturating_sub(1)
    }

    pub fn time(&self) -> &[f64] {
        &self.time_s
    }

    pub fn current(&self) -> &[f64] {
        &self.current_a
    }

    /// Total simulated span in seconds.
    pub fn duration(&self) -> f64 {
        match (self.time_s.first(), self.time_s.last()) {
            (Some(a), Some(b)) => b - a,
            _ => 0.0,
        }
    }

    /// Overwrite one current sample; out-of-range indices are ignored.
    pub fn set_current(&mut self, index: usize, current_a: f64) {
        if let Some(slot) = self.current_a.get_mut(index) {
            *slot = current_a;
        }
    }
}
