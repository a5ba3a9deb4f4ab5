//! Discretized RC branch helpers shared by the group solve and integration.

use ps_core::round_to_decimals;
use ps_params::EcmParams;

/// Decimal places kept on terminal voltages.
pub const VOLTAGE_DECIMALS: i32 = 5;

/// `exp(-dt/tau)`, or 0 when `tau` is not a positive finite number.
///
/// A branch with zero resistance or capacitance behaves as an instantaneous
/// resistor: it carries no memory from one step to the next.
pub fn decay_factor(dt: f64, tau: f64) -> f64 {
    if tau.is_finite() && tau > 0.0 {
        (-dt / tau).exp()
    } else {
        0.0
    }
}

/// Decay factors of both RC branches for one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decay {
    pub e1: f64,
    pub e2: f64,
}

impl Decay {
    pub fn new(params: &EcmParams, dt: f64) -> Self {
        Self {
            e1: decay_factor(dt, params.tau1()),
            e2: decay_factor(dt, params.tau2()),
        }
    }

    /// Effective series resistance of the cell branch over one step,
    /// including both interconnect legs.
    pub fn effective_resistance(&self, params: &EcmParams, r_p: f64) -> f64 {
        params.r0 + 2.0 * r_p + params.r1 * (1.0 - self.e1) + params.r2 * (1.0 - self.e2)
    }

    /// OCV minus the decayed RC voltages carried over from the last step.
    pub fn source_voltage(&self, params: &EcmParams, v_rc1: f64, v_rc2: f64) -> f64 {
        params.ocv - (v_rc1 * self.e1 + v_rc2 * self.e2)
    }
}

/// RC voltage after one step at constant current.
pub fn relax(v_prev: f64, r: f64, current: f64, e: f64) -> f64 {
    v_prev * e + r * current * (1.0 - e)
}

/// Terminal voltage from updated RC voltages, rounded to 5 decimals.
pub fn terminal_voltage(params: &EcmParams, current: f64, v_rc1: f64, v_rc2: f64) -> f64 {
    round_to_decimals(
        params.ocv - current * params.r0 - v_rc1 - v_rc2,
        VOLTAGE_DECIMALS,
    )
}
