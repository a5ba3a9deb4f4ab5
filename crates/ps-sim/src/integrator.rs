//! Cell state integration over one step.

use ps_core::{ah, coulombs, kwh_from_joules};
use ps_params::EcmParams;
use ps_solver::CellBranch;

use crate::heat::ReversibleHeat;
use crate::state::CellState;

/// Electrical constants shared by every cell of the pack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellElectrical {
    /// Nominal capacity (Ah)
    pub capacity_ah: f64,
    /// Applied to the SOC change while charging only.
    pub coulombic_efficiency: f64,
}

/// Everything recorded for one cell at one step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CellStep {
    pub soc: f64,
    pub v_term: f64,
    pub current: f64,
    pub v_rc1: f64,
    pub v_rc2: f64,
    /// Ohmic drop `I · R0` (V)
    pub v_r0: f64,
    pub params: EcmParams,
    pub q_gen: f64,
    pub q_irr: f64,
    pub q_rev: f64,
    pub energy_throughput: f64,
    pub q_gen_cumulative: f64,
}

/// SOC after carrying `current` for `dt`, clamped to [0, 1].
pub fn next_soc(soc: f64, current: f64, dt: f64, soh: f64, electrical: &CellElectrical) -> f64 {
    let capacity_as = coulombs(ah(electrical.capacity_ah * soh));
    let mut delta = if capacity_as > 0.0 && capacity_as.is_finite() {
        current * dt / capacity_as
    } else {
        0.0
    };
    if current < 0.0 {
        delta *= electrical.coulombic_efficiency;
    }
    (soc - delta).clamp(0.0, 1.0)
}

/// Advance `state` by one step at branch current `current`.
///
/// Reversible heat is evaluated at the SOC the step started from.
pub fn integrate_cell(
    state: &mut CellState,
    params: &EcmParams,
    current: f64,
    dt: f64,
    electrical: &CellElectrical,
    heat: &dyn ReversibleHeat,
) -> CellStep {
    let branch = CellBranch {
        params: *params,
        v_rc1: state.v_rc1,
        v_rc2: state.v_rc2,
    };
    let (v_rc1, v_rc2, v_term) = branch.advance(current, dt);

    let soc_start = state.soc;
    let soc = next_soc(soc_start, current, dt, state.soh, electrical);

    let q_irr = current * current * params.r0;
    let q_rev = heat.heat(state.temperature_k, current, soc_start);
    let q_gen = q_irr + q_rev;

    state.soc = soc;
    state.v_rc1 = v_rc1;
    state.v_rc2 = v_rc2;
    state.v_term = v_term;
    state.energy_throughput += kwh_from_joules((current * v_term * dt).abs());
    state.q_gen_cumulative += q_gen;

    CellStep {
        soc,
        v_term,
        current,
        v_rc1,
        v_rc2,
        v_r0: current * params.r0,
        params: *params,
        q_gen,
        q_irr,
        q_rev,
        energy_throughput: state.energy_throughput,
        q_gen_cumulative: state.q_gen_cumulative,
    }
}
