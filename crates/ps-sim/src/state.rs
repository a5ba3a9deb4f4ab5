//! Mutable per-cell simulation state.

use ps_core::{Temperature, celsius, k};

/// State of one cell between steps. Owned by the orchestrator.
///
/// Temperature, SOH and the DCIR aging factor are fixed for the run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellState {
    /// State of charge, 0..=1
    pub soc: f64,
    /// Cell temperature (K)
    pub temperature_k: f64,
    pub soh: f64,
    pub dcir_aging_factor: f64,
    /// First RC branch voltage (V)
    pub v_rc1: f64,
    /// Second RC branch voltage (V)
    pub v_rc2: f64,
    /// Terminal voltage after the last step (V)
    pub v_term: f64,
    /// Running energy throughput (kWh)
    pub energy_throughput: f64,
    /// Running sum of generated heat (W summed per step)
    pub q_gen_cumulative: f64,
}

impl CellState {
    pub fn new(soc: f64, temperature_k: f64, soh: f64, dcir_aging_factor: f64) -> Self {
        Self {
            soc,
            temperature_k,
            soh,
            dcir_aging_factor,
            v_rc1: 0.0,
            v_rc2: 0.0,
            v_term: 0.0,
            energy_throughput: 0.0,
            q_gen_cumulative: 0.0,
        }
    }

    pub fn temperature(&self) -> Temperature {
        k(self.temperature_k)
    }

    /// Temperature in °C, the unit lookup tables are indexed in.
    pub fn temperature_c(&self) -> f64 {
        celsius(self.temperature())
    }
}
