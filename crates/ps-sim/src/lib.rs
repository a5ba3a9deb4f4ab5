//! Time-stepping electro-thermal simulation of a battery module.
//!
//! Provides:
//! - Per-cell mutable state and initial conditions
//! - Cell state integration (SOC, RC relaxation, heat, energy throughput)
//! - Reversible (entropic) heat models
//! - The run orchestrator with progress and current-limit hooks

pub mod error;
pub mod heat;
pub mod integrator;
pub mod sim;
pub mod state;

pub use error::{SimError, SimResult};
pub use heat::{EntropyCoefficientHeat, NoReversibleHeat, ReversibleHeat};
pub use integrator::{CellElectrical, CellStep, integrate_cell};
pub use sim::{
    PackElectrical, SimHooks, SimOptions, SimOutcome, SimProgress, SimSetup, SimStatus, run_sim,
};
pub use state::CellState;
