//! Error types for simulation operations.

use thiserror::Error;

/// Errors encountered while running a simulation.
///
/// Voltage cutoffs are not errors: they end the run with an early-stopped
/// outcome.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Cell count mismatch: topology has {expected} cells, state has {found}")]
    CellCount { expected: usize, found: usize },

    #[error("Solver error: {0}")]
    Solver(#[from] ps_solver::SolverError),

    #[error("Results store error: {0}")]
    Store(#[from] ps_results::ResultsError),
}

pub type SimResult<T> = Result<T, SimError>;
