//! Error types for solver operations.

use thiserror::Error;

/// Errors raised while setting up a module solve.
///
/// Numerical trouble inside a group (a singular matrix) is not an error; it
/// is reported on the [`GroupSolution`](crate::GroupSolution).
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Invalid input: expected {expected} cell branches, got {found}")]
    BranchCount { expected: usize, found: usize },
}

pub type SolverResult<T> = Result<T, SolverError>;
