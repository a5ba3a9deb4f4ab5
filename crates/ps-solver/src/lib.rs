//! Per-timestep electrical solver for parallel cell groups.
//!
//! Each parallel group is a small dense linear system: one row per cell
//! (discretized second-order ECM branch against the shared node voltage)
//! plus Kirchhoff's current law for the group. Groups in series carry the
//! same module current and are solved independently, optionally on a rayon
//! pool. A pluggable limiter throttles the module current when a candidate
//! solve would push a cell past its voltage limits.

pub mod error;
pub mod group;
pub mod limiter;
pub mod module;
pub mod rc;

pub use error::{SolverError, SolverResult};
pub use group::{CellBranch, GroupSolution, solve_group};
pub use limiter::{BisectionLimiter, CurrentLimitPolicy, LimitDecision, NoLimit, VoltageLimits};
pub use module::{ModuleSolution, ModuleSolver};
pub use rc::{Decay, decay_factor, relax, terminal_voltage};
