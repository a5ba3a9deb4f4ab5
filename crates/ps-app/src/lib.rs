//! Shared application service layer for packsim.
//!
//! Wires configuration loading, pack construction, drive flattening, the
//! simulation orchestrator and the results store together for the CLI.

pub mod error;
pub mod progress;
pub mod project_service;
pub mod query;
pub mod run_service;

pub use error::{AppError, AppResult};
pub use ps_core::timing::enable_timing;
pub use progress::{RunProgressEvent, RunStage, SimulationProgress};
pub use project_service::{ConfigSummary, delete_stored_run, inspect_configs, open_stored_run};
pub use query::{RunSummary, extract_cell_series, get_run_summary, load_run, step_end_times};
pub use run_service::{
    RunOptions, RunRequest, RunResponse, RunStats, RunTimingSummary, SOLVER_VERSION, ensure_run,
    ensure_run_with_progress, list_runs,
};
