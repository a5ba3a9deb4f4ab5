//! Service-layer error: every backend error flattened to one enum the CLI
//! can print.

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Unreadable, invalid or inconsistent pack/drive/sim documents.
    #[error("Configuration error: {0}")]
    Project(String),

    #[error("Electrical solver error: {0}")]
    Solver(String),

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Run store error: {0}")]
    Results(String),

    #[error("No stored run with id {0}")]
    RunNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<ps_project::ProjectError> for AppError {
    fn from(err: ps_project::ProjectError) -> Self {
        AppError::Project(err.to_string())
    }
}

impl From<ps_solver::SolverError> for AppError {
    fn from(err: ps_solver::SolverError) -> Self {
        AppError::Solver(err.to_string())
    }
}

impl From<ps_sim::SimError> for AppError {
    fn from(err: ps_sim::SimError) -> Self {
        AppError::Simulation(err.to_string())
    }
}

impl From<ps_results::ResultsError> for AppError {
    fn from(err: ps_results::ResultsError) -> Self {
        match err {
            ps_results::ResultsError::RunNotFound { run_id } => AppError::RunNotFound(run_id),
            other => AppError::Results(other.to_string()),
        }
    }
}
