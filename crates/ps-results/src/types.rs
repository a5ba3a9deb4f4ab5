//! Result data types.

use serde::{Deserialize, Serialize};

pub type RunId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunStatus {
    Running,
    Completed,
    EarlyStopped,
}

/// Why a run stopped before the end of the profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarlyStop {
    pub step: usize,
    pub time_s: f64,
    pub cell: usize,
    pub voltage: f64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    pub timestamp: String,
    pub solver_version: String,
    pub cells: usize,
    /// Planned number of steps (profile length minus one).
    pub steps: usize,
    pub chunk_size: usize,
    pub signals: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cell_labels: Vec<String>,
    pub status: RunStatus,
    pub steps_written: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub early_stop: Option<EarlyStop>,
}

impl RunManifest {
    /// Fresh manifest for a run about to start, stamped with the current time.
    pub fn new(run_id: RunId, solver_version: &str, cells: usize, steps: usize, chunk_size: usize) -> Self {
        Self {
            run_id,
            timestamp: chrono::Utc::now().to_rfc3339(),
            solver_version: solver_version.to_string(),
            cells,
            steps,
            chunk_size: chunk_size.max(1),
            signals: crate::Signal::all().map(|s| s.name().to_string()).collect(),
            cell_labels: Vec::new(),
            status: RunStatus::Running,
            steps_written: 0,
            early_stop: None,
        }
    }

    /// Number of chunk files each signal has on disk.
    pub fn chunk_count(&self) -> usize {
        self.steps_written.div_ceil(self.chunk_size.max(1))
    }
}
