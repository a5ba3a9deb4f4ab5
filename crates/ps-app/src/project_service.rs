//! Configuration inspection and stored-run lookup.

use std::path::Path;

use ps_core::WarnOnce;
use ps_project::{ProjectDocs, flatten_drive};
use ps_results::HistoryReader;

use crate::error::{AppError, AppResult};
use crate::run_service::open_store;

/// Summary of a validated configuration set.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigSummary {
    pub cells: usize,
    pub groups: usize,
    pub connection: String,
    pub sub_cycles: usize,
    pub drive_cycles: usize,
    pub calendar_rules: usize,
    pub num_days: u32,
    /// Integration steps after flattening the drive over the horizon
    pub steps: usize,
    /// Drive steps skipped while flattening (unsupported units etc.)
    pub drive_warnings: usize,
}

/// Load, validate and dry-run the configuration: builds the pack and
/// flattens the drive without simulating.
pub fn inspect_configs(pack: &Path, drive: &Path, sim: &Path) -> AppResult<ConfigSummary> {
    let docs = ProjectDocs::load(pack, drive, sim)?;
    let topology = docs.pack.build_topology()?;
    let mut warnings = WarnOnce::new();
    let profile = flatten_drive(&docs.drive, &docs.flatten_options()?, &mut warnings)?;

    Ok(ConfigSummary {
        cells: topology.num_cells(),
        groups: topology.num_groups(),
        connection: docs.pack.connection()?.as_str().to_string(),
        sub_cycles: docs.drive.sub_cycles.len(),
        drive_cycles: docs.drive.drive_cycles.len(),
        calendar_rules: docs.drive.calendar_rules.len(),
        num_days: docs.sim.num_days,
        steps: profile.steps(),
        drive_warnings: warnings.distinct() + warnings.suppressed(),
    })
}

/// Open a stored run of a configuration set by id.
pub fn open_stored_run(
    pack: &Path,
    drive: &Path,
    sim: &Path,
    run_id: &str,
) -> AppResult<HistoryReader> {
    let docs = ProjectDocs::load(pack, drive, sim)?;
    let store = open_store(&docs)?;
    if !store.has_run(run_id) {
        return Err(AppError::RunNotFound(run_id.to_string()));
    }
    Ok(HistoryReader::open(store.run_dir(run_id))?)
}

/// Remove a stored run of a configuration set.
pub fn delete_stored_run(pack: &Path, drive: &Path, sim: &Path, run_id: &str) -> AppResult<()> {
    let docs = ProjectDocs::load(pack, drive, sim)?;
    Ok(open_store(&docs)?.delete_run(run_id)?)
}
