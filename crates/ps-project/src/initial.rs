//! Per-cell initial conditions.

use crate::schema::{DriveDoc, SimDoc};
use crate::{ProjectError, ProjectResult};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitialCondition {
    pub soc: f64,
    pub temperature_k: f64,
    pub soh: f64,
    pub dcir_aging_factor: f64,
}

/// Pack-wide defaults (SOC from the drive's starting SOC in percent) with
/// 1-based per-cell overrides applied in order.
pub fn initial_conditions(
    drive: &DriveDoc,
    sim: &SimDoc,
    cells: usize,
) -> ProjectResult<Vec<InitialCondition>> {
    let base = InitialCondition {
        soc: drive.starting_soc / 100.0,
        temperature_k: sim.initial.temperature_k,
        soh: sim.initial.soh,
        dcir_aging_factor: sim.initial.dcir_aging_factor,
    };
    let mut out = vec![base; cells];

    for o in &sim.initial.overrides {
        if o.cell == 0 || o.cell > cells {
            return Err(ProjectError::InvalidOverride {
                cell: o.cell,
                cells,
            });
        }
        let c = &mut out[o.cell - 1];
        if let Some(v) = o.soc {
            c.soc = v;
        }
        if let Some(v) = o.temperature_k {
            c.temperature_k = v;
        }
        if let Some(v) = o.soh {
            c.soh = v;
        }
        if let Some(v) = o.dcir_aging_factor {
            c.dcir_aging_factor = v;
        }
    }
    Ok(out)
}
