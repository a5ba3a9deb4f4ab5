//! Result querying over persisted runs.

use std::path::Path;

use ps_results::{HistoryReader, Signal};

use crate::error::{AppError, AppResult};

/// Per-run statistics derived from the stored history.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub cells: usize,
    pub steps: usize,
    /// Sum of recorded step lengths (s)
    pub sim_time_s: f64,
    pub final_soc_min: f64,
    pub final_soc_max: f64,
    pub final_soc_mean: f64,
    pub v_term_min: f64,
    pub v_term_max: f64,
    /// Largest single-step heat generation of any cell (W)
    pub peak_cell_heat_w: f64,
    /// Energy throughput summed over all cells at the last step (kWh)
    pub energy_throughput_kwh: f64,
}

/// Open a stored run directory.
pub fn load_run(run_dir: &Path) -> AppResult<HistoryReader> {
    Ok(HistoryReader::open(run_dir)?)
}

/// Time series of one cell for a signal given by name (e.g. `"SOC"`).
pub fn extract_cell_series(
    reader: &HistoryReader,
    signal: &str,
    cell: usize,
) -> AppResult<Vec<f32>> {
    let signal: Signal = signal.parse()?;
    Ok(reader.cell_series(signal, cell)?)
}

/// Simulation time at the end of every recorded step (s).
pub fn step_end_times(reader: &HistoryReader) -> AppResult<Vec<f64>> {
    let mut t = 0.0;
    Ok(reader
        .step_series(Signal::Dt)?
        .iter()
        .map(|dt| {
            t += *dt as f64;
            t
        })
        .collect())
}

pub fn get_run_summary(reader: &HistoryReader) -> AppResult<RunSummary> {
    let steps = reader.steps();
    if steps == 0 {
        return Err(AppError::InvalidInput("run has no recorded steps".to_string()));
    }
    let last = steps - 1;

    let final_soc = reader.snapshot(Signal::Soc, last)?;
    let (soc_min, soc_max) = min_max(final_soc.iter().copied());
    let soc_mean = final_soc.iter().map(|v| *v as f64).sum::<f64>() / final_soc.len().max(1) as f64;

    let sim_time_s = step_end_times(reader)?.last().copied().unwrap_or(0.0);

    let (v_term_min, v_term_max) = scan_chunks(reader, Signal::Vterm)?;
    let (_, peak_cell_heat_w) = scan_chunks(reader, Signal::Qgen)?;

    let energy_throughput_kwh = reader
        .snapshot(Signal::EnergyThroughput, last)?
        .iter()
        .map(|v| *v as f64)
        .sum();

    Ok(RunSummary {
        cells: reader.manifest().cells,
        steps,
        sim_time_s,
        final_soc_min: soc_min,
        final_soc_max: soc_max,
        final_soc_mean: soc_mean,
        v_term_min,
        v_term_max,
        peak_cell_heat_w,
        energy_throughput_kwh,
    })
}

/// Min and max of a per-cell signal over every recorded step, one chunk at
/// a time.
fn scan_chunks(reader: &HistoryReader, signal: Signal) -> AppResult<(f64, f64)> {
    let manifest = reader.manifest();
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for index in 0..manifest.chunk_count() {
        let chunk = reader.read_chunk(signal, index)?;
        let start = chunk.start_step as usize;
        let visible = (manifest.steps_written.saturating_sub(start)).min(chunk.steps as usize);
        for cell in 0..chunk.cells as usize {
            let values = (0..visible).filter_map(|k| chunk.value(cell, k));
            let (a, b) = min_max(values);
            lo = lo.min(a);
            hi = hi.max(b);
        }
    }
    Ok((lo, hi))
}

fn min_max(values: impl Iterator<Item = f32>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v as f64), hi.max(v as f64))
    })
}
