//! Run execution and caching service.

use std::path::{Path, PathBuf};
use std::time::Instant;

use ps_core::WarnOnce;
use ps_core::timing::solver_timing;
use ps_project::{ProjectDocs, flatten_drive, initial_conditions};
use ps_results::{EarlyStop, HistoryWriter, RunManifest, RunStatus, RunStore};
use ps_sim::{
    CellElectrical, CellState, PackElectrical, SimHooks, SimOptions, SimProgress, SimSetup,
    SimStatus, run_sim,
};
use ps_solver::{BisectionLimiter, CurrentLimitPolicy, NoLimit, VoltageLimits};

use crate::error::{AppError, AppResult};
use crate::progress::{RunProgressEvent, RunStage, SimulationProgress};

/// Version stamped into run ids and manifests.
pub const SOLVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Options for running simulations.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub use_cache: bool,
    pub solver_version: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            solver_version: SOLVER_VERSION.to_string(),
        }
    }
}

/// Request to execute a run.
pub struct RunRequest<'a> {
    pub pack_path: &'a Path,
    pub drive_path: &'a Path,
    pub sim_path: &'a Path,
    pub options: RunOptions,
}

/// Concise timing summary for a run. Phases do not overlap; `total_time_s`
/// also covers cache checks and bookkeeping between them.
#[derive(Debug, Clone, Default)]
pub struct RunTimingSummary {
    pub load_time_s: f64,
    pub setup_time_s: f64,
    pub simulate_time_s: f64,
    pub save_time_s: f64,
    pub total_time_s: f64,
    pub steps: usize,
}

/// Counters of a freshly simulated run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub limited_steps: usize,
    pub singular_solves: usize,
    pub warnings_distinct: usize,
    pub warnings_suppressed: usize,
}

/// Response from a run execution.
#[derive(Debug, Clone)]
pub struct RunResponse {
    pub run_id: String,
    pub run_dir: PathBuf,
    pub manifest: RunManifest,
    pub loaded_from_cache: bool,
    pub early_stop: Option<EarlyStop>,
    /// `None` when the run was loaded from the cache.
    pub stats: Option<RunStats>,
    pub timing: RunTimingSummary,
}

fn emit_progress(
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    stage: RunStage,
    started: Instant,
    message: Option<String>,
    simulation: Option<SimulationProgress>,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(RunProgressEvent {
            stage,
            elapsed_wall_s: started.elapsed().as_secs_f64(),
            message,
            simulation,
        });
    }
}

/// Execute or load a run.
pub fn ensure_run(request: &RunRequest) -> AppResult<RunResponse> {
    ensure_run_with_progress(request, None)
}

/// Execute or load a run and stream progress events.
pub fn ensure_run_with_progress(
    request: &RunRequest,
    mut progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<RunResponse> {
    let started = Instant::now();
    let mut timing = RunTimingSummary::default();

    emit_progress(
        &mut progress_cb,
        RunStage::LoadingDocuments,
        started,
        Some("Loading configuration".to_string()),
        None,
    );
    let docs = ProjectDocs::load(request.pack_path, request.drive_path, request.sim_path)?;
    timing.load_time_s = started.elapsed().as_secs_f64();

    let run_id = ps_results::compute_run_id(
        &docs.pack,
        &docs.drive,
        &docs.sim,
        &docs.tables,
        &request.options.solver_version,
    );
    let store = open_store(&docs)?;

    emit_progress(
        &mut progress_cb,
        RunStage::CheckingCache,
        started,
        Some("Checking run cache".to_string()),
        None,
    );
    if request.options.use_cache && store.has_run(&run_id) {
        let manifest = store.load_manifest(&run_id)?;
        if manifest.status != RunStatus::Running {
            emit_progress(
                &mut progress_cb,
                RunStage::LoadingCachedResult,
                started,
                Some("Loading cached run".to_string()),
                None,
            );
            tracing::info!(run_id = %run_id, "using cached run");
            timing.steps = manifest.steps_written;
            timing.total_time_s = started.elapsed().as_secs_f64();
            emit_progress(&mut progress_cb, RunStage::Completed, started, None, None);
            return Ok(RunResponse {
                run_dir: store.run_dir(&run_id),
                early_stop: manifest.early_stop.clone(),
                run_id,
                manifest,
                loaded_from_cache: true,
                stats: None,
                timing,
            });
        }
        tracing::warn!(run_id = %run_id, "cached run is incomplete, re-running");
    }

    let setup_started = Instant::now();
    emit_progress(
        &mut progress_cb,
        RunStage::BuildingPack,
        started,
        Some("Building pack topology".to_string()),
        None,
    );
    let topology = docs.pack.build_topology()?;
    let initial = initial_conditions(&docs.drive, &docs.sim, topology.num_cells())?;
    let mut cells: Vec<CellState> = initial
        .into_iter()
        .map(|c| CellState::new(c.soc, c.temperature_k, c.soh, c.dcir_aging_factor))
        .collect();
    let provider = docs.parameter_provider()?;

    emit_progress(
        &mut progress_cb,
        RunStage::FlatteningDrive,
        started,
        Some("Flattening drive cycle".to_string()),
        None,
    );
    let mut drive_warnings = WarnOnce::new();
    let mut profile = flatten_drive(&docs.drive, &docs.flatten_options()?, &mut drive_warnings)?;
    if profile.steps() == 0 {
        return Err(AppError::InvalidInput(
            "drive profile has no steps (num_days is 0)".to_string(),
        ));
    }

    let mut manifest = RunManifest::new(
        run_id.clone(),
        &request.options.solver_version,
        topology.num_cells(),
        profile.steps(),
        docs.sim.chunk_size,
    );
    manifest.cell_labels = topology.cells().iter().map(|c| c.label.clone()).collect();
    let writer = HistoryWriter::create(&store, manifest)?;

    let limits = &docs.pack.voltage_limits;
    let setup = SimSetup {
        topology: &topology,
        provider: &provider,
        pack: PackElectrical {
            cell: CellElectrical {
                capacity_ah: docs.pack.capacity,
                coulombic_efficiency: docs.pack.coulombic_efficiency,
            },
            r_p: docs.pack.r_p,
            r_s: docs.pack.r_s,
            limits: VoltageLimits::new(limits.cell_upper, limits.cell_lower),
        },
        options: SimOptions {
            parallel_groups: docs.sim.parallel_groups,
        },
    };
    let bisection = BisectionLimiter {
        iterations: docs.sim.limiter.iterations,
    };
    let limit_policy: &dyn CurrentLimitPolicy = if docs.sim.limiter.enabled {
        &bisection
    } else {
        &NoLimit
    };
    timing.setup_time_s = setup_started.elapsed().as_secs_f64();

    emit_progress(
        &mut progress_cb,
        RunStage::Simulating,
        started,
        Some(format!(
            "Simulating {} cells over {} steps",
            topology.num_cells(),
            profile.steps()
        )),
        None,
    );
    solver_timing::reset_all();
    let mut on_step = |p: &SimProgress| {
        emit_progress(
            &mut progress_cb,
            RunStage::Simulating,
            started,
            None,
            Some(SimulationProgress::from(p)),
        );
    };
    let hooks = SimHooks {
        progress: Some(&mut on_step),
        limit_policy,
        ..SimHooks::default()
    };
    let mut outcome = run_sim(&setup, &mut cells, &mut profile, writer, hooks)?;
    outcome.perf.setup_time_s = timing.setup_time_s;
    outcome.perf.print_summary();

    timing.simulate_time_s = outcome.perf.simulate_time_s;
    timing.save_time_s = outcome.perf.save_time_s;
    timing.steps = outcome.steps_run;
    timing.total_time_s = started.elapsed().as_secs_f64();

    let early_stop = match outcome.status {
        SimStatus::Completed => None,
        SimStatus::EarlyStopped(stop) => Some(stop),
    };
    emit_progress(&mut progress_cb, RunStage::Completed, started, None, None);

    Ok(RunResponse {
        run_id,
        run_dir: outcome.run_dir,
        manifest: outcome.manifest,
        loaded_from_cache: false,
        early_stop,
        stats: Some(RunStats {
            limited_steps: outcome.limited_steps,
            singular_solves: outcome.singular_solves,
            warnings_distinct: outcome.warnings.0 + drive_warnings.distinct(),
            warnings_suppressed: outcome.warnings.1 + drive_warnings.suppressed(),
        }),
        timing,
    })
}

/// Results store for a run: the configured output directory, else
/// `.packsim/runs` beside the pack file.
pub(crate) fn open_store(docs: &ProjectDocs) -> AppResult<RunStore> {
    let store = match &docs.sim.output_dir {
        Some(dir) => RunStore::new(docs.resolve_sim_path(dir))?,
        None => RunStore::for_project(&docs.pack_path)?,
    };
    Ok(store)
}

/// List all runs stored for a configuration set, oldest first.
pub fn list_runs(
    pack_path: &Path,
    drive_path: &Path,
    sim_path: &Path,
) -> AppResult<Vec<RunManifest>> {
    let docs = ProjectDocs::load(pack_path, drive_path, sim_path)?;
    Ok(open_store(&docs)?.list_runs()?)
}
