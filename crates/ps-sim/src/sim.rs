//! Simulation runner: the outer timestep loop.

use std::path::PathBuf;
use std::time::Instant;

use ps_core::timing::{PerfStats, Timer, solver_timing};
use ps_core::{DriveProfile, WarnOnce};
use ps_params::{Mode, ParameterProvider};
use ps_results::{EarlyStop, HistoryBuffer, HistoryWriter, RunManifest, RunStatus, Signal};
use ps_solver::{
    BisectionLimiter, CellBranch, CurrentLimitPolicy, LimitDecision, ModuleSolution,
    ModuleSolver, VoltageLimits,
};
use ps_topology::Topology;

use crate::error::{SimError, SimResult};
use crate::heat::{EntropyCoefficientHeat, ReversibleHeat};
use crate::integrator::{CellElectrical, CellStep, integrate_cell};
use crate::state::CellState;

/// Pack-level electrical configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackElectrical {
    pub cell: CellElectrical,
    /// Parallel interconnect resistance per cell leg (Ω)
    pub r_p: f64,
    /// Series interconnect resistance per group (Ω)
    pub r_s: f64,
    pub limits: VoltageLimits,
}

/// Options for simulation runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimOptions {
    /// Solve groups on the rayon pool
    pub parallel_groups: bool,
}

/// Immutable inputs of a run.
#[derive(Debug, Clone, Copy)]
pub struct SimSetup<'a> {
    pub topology: &'a Topology,
    pub provider: &'a ParameterProvider,
    pub pack: PackElectrical,
    pub options: SimOptions,
}

/// Progress snapshot handed to the progress hook after every step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimProgress {
    pub step: usize,
    pub total_steps: usize,
    pub sim_time_s: f64,
    pub limited_steps: usize,
}

impl SimProgress {
    pub fn fraction_complete(&self) -> f64 {
        if self.total_steps == 0 {
            1.0
        } else {
            self.step as f64 / self.total_steps as f64
        }
    }
}

static DEFAULT_LIMITER: BisectionLimiter = BisectionLimiter { iterations: 20 };
static DEFAULT_HEAT: EntropyCoefficientHeat = EntropyCoefficientHeat;

/// Pluggable behaviour of a run.
pub struct SimHooks<'h> {
    pub progress: Option<&'h mut dyn FnMut(&SimProgress)>,
    pub limit_policy: &'h dyn CurrentLimitPolicy,
    pub reversible_heat: &'h dyn ReversibleHeat,
}

impl Default for SimHooks<'_> {
    fn default() -> Self {
        Self {
            progress: None,
            limit_policy: &DEFAULT_LIMITER,
            reversible_heat: &DEFAULT_HEAT,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimStatus {
    Completed,
    EarlyStopped(EarlyStop),
}

/// Result of a finished (or early-stopped) run.
#[derive(Debug, Clone)]
pub struct SimOutcome {
    pub status: SimStatus,
    pub run_dir: PathBuf,
    pub manifest: RunManifest,
    /// Steps integrated and recorded
    pub steps_run: usize,
    /// Steps whose module current was throttled
    pub limited_steps: usize,
    /// Group solves that hit a singular matrix
    pub singular_solves: usize,
    /// Distinct warnings emitted and repeats suppressed
    pub warnings: (usize, usize),
    pub perf: PerfStats,
}

/// Run the profile to completion or to a voltage cutoff.
///
/// For each step `t` in `0..profile.len()-1`: look up ECM parameters for every
/// cell, solve all groups at the requested current, throttle through the
/// limit policy if a cell would leave its voltage window, integrate every
/// cell, and record the step. If after integration a cell is still outside
/// its window, the step is recorded, history is flushed, and the run ends
/// early-stopped. Committed currents are written back into `profile`.
pub fn run_sim(
    setup: &SimSetup<'_>,
    cells: &mut [CellState],
    profile: &mut DriveProfile,
    mut writer: HistoryWriter,
    mut hooks: SimHooks<'_>,
) -> SimResult<SimOutcome> {
    let topology = setup.topology;
    let n_cells = topology.num_cells();
    if cells.len() != n_cells {
        return Err(SimError::CellCount {
            expected: n_cells,
            found: cells.len(),
        });
    }
    if writer.manifest().cells != n_cells {
        return Err(SimError::InvalidArg {
            what: "history writer sized for a different cell count",
        });
    }

    let run_started = Instant::now();
    let total_steps = profile.steps();
    let limits = setup.pack.limits;
    let solver = ModuleSolver::new(topology, setup.pack.r_p)
        .with_parallel(setup.options.parallel_groups);

    let mut warnings = WarnOnce::new();
    let mut branches = vec![CellBranch::default(); n_cells];
    let mut records = vec![CellStep::default(); n_cells];
    let mut limited_steps = 0;
    let mut singular_solves = 0;
    let mut perf = PerfStats::default();

    tracing::info!(
        cells = n_cells,
        groups = topology.num_groups(),
        steps = total_steps,
        limiter = hooks.limit_policy.name(),
        "starting simulation"
    );

    for t in 0..total_steps {
        let dt = profile.time()[t + 1] - profile.time()[t];
        let requested = profile.current()[t];
        let mode = Mode::from_current(requested);

        let lookup_timer = Timer::start();
        for (branch, cell) in branches.iter_mut().zip(cells.iter()) {
            *branch = CellBranch {
                params: setup.provider.lookup_checked(
                    cell.soc,
                    cell.temperature_c(),
                    mode,
                    cell.soh,
                    cell.dcir_aging_factor,
                    &mut warnings,
                ),
                v_rc1: cell.v_rc1,
                v_rc2: cell.v_rc2,
            };
        }
        lookup_timer.stop_into(&solver_timing::PARAM_LOOKUP);

        let solve_timer = Timer::start();
        let mut solution = solver.solve(&branches, requested, dt)?;
        solve_timer.stop_into(&solver_timing::GROUP_SOLVE);

        let provisional = solver.terminal_voltages(&branches, &solution, dt);
        if limits.first_violation(mode, &provisional).is_some() {
            let limiter_timer = Timer::start();
            let decision = hooks.limit_policy.limit(requested, &mut |candidate| {
                match solver.solve(&branches, candidate, dt) {
                    Ok(sol) => limits
                        .first_violation(mode, &solver.terminal_voltages(&branches, &sol, dt))
                        .is_some(),
                    Err(_) => true,
                }
            });
            limiter_timer.stop_into(&solver_timing::LIMITER);

            if let LimitDecision::Limited { current, .. } = decision {
                tracing::debug!(step = t, requested, committed = current, "module current limited");
                profile.set_current(t, current);
                solution = solver.solve(&branches, current, dt)?;
                limited_steps += 1;
            }
        }

        for group in &solution.singular_groups {
            singular_solves += 1;
            warnings.warn(&format!("singular-group:{group}"), || {
                format!("singular matrix in parallel group {group} at step {t}, using zero currents")
            });
        }

        for (i, cell) in cells.iter_mut().enumerate() {
            records[i] = integrate_cell(
                cell,
                &branches[i].params,
                solution.cell_currents[i],
                dt,
                &setup.pack.cell,
                hooks.reversible_heat,
            );
        }

        record_step(writer.buffer_mut(), &records, &solution, dt, setup.pack.r_s);
        let flush_timer = Timer::start();
        writer.commit_step()?;
        flush_timer.stop_into(&solver_timing::FLUSH);

        if let Some(progress) = hooks.progress.as_mut() {
            progress(&SimProgress {
                step: t + 1,
                total_steps,
                sim_time_s: profile.time()[t + 1],
                limited_steps,
            });
        }

        let violation = cells
            .iter()
            .enumerate()
            .find(|(_, c)| limits.outside(c.v_term));
        if let Some((cell, state)) = violation {
            let reason = if state.v_term > limits.upper {
                "above upper voltage limit"
            } else {
                "below lower voltage limit"
            };
            tracing::warn!(
                step = t,
                cell,
                voltage = state.v_term,
                "{reason}, stopping simulation"
            );
            let stop = EarlyStop {
                step: t,
                time_s: profile.time()[t + 1],
                cell,
                voltage: state.v_term,
                reason: reason.to_string(),
            };
            perf.steps = t + 1;
            return finish(
                writer,
                SimStatus::EarlyStopped(stop),
                run_started,
                perf,
                limited_steps,
                singular_solves,
                &warnings,
            );
        }
    }

    perf.steps = total_steps;
    finish(
        writer,
        SimStatus::Completed,
        run_started,
        perf,
        limited_steps,
        singular_solves,
        &warnings,
    )
}

fn record_step(
    buf: &mut HistoryBuffer,
    records: &[CellStep],
    solution: &ModuleSolution,
    dt: f64,
    r_s: f64,
) {
    for (cell, r) in records.iter().enumerate() {
        for (signal, value) in [
            (Signal::Soc, r.soc),
            (Signal::Vterm, r.v_term),
            (Signal::Ocv, r.params.ocv),
            (Signal::ICell, r.current),
            (Signal::VRc1, r.v_rc1),
            (Signal::VRc2, r.v_rc2),
            (Signal::VR0, r.v_r0),
            (Signal::R0, r.params.r0),
            (Signal::R1, r.params.r1),
            (Signal::R2, r.params.r2),
            (Signal::C1, r.params.c1),
            (Signal::C2, r.params.c2),
            (Signal::Qgen, r.q_gen),
            (Signal::Qirrev, r.q_irr),
            (Signal::Qrev, r.q_rev),
            (Signal::EnergyThroughput, r.energy_throughput),
            (Signal::QgenCumulative, r.q_gen_cumulative),
        ] {
            buf.record_cell(signal, cell, value);
        }
    }
    buf.record_step(Signal::Dt, dt);
    buf.record_step(Signal::IModule, solution.current);
    buf.record_step(Signal::VModule, solution.module_voltage(r_s));
}

fn finish(
    writer: HistoryWriter,
    status: SimStatus,
    run_started: Instant,
    mut perf: PerfStats,
    limited_steps: usize,
    singular_solves: usize,
    warnings: &WarnOnce,
) -> SimResult<SimOutcome> {
    let run_dir = writer.run_dir().to_path_buf();
    let (run_status, early_stop) = match &status {
        SimStatus::Completed => (RunStatus::Completed, None),
        SimStatus::EarlyStopped(stop) => (RunStatus::EarlyStopped, Some(stop.clone())),
    };

    let save_started = Instant::now();
    perf.simulate_time_s = save_started.duration_since(run_started).as_secs_f64();
    let manifest = writer.finish(run_status, early_stop)?;
    perf.save_time_s = save_started.elapsed().as_secs_f64();

    tracing::info!(
        run_id = %manifest.run_id,
        steps = manifest.steps_written,
        limited_steps,
        singular_solves,
        status = ?run_status,
        "simulation finished"
    );

    Ok(SimOutcome {
        status,
        run_dir,
        steps_run: manifest.steps_written,
        manifest,
        limited_steps,
        singular_solves,
        warnings: (warnings.distinct(), warnings.suppressed()),
        perf,
    })
}
