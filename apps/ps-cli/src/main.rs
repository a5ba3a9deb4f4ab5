use clap::{Args, Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use ps_app::{
    AppError, AppResult, RunOptions, RunProgressEvent, RunRequest, RunStage, project_service,
    query, run_service,
};

#[derive(Parser)]
#[command(name = "ps-cli")]
#[command(about = "packsim CLI - battery pack electro-thermal simulation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// The three documents that define a simulation.
#[derive(Args)]
struct ConfigPaths {
    /// Pack definition (JSON or YAML)
    pack: PathBuf,
    /// Drive-cycle definition (JSON or YAML)
    drive: PathBuf,
    /// Simulation settings (JSON or YAML)
    sim: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the documents, build the pack and flatten the drive
    Validate {
        #[command(flatten)]
        paths: ConfigPaths,
    },
    /// Run a simulation
    Run {
        #[command(flatten)]
        paths: ConfigPaths,
        /// Skip cache and force re-run
        #[arg(long)]
        no_cache: bool,
        /// Print per-phase solver timings (same as setting PS_TIMING)
        #[arg(long)]
        timing: bool,
    },
    /// List stored runs for a configuration set
    Runs {
        #[command(flatten)]
        paths: ConfigPaths,
    },
    /// Show the summary of a stored run
    ShowRun {
        #[command(flatten)]
        paths: ConfigPaths,
        /// Run ID to display
        run_id: String,
    },
    /// Export one cell's time series from a run as CSV
    ExportSeries {
        #[command(flatten)]
        paths: ConfigPaths,
        /// Run ID
        run_id: String,
        /// Signal name (e.g. SOC, Vterm, I_cell, Qgen)
        signal: String,
        /// Zero-based cell index
        cell: usize,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete a stored run
    DeleteRun {
        #[command(flatten)]
        paths: ConfigPaths,
        /// Run ID to delete
        run_id: String,
    },
}

/// Set while an in-place progress line is on screen.
static PROGRESS_LINE: AtomicBool = AtomicBool::new(false);

/// Log sink that ends a pending progress line before each record, so log
/// output starts on a fresh line. The bar is redrawn on the next event.
struct LogWriter<W>(W);

impl<W: Write> Write for LogWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if PROGRESS_LINE.swap(false, Ordering::Relaxed) {
            self.0.write_all(b"\n")?;
        }
        self.0.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_writer(|| LogWriter(io::stdout().lock()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { paths } => cmd_validate(&paths),
        Commands::Run {
            paths,
            no_cache,
            timing,
        } => {
            if timing {
                ps_app::enable_timing();
            }
            cmd_run(&paths, !no_cache)
        }
        Commands::Runs { paths } => cmd_runs(&paths),
        Commands::ShowRun { paths, run_id } => cmd_show_run(&paths, &run_id),
        Commands::ExportSeries {
            paths,
            run_id,
            signal,
            cell,
            output,
        } => cmd_export_series(&paths, &run_id, &signal, cell, output.as_deref()),
        Commands::DeleteRun { paths, run_id } => {
            project_service::delete_stored_run(&paths.pack, &paths.drive, &paths.sim, &run_id)?;
            println!("✓ Deleted run {}", run_id);
            Ok(())
        }
    }
}

fn cmd_validate(paths: &ConfigPaths) -> AppResult<()> {
    println!("Validating configuration: {}", paths.pack.display());
    let summary = project_service::inspect_configs(&paths.pack, &paths.drive, &paths.sim)?;
    println!("✓ Configuration is valid");
    println!(
        "  Pack: {} cells in {} groups ({})",
        summary.cells, summary.groups, summary.connection
    );
    println!(
        "  Drive: {} sub-cycles, {} drive cycles, {} calendar rules",
        summary.sub_cycles, summary.drive_cycles, summary.calendar_rules
    );
    println!("  Horizon: {} days, {} steps", summary.num_days, summary.steps);
    if summary.drive_warnings > 0 {
        println!("  Skipped drive steps: {}", summary.drive_warnings);
    }
    Ok(())
}

fn cmd_run(paths: &ConfigPaths, use_cache: bool) -> AppResult<()> {
    let request = RunRequest {
        pack_path: &paths.pack,
        drive_path: &paths.drive,
        sim_path: &paths.sim,
        options: RunOptions {
            use_cache,
            ..RunOptions::default()
        },
    };

    let mut last_emit = Instant::now();
    let mut last_fraction = -1.0f64;
    let mut last_stage = None;
    let response = run_service::ensure_run_with_progress(
        &request,
        Some(&mut |event| {
            let fraction = event
                .simulation
                .as_ref()
                .map(|s| s.fraction_complete)
                .unwrap_or(-1.0);
            let emit_now = last_stage != Some(event.stage)
                || (fraction >= 0.0 && (fraction - last_fraction).abs() >= 0.005)
                || last_emit.elapsed().as_millis() >= 100;
            if emit_now {
                render_cli_progress(&event);
                if fraction >= 0.0 {
                    last_fraction = fraction;
                }
                last_stage = Some(event.stage);
                last_emit = Instant::now();
            }
        }),
    )?;
    clear_progress_line();

    if response.loaded_from_cache {
        println!("✓ Loaded from cache: {}", response.run_id);
    } else {
        println!("✓ Simulation finished: {}", response.run_id);
    }
    println!("  Results: {}", response.run_dir.display());
    if let Some(stop) = &response.early_stop {
        println!(
            "  Stopped early at step {} (t = {:.0} s): cell {} at {:.4} V",
            stop.step, stop.time_s, stop.cell, stop.voltage
        );
    }
    if let Some(stats) = &response.stats {
        println!("  Limited steps:   {}", stats.limited_steps);
        if stats.singular_solves > 0 {
            println!("  Singular solves: {}", stats.singular_solves);
        }
        println!(
            "  Warnings: {} distinct, {} suppressed",
            stats.warnings_distinct, stats.warnings_suppressed
        );
    }

    print_timing_summary(&response.timing);

    let reader = query::load_run(&response.run_dir)?;
    print_run_summary(&query::get_run_summary(&reader)?);
    Ok(())
}

fn clear_progress_line() {
    if PROGRESS_LINE.swap(false, Ordering::Relaxed) {
        print!("\r{}\r", " ".repeat(120));
        let _ = io::stdout().flush();
    }
}

fn render_cli_progress(event: &RunProgressEvent) {
    match (&event.stage, &event.simulation) {
        (RunStage::Simulating, Some(s)) => {
            let width = 28usize;
            let filled = ((s.fraction_complete * width as f64).round() as usize).min(width);
            let bar = format!(
                "{}{}",
                "#".repeat(filled),
                "-".repeat(width.saturating_sub(filled))
            );
            print!(
                "\r[{}] {:>6.2}%  day={:.1}  step={}/{}  limited={}  elapsed={:.1}s",
                bar,
                s.fraction_complete * 100.0,
                s.sim_time_s / 86_400.0,
                s.step,
                s.total_steps,
                s.limited_steps,
                event.elapsed_wall_s
            );
        }
        _ => {
            let spinner = ['|', '/', '-', '\\'];
            let spin_idx = ((event.elapsed_wall_s * 10.0) as usize) % spinner.len();
            let mut line = format!(
                "\r{} {}  elapsed={:.2}s",
                spinner[spin_idx],
                event.stage.label(),
                event.elapsed_wall_s
            );
            if let Some(msg) = &event.message {
                line.push_str(&format!("  {}", msg));
            }
            print!("{}", line);
        }
    }
    let _ = io::stdout().flush();
    PROGRESS_LINE.store(true, Ordering::Relaxed);
}

fn print_timing_summary(timing: &ps_app::RunTimingSummary) {
    let total = timing.total_time_s.max(1.0e-12);
    let phase = |label: &str, secs: f64| {
        println!("  {:<9} {:.3}s ({:.1}%)", label, secs, 100.0 * secs / total);
    };
    println!("\nTiming summary:");
    phase("Load:", timing.load_time_s);
    if timing.setup_time_s > 0.0 {
        phase("Setup:", timing.setup_time_s);
    }
    phase("Simulate:", timing.simulate_time_s);
    phase("Save:", timing.save_time_s);
    println!("  Total:    {:.3}s", timing.total_time_s);
    println!("  Steps:    {}", timing.steps);
}

fn print_run_summary(summary: &query::RunSummary) {
    println!("\nRun summary:");
    println!("  Cells: {}  Steps: {}", summary.cells, summary.steps);
    println!("  Simulated time: {:.2} days", summary.sim_time_s / 86_400.0);
    println!(
        "  Final SOC: min {:.4}  mean {:.4}  max {:.4}",
        summary.final_soc_min, summary.final_soc_mean, summary.final_soc_max
    );
    println!(
        "  Terminal voltage: {:.4} - {:.4} V",
        summary.v_term_min, summary.v_term_max
    );
    println!("  Peak cell heat: {:.3} W", summary.peak_cell_heat_w);
    println!("  Energy throughput: {:.3} kWh", summary.energy_throughput_kwh);
}

fn cmd_runs(paths: &ConfigPaths) -> AppResult<()> {
    let runs = run_service::list_runs(&paths.pack, &paths.drive, &paths.sim)?;

    if runs.is_empty() {
        println!("No stored runs for this configuration");
    } else {
        println!("Stored runs:");
        for manifest in runs {
            println!(
                "  {} ({}, {:?}, {}/{} steps)",
                manifest.run_id,
                manifest.timestamp,
                manifest.status,
                manifest.steps_written,
                manifest.steps
            );
        }
    }
    Ok(())
}

fn cmd_show_run(paths: &ConfigPaths, run_id: &str) -> AppResult<()> {
    println!("Loading run: {}", run_id);
    let reader = project_service::open_stored_run(&paths.pack, &paths.drive, &paths.sim, run_id)?;
    let manifest = reader.manifest();
    println!("  Solver version: {}", manifest.solver_version);
    println!("  Status: {:?}", manifest.status);
    if let Some(stop) = &manifest.early_stop {
        println!(
            "  Early stop: step {} cell {} at {:.4} V",
            stop.step, stop.cell, stop.voltage
        );
    }
    print_run_summary(&query::get_run_summary(&reader)?);
    Ok(())
}

fn cmd_export_series(
    paths: &ConfigPaths,
    run_id: &str,
    signal: &str,
    cell: usize,
    output: Option<&Path>,
) -> AppResult<()> {
    let reader = project_service::open_stored_run(&paths.pack, &paths.drive, &paths.sim, run_id)?;
    let series = query::extract_cell_series(&reader, signal, cell)?;
    let time = query::step_end_times(&reader)?;
    if time.len() != series.len() {
        return Err(AppError::Results(format!(
            "time axis has {} samples but {} has {}",
            time.len(),
            signal,
            series.len()
        )));
    }

    let mut csv = String::from("time_s,value\n");
    for (t, val) in time.iter().zip(&series) {
        csv.push_str(&format!("{},{}\n", t, val));
    }

    if let Some(path) = output {
        std::fs::write(path, csv)?;
        println!(
            "✓ Exported {} data points to {}",
            series.len(),
            path.display()
        );
    } else {
        print!("{}", csv);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_output_starts_below_the_progress_bar() {
        PROGRESS_LINE.store(true, Ordering::Relaxed);
        let mut w = LogWriter(Vec::new());
        w.write_all(b"WARN first\n").unwrap();
        w.write_all(b"WARN second\n").unwrap();
        assert_eq!(w.0, b"\nWARN first\nWARN second\n");
        assert!(!PROGRESS_LINE.load(Ordering::Relaxed));
    }
}
