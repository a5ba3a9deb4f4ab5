//! End-to-end runs through the service layer with temporary config files.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use ps_app::{
    AppError, RunOptions, RunProgressEvent, RunRequest, RunStage, delete_stored_run, ensure_run,
    ensure_run_with_progress, extract_cell_series, get_run_summary, inspect_configs, list_runs,
    load_run, open_stored_run,
};
use ps_results::{RunStatus, Signal};
use serde_json::{Value, json};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("{}_{}", prefix, nanos));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

struct Configs {
    dir: PathBuf,
    pack: PathBuf,
    drive: PathBuf,
    sim: PathBuf,
}

impl Configs {
    fn write(
        prefix: &str,
        cell_lower: Option<f64>,
        current_a: f64,
        sim: impl FnOnce(&Path) -> Value,
    ) -> Self {
        let dir = unique_temp_dir(prefix);
        let pack = json!({
            "meta": {"layers": [{"grid_type": "rect", "n_rows": 1, "n_cols": 2,
                                 "pitch_x": 0.02, "pitch_y": 0.02, "z_center": 0.0}],
                     "formFactor": "cylindrical"},
            "cells": [{"dims": {"radius": 0.009}}, {"dims": {"radius": 0.009}}],
            "capacity": 5.0,
            "columbic_efficiency": 1.0,
            "connection_type": "row_series_column_parallel",
            "R_p": 0.0,
            "R_s": 0.001,
            "voltage_limits": {"cell_upper": 4.2, "cell_lower": cell_lower,
                               "module_upper": 4.2, "module_lower": null},
            "masses": {"cell": 0.07, "jellyroll": 0.05}
        });
        let drive = json!({
            "startingSoc": "80",
            "subCycles": [{"id": "s", "name": "discharge", "steps": [
                {"unit": "A", "value": current_a.to_string(), "duration": 600,
                 "repetitions": 1, "isDynamic": true}
            ]}],
            "driveCycles": [{"id": "d", "name": "daily",
                             "segments": [{"subCycleId": "s", "repetitions": 1}]}],
            "calendarRules": [],
            "defaultDriveCycleId": "d"
        });

        let paths = Self {
            pack: dir.join("pack.json"),
            drive: dir.join("drive.json"),
            sim: dir.join("sim.json"),
            dir,
        };
        std::fs::write(&paths.pack, pack.to_string()).unwrap();
        std::fs::write(&paths.drive, drive.to_string()).unwrap();
        std::fs::write(&paths.sim, sim(&paths.dir).to_string()).unwrap();
        paths
    }

    fn request(&self, use_cache: bool) -> RunRequest<'_> {
        RunRequest {
            pack_path: &self.pack,
            drive_path: &self.drive,
            sim_path: &self.sim,
            options: RunOptions {
                use_cache,
                ..RunOptions::default()
            },
        }
    }
}

impl Drop for Configs {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

fn two_day_sim(dir: &Path) -> Value {
    json!({"num_days": 2, "chunk_size": 16, "output_dir": dir.join("runs")})
}

#[test]
fn run_reports_progress_and_persists_history() {
    let configs = Configs::write("ps_app_smoke", Some(2.5), 2.0, two_day_sim);
    let out = configs.dir.join("runs");

    let mut events: Vec<RunProgressEvent> = Vec::new();
    let response =
        ensure_run_with_progress(&configs.request(false), Some(&mut |e| events.push(e)))
            .expect("run failed");

    assert!(!response.loaded_from_cache);
    assert!(response.early_stop.is_none());
    assert_eq!(response.manifest.status, RunStatus::Completed);
    // 10 one-minute ticks and one idle sample per day
    assert_eq!(response.manifest.steps_written, 22);
    assert_eq!(response.manifest.cell_labels, vec!["R1C1L1", "R1C2L1"]);
    assert!(response.run_dir.starts_with(&out));
    let stats = response.stats.expect("fresh run has stats");
    assert_eq!(stats.limited_steps, 0);
    assert_eq!(stats.singular_solves, 0);

    let stages: Vec<RunStage> = events.iter().map(|e| e.stage).collect();
    assert_eq!(stages.first(), Some(&RunStage::LoadingDocuments));
    assert_eq!(stages.last(), Some(&RunStage::Completed));
    assert!(stages.contains(&RunStage::FlatteningDrive));
    let sim_events: Vec<_> = events.iter().filter_map(|e| e.simulation.as_ref()).collect();
    assert_eq!(sim_events.len(), 22);
    assert_eq!(sim_events.last().map(|p| p.step), Some(22));
    assert!((sim_events[10].fraction_complete - 0.5).abs() < 1e-12);

    let reader = load_run(&response.run_dir).unwrap();
    // drive ticks then the idle pad to the day boundary, twice
    let i_module = reader.step_series(Signal::IModule).unwrap();
    let mut day = vec![2.0f32; 10];
    day.push(0.0);
    assert_eq!(i_module, [day.clone(), day].concat());
    let soc = reader.cell_series(Signal::Soc, 0).unwrap();
    assert_eq!(soc[10], soc[9]);
    assert_eq!(soc[21], soc[20]);

    let summary = get_run_summary(&reader).unwrap();
    assert_eq!(summary.cells, 2);
    assert_eq!(summary.steps, 22);
    assert!((summary.sim_time_s - 2.0 * 86_400.0).abs() < 1e-6);
    // 1 A per cell for 1200 s out of 5 Ah
    let expected_soc = 0.8 - 1200.0 / (5.0 * 3600.0);
    assert!((summary.final_soc_mean - expected_soc).abs() < 1e-5);
    assert!((summary.final_soc_max - summary.final_soc_min).abs() < 1e-6);
    assert!(summary.v_term_min > 2.5 && summary.v_term_max < 4.2);
    assert!(summary.peak_cell_heat_w > 0.0);
    assert!(summary.energy_throughput_kwh > 0.0);
}

#[test]
fn identical_configuration_is_served_from_cache() {
    let configs = Configs::write("ps_app_cache", Some(2.5), 2.0, two_day_sim);

    let first = ensure_run(&configs.request(true)).unwrap();
    let second = ensure_run(&configs.request(true)).unwrap();
    assert!(!first.loaded_from_cache);
    assert!(second.loaded_from_cache);
    assert_eq!(first.run_id, second.run_id);
    assert!(second.stats.is_none());
    assert_eq!(second.manifest.steps_written, first.manifest.steps_written);

    let third = ensure_run(&configs.request(false)).unwrap();
    assert!(!third.loaded_from_cache);
    assert_eq!(third.run_id, first.run_id);

    let runs = list_runs(&configs.pack, &configs.drive, &configs.sim).unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].run_id, first.run_id);
}

fn parameter_tables(r0: f64) -> Value {
    let table = json!({
        "soc": [0.0, 1.0],
        "temperatures_c": [0.0, 50.0],
        "ocv": [[2.5, 2.5], [4.2, 4.2]],
        "r0": [[r0, r0], [r0, r0]],
        "r1": [[0.01, 0.01], [0.01, 0.01]],
        "r2": [[0.01, 0.01], [0.01, 0.01]],
        "c1": [[1000.0, 1000.0], [1000.0, 1000.0]],
        "c2": [[10000.0, 10000.0], [10000.0, 10000.0]]
    });
    json!({"soh_high": {"charge": table, "discharge": table}})
}

#[test]
fn editing_parameter_tables_invalidates_the_cache() {
    let configs = Configs::write("ps_app_tables", Some(2.5), 2.0, |dir| {
        json!({"num_days": 1, "output_dir": dir.join("runs"),
               "parameter_tables": "tables.json"})
    });
    let tables = configs.dir.join("tables.json");
    std::fs::write(&tables, parameter_tables(0.02).to_string()).unwrap();

    let first = ensure_run(&configs.request(true)).unwrap();
    assert!(!first.loaded_from_cache);
    assert!(ensure_run(&configs.request(true)).unwrap().loaded_from_cache);

    std::fs::write(&tables, parameter_tables(0.03).to_string()).unwrap();
    let edited = ensure_run(&configs.request(true)).unwrap();
    assert!(!edited.loaded_from_cache);
    assert_ne!(edited.run_id, first.run_id);
    assert_eq!(
        list_runs(&configs.pack, &configs.drive, &configs.sim).unwrap().len(),
        2
    );
}

#[test]
fn heavy_discharge_without_limiter_stops_early() {
    let configs = Configs::write("ps_app_early", Some(3.6), 20.0, |dir| {
        json!({"num_days": 1, "chunk_size": 4, "output_dir": dir.join("runs"),
               "limiter": {"enabled": false}})
    });

    let response = ensure_run(&configs.request(false)).unwrap();
    let stop = response.early_stop.expect("expected an early stop");
    assert!(stop.voltage < 3.6);
    assert_eq!(response.manifest.status, RunStatus::EarlyStopped);
    assert_eq!(response.manifest.steps_written, stop.step + 1);
    assert!(response.manifest.steps_written < response.manifest.steps);

    let summary = get_run_summary(&load_run(&response.run_dir).unwrap()).unwrap();
    assert_eq!(summary.steps, stop.step + 1);
    assert!(summary.v_term_min < 3.6);
}

#[test]
fn limiter_throttles_the_same_discharge() {
    let configs = Configs::write("ps_app_limited", Some(3.5), 20.0, |dir| {
        json!({"num_days": 1, "output_dir": dir.join("runs")})
    });

    let response = ensure_run(&configs.request(false)).unwrap();
    assert!(response.early_stop.is_none());
    assert!(response.stats.unwrap().limited_steps > 0);
    let summary = get_run_summary(&load_run(&response.run_dir).unwrap()).unwrap();
    assert!(summary.v_term_min >= 3.5 - 1e-5);
}

#[test]
fn bad_override_index_is_a_project_error() {
    let configs = Configs::write("ps_app_override", Some(2.5), 1.0, |dir| {
        json!({"num_days": 1, "output_dir": dir.join("runs"),
               "initial": {"overrides": [{"cell": 3, "soc": 0.5}]}})
    });

    let err = ensure_run(&configs.request(false)).unwrap_err();
    assert!(matches!(err, AppError::Project(_)), "unexpected error: {err}");
}

#[test]
fn inspect_and_lookup_stored_runs() {
    let configs = Configs::write("ps_app_inspect", Some(2.5), 2.0, two_day_sim);

    let summary = inspect_configs(&configs.pack, &configs.drive, &configs.sim).unwrap();
    assert_eq!(summary.cells, 2);
    assert_eq!(summary.groups, 1);
    assert_eq!(summary.connection, "row_series_column_parallel");
    assert_eq!(summary.steps, 22);
    assert_eq!(summary.drive_warnings, 0);

    let missing = open_stored_run(&configs.pack, &configs.drive, &configs.sim, "nope");
    assert!(matches!(missing, Err(AppError::RunNotFound(_))));

    let response = ensure_run(&configs.request(true)).unwrap();
    let reader =
        open_stored_run(&configs.pack, &configs.drive, &configs.sim, &response.run_id).unwrap();
    let soc = extract_cell_series(&reader, "SOC", 1).unwrap();
    assert_eq!(soc.len(), 22);
    assert!(soc.windows(2).all(|w| w[1] <= w[0]));
    assert!(extract_cell_series(&reader, "bogus", 0).is_err());

    delete_stored_run(&configs.pack, &configs.drive, &configs.sim, &response.run_id).unwrap();
    assert!(list_runs(&configs.pack, &configs.drive, &configs.sim).unwrap().is_empty());
}

#[test]
fn demo_fortnight_runs_to_completion() {
    let demos = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos");
    let dir = unique_temp_dir("ps_app_demo");
    for name in ["pack.json", "drive.json", "sim.yaml"] {
        std::fs::copy(demos.join(name), dir.join(name)).unwrap();
    }
    let (pack, drive, sim) = (dir.join("pack.json"), dir.join("drive.json"), dir.join("sim.yaml"));
    let request = RunRequest {
        pack_path: &pack,
        drive_path: &drive,
        sim_path: &sim,
        options: RunOptions {
            use_cache: false,
            ..RunOptions::default()
        },
    };

    let response = ensure_run(&request).unwrap();
    assert!(response.early_stop.is_none(), "{:?}", response.early_stop);
    assert_eq!(response.manifest.status, RunStatus::Completed);
    // weekend charging runs into the upper cutoff
    assert!(response.stats.unwrap().limited_steps > 0);

    let summary = get_run_summary(&load_run(&response.run_dir).unwrap()).unwrap();
    assert!((summary.sim_time_s - 14.0 * 86_400.0).abs() < 1e-3);
    assert!(summary.v_term_max <= 4.2 + 1e-5);

    let _ = std::fs::remove_dir_all(dir);
}
