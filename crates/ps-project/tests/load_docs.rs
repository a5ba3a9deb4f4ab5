use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use ps_core::WarnOnce;
use ps_project::{
    ProjectDocs, ProjectError, SimDoc, flatten_drive, initial_conditions, load_sim, save_document,
};
use ps_topology::CellKind;

fn workspace_root() -> PathBuf {
    let crate_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    crate_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .to_path_buf()
}

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("{}_{}", prefix, nanos));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn demo_documents_load_and_flatten() {
    let demos = workspace_root().join("demos");
    let docs = ProjectDocs::load(
        &demos.join("pack.json"),
        &demos.join("drive.json"),
        &demos.join("sim.yaml"),
    )
    .unwrap_or_else(|e| panic!("demo documents failed to load: {e}"));

    let topology = docs.pack.build_topology().unwrap();
    assert_eq!(topology.num_cells(), 12);
    assert_eq!(topology.num_groups(), 3);
    assert_eq!(topology.cells()[0].kind, CellKind::Corner);
    assert_eq!(topology.cells()[5].kind, CellKind::Center);

    let init = initial_conditions(&docs.drive, &docs.sim, topology.num_cells()).unwrap();
    assert_eq!(init[0].soc, 0.8);
    assert_eq!(init[4].temperature_k, 308.15);
    assert_eq!(init[4].dcir_aging_factor, 1.2);

    let mut warnings = WarnOnce::new();
    let profile = flatten_drive(&docs.drive, &docs.flatten_options().unwrap(), &mut warnings)
        .unwrap();
    assert_eq!(profile.duration(), 14.0 * 86_400.0);
    // constant-voltage charge step is skipped once and suppressed after
    assert_eq!(warnings.distinct(), 1);
    assert!(warnings.suppressed() > 0);

    let provider = docs.parameter_provider().unwrap();
    assert_eq!(provider, ps_params::ParameterProvider::reference());
}

#[test]
fn sim_document_roundtrips_through_yaml_and_json() {
    let dir = unique_temp_dir("ps_project_roundtrip");
    let mut sim = SimDoc::default();
    sim.num_days = 30;
    sim.limiter.iterations = 12;
    sim.output_dir = Some(PathBuf::from("out"));

    for name in ["sim.yaml", "sim.json"] {
        let path = dir.join(name);
        save_document(&path, &sim).unwrap();
        assert_eq!(load_sim(&path).unwrap(), sim);
    }

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn invalid_documents_are_rejected() {
    let dir = unique_temp_dir("ps_project_invalid");

    let path = dir.join("sim.yaml");
    std::fs::write(&path, "dynamic_dt_s: -5\n").unwrap();
    assert!(matches!(load_sim(&path), Err(ProjectError::Validation(_))));

    let path = dir.join("sim.toml");
    std::fs::write(&path, "").unwrap();
    assert!(matches!(
        load_sim(&path),
        Err(ProjectError::UnsupportedFormat { .. })
    ));

    let missing = dir.join("absent.json");
    assert!(matches!(load_sim(&missing), Err(ProjectError::Io { .. })));

    let path = dir.join("pack.json");
    let demo = std::fs::read_to_string(workspace_root().join("demos/pack.json")).unwrap();
    let mut pack: serde_json::Value = serde_json::from_str(&demo).unwrap();
    pack["connection_type"] = serde_json::json!("diagonal");
    std::fs::write(&path, pack.to_string()).unwrap();
    assert!(matches!(
        ps_project::load_pack(&path),
        Err(ProjectError::Validation(_))
    ));

    let _ = std::fs::remove_dir_all(dir);
}
