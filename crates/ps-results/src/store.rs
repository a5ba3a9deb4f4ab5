//! Run directory layout.

use crate::types::RunManifest;
use crate::{ResultsError, ResultsResult, Signal};
use std::fs;
use std::path::{Path, PathBuf};

pub(crate) const MANIFEST_FILE: &str = "manifest.json";
pub(crate) const SIGNALS_DIR: &str = "signals";

/// Root directory holding one sub-directory per run.
#[derive(Debug, Clone)]
pub struct RunStore {
    root_dir: PathBuf,
}

impl RunStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    /// Default store beside a pack configuration file: `<dir>/.packsim/runs`.
    pub fn for_project(pack_path: &Path) -> ResultsResult<Self> {
        let project_dir = pack_path
            .parent()
            .ok_or_else(|| ResultsError::InvalidPath {
                message: "pack path has no parent directory".to_string(),
            })?;
        Self::new(project_dir.join(".packsim").join("runs"))
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    pub fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root_dir.join(run_id)
    }

    pub fn has_run(&self, run_id: &str) -> bool {
        self.run_dir(run_id).join(MANIFEST_FILE).exists()
    }

    pub fn load_manifest(&self, run_id: &str) -> ResultsResult<RunManifest> {
        read_manifest(&self.run_dir(run_id)).map_err(|e| match e {
            ResultsError::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
                ResultsError::RunNotFound {
                    run_id: run_id.to_string(),
                }
            }
            other => other,
        })
    }

    /// Manifests of every readable run, sorted by timestamp.
    pub fn list_runs(&self) -> ResultsResult<Vec<RunManifest>> {
        let mut runs = Vec::new();

        if !self.root_dir.exists() {
            return Ok(runs);
        }

        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if entry.path().is_dir() {
                let run_id = entry.file_name().to_string_lossy().to_string();
                if let Ok(manifest) = self.load_manifest(&run_id) {
                    runs.push(manifest);
                }
            }
        }

        runs.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(runs)
    }

    pub fn delete_run(&self, run_id: &str) -> ResultsResult<()> {
        let run_dir = self.run_dir(run_id);
        if run_dir.exists() {
            fs::remove_dir_all(run_dir)?;
        }
        Ok(())
    }
}

pub(crate) fn read_manifest(run_dir: &Path) -> ResultsResult<RunManifest> {
    let content = fs::read_to_string(run_dir.join(MANIFEST_FILE))?;
    Ok(serde_json::from_str(&content)?)
}

pub(crate) fn write_manifest(run_dir: &Path, manifest: &RunManifest) -> ResultsResult<()> {
    let tmp = run_dir.join("manifest.json.tmp");
    fs::write(&tmp, serde_json::to_string_pretty(manifest)?)?;
    fs::rename(tmp, run_dir.join(MANIFEST_FILE))?;
    Ok(())
}

pub(crate) fn chunk_path(run_dir: &Path, signal: Signal, index: usize) -> PathBuf {
    run_dir
        .join(SIGNALS_DIR)
        .join(signal.name())
        .join(format!("chunk_{index:06}.bin.gz"))
}
