//! ps-project: configuration documents, validation and drive-cycle flattening.

pub mod flatten;
pub mod initial;
pub mod pack;
pub mod schema;
pub mod tables;
pub mod validate;

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use flatten::{FlattenOptions, flatten_drive};
pub use initial::{InitialCondition, initial_conditions};
pub use schema::*;
pub use tables::{DatasetDef, ParameterTablesDoc, TableDef};
pub use validate::{ValidationError, validate_drive, validate_pack, validate_sim};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Unsupported document format: {path} (expected .json, .yaml or .yml)")]
    UnsupportedFormat { path: PathBuf },

    #[error("Initial condition override for cell {cell} is out of range (pack has {cells} cells)")]
    InvalidOverride { cell: usize, cells: usize },

    #[error("Topology error: {0}")]
    Topology(#[from] ps_topology::TopologyError),

    #[error("Parameter table error: {0}")]
    Params(#[from] ps_params::ParamsError),

    #[error("Drive profile error: {0}")]
    Profile(#[from] ps_core::CoreError),

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// On-disk encoding, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocFormat {
    Json,
    Yaml,
}

impl DocFormat {
    pub fn from_path(path: &Path) -> ProjectResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("json") => Ok(DocFormat::Json),
            Some("yaml") | Some("yml") => Ok(DocFormat::Yaml),
            _ => Err(ProjectError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

pub fn load_document<T: DeserializeOwned>(path: &Path) -> ProjectResult<T> {
    let format = DocFormat::from_path(path)?;
    let content = std::fs::read_to_string(path).map_err(|source| ProjectError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(match format {
        DocFormat::Json => serde_json::from_str(&content)?,
        DocFormat::Yaml => serde_yaml::from_str(&content)?,
    })
}

pub fn save_document<T: Serialize>(path: &Path, doc: &T) -> ProjectResult<()> {
    let content = match DocFormat::from_path(path)? {
        DocFormat::Json => serde_json::to_string_pretty(doc)?,
        DocFormat::Yaml => serde_yaml::to_string(doc)?,
    };
    std::fs::write(path, content).map_err(|source| ProjectError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_pack(path: &Path) -> ProjectResult<PackDoc> {
    let pack: PackDoc = load_document(path)?;
    validate_pack(&pack)?;
    Ok(pack)
}

pub fn load_drive(path: &Path) -> ProjectResult<DriveDoc> {
    let drive: DriveDoc = load_document(path)?;
    validate_drive(&drive)?;
    Ok(drive)
}

pub fn load_sim(path: &Path) -> ProjectResult<SimDoc> {
    let sim: SimDoc = load_document(path)?;
    validate_sim(&sim)?;
    Ok(sim)
}

pub fn load_parameter_tables(path: &Path) -> ProjectResult<ParameterTablesDoc> {
    load_document(path)
}

/// The three documents of one run, validated, plus where they came from.
///
/// When the simulation document names a parameter table file, that file is
/// loaded alongside so its contents take part in the run id.
#[derive(Debug, Clone)]
pub struct ProjectDocs {
    pub pack: PackDoc,
    pub drive: DriveDoc,
    pub sim: SimDoc,
    pub tables: Option<ParameterTablesDoc>,
    pub pack_path: PathBuf,
    pub sim_path: PathBuf,
}

impl ProjectDocs {
    pub fn load(pack: &Path, drive: &Path, sim: &Path) -> ProjectResult<Self> {
        let mut docs = Self {
            pack: load_pack(pack)?,
            drive: load_drive(drive)?,
            sim: load_sim(sim)?,
            tables: None,
            pack_path: pack.to_path_buf(),
            sim_path: sim.to_path_buf(),
        };
        if let Some(path) = &docs.sim.parameter_tables {
            docs.tables = Some(load_parameter_tables(&docs.resolve_sim_path(path))?);
        }
        Ok(docs)
    }

    /// Resolve a path from the simulation document against its directory.
    pub fn resolve_sim_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match self.sim_path.parent() {
            Some(dir) => dir.join(path),
            None => path.to_path_buf(),
        }
    }

    pub fn parameter_provider(&self) -> ProjectResult<ps_params::ParameterProvider> {
        match &self.tables {
            Some(tables) => tables.to_provider(),
            None => Ok(ps_params::ParameterProvider::reference()),
        }
    }

    pub fn flatten_options(&self) -> ProjectResult<FlattenOptions> {
        FlattenOptions::from_docs(&self.pack, &self.sim)
    }
}
