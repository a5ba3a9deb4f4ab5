//! ps-results: run manifests and chunked per-signal history storage.

pub mod hash;
pub mod history;
pub mod reader;
pub mod signal;
pub mod store;
pub mod types;
pub mod writer;

pub use hash::compute_run_id;
pub use history::{ChunkRecord, HistoryBuffer};
pub use reader::HistoryReader;
pub use signal::{Signal, SignalShape};
pub use store::RunStore;
pub use types::*;
pub use writer::HistoryWriter;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("chunk encoding error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("Run not found: {run_id}")]
    RunNotFound { run_id: String },

    #[error("Invalid path: {message}")]
    InvalidPath { message: String },

    #[error("Unknown signal: {0}")]
    UnknownSignal(String),

    #[error("Cell index {cell} out of range ({cells} cells)")]
    CellOutOfRange { cell: usize, cells: usize },

    #[error("Corrupt chunk {path}: {message}")]
    CorruptChunk { path: String, message: String },
}
