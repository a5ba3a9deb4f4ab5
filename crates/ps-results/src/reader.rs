//! Reading persisted history back.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;

use crate::history::ChunkRecord;
use crate::signal::{Signal, SignalShape};
use crate::store;
use crate::types::RunManifest;
use crate::{ResultsError, ResultsResult};

/// Read-only view of a run directory. Only the steps recorded in the manifest
/// are visible, so a partially written run reads consistently.
#[derive(Debug, Clone)]
pub struct HistoryReader {
    run_dir: PathBuf,
    manifest: RunManifest,
}

impl HistoryReader {
    pub fn open(run_dir: impl AsRef<Path>) -> ResultsResult<Self> {
        let run_dir = run_dir.as_ref().to_path_buf();
        let manifest = store::read_manifest(&run_dir)?;
        Ok(Self { run_dir, manifest })
    }

    pub fn manifest(&self) -> &RunManifest {
        &self.manifest
    }

    pub fn steps(&self) -> usize {
        self.manifest.steps_written
    }

    pub fn read_chunk(&self, signal: Signal, index: usize) -> ResultsResult<ChunkRecord> {
        let path = store::chunk_path(&self.run_dir, signal, index);
        let file = File::open(&path)?;
        let decoder = GzDecoder::new(BufReader::new(file));
        let chunk: ChunkRecord = bincode::deserialize_from(decoder)?;

        let expected_cells = match signal.shape() {
            SignalShape::PerCell => self.manifest.cells,
            SignalShape::PerStep => 1,
        };
        if chunk.cells as usize != expected_cells
            || chunk.values.len() != chunk.cells as usize * chunk.steps as usize
        {
            return Err(ResultsError::CorruptChunk {
                path: path.display().to_string(),
                message: format!(
                    "{} values for {} cells x {} steps",
                    chunk.values.len(),
                    chunk.cells,
                    chunk.steps
                ),
            });
        }
        Ok(chunk)
    }

    /// Full time series of one cell for a per-cell signal.
    pub fn cell_series(&self, signal: Signal, cell: usize) -> ResultsResult<Vec<f32>> {
        if cell >= self.manifest.cells {
            return Err(ResultsError::CellOutOfRange {
                cell,
                cells: self.manifest.cells,
            });
        }
        self.collect(signal, |chunk, out| {
            let steps = chunk.steps as usize;
            out.extend_from_slice(&chunk.values[cell * steps..(cell + 1) * steps]);
        })
    }

    /// Time series of a per-step signal (`dt`, `I_module`, `V_module`).
    pub fn step_series(&self, signal: Signal) -> ResultsResult<Vec<f32>> {
        self.collect(signal, |chunk, out| out.extend_from_slice(&chunk.values))
    }

    /// Values of every cell at one step.
    pub fn snapshot(&self, signal: Signal, step: usize) -> ResultsResult<Vec<f32>> {
        let chunk_size = self.manifest.chunk_size.max(1);
        let chunk = self.read_chunk(signal, step / chunk_size)?;
        let local = step % chunk_size;
        Ok((0..chunk.cells as usize)
            .filter_map(|cell| chunk.value(cell, local))
            .collect())
    }

    fn collect(
        &self,
        signal: Signal,
        mut take: impl FnMut(&ChunkRecord, &mut Vec<f32>),
    ) -> ResultsResult<Vec<f32>> {
        let mut out = Vec::with_capacity(self.manifest.steps_written);
        for index in 0..self.manifest.chunk_count() {
            let chunk = self.read_chunk(signal, index)?;
            take(&chunk, &mut out);
        }
        out.truncate(self.manifest.steps_written);
        Ok(out)
    }
}
