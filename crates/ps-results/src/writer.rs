//! Chunked history writer: the single writer of a run directory.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;

use crate::history::{ChunkRecord, HistoryBuffer};
use crate::signal::Signal;
use crate::store::{self, RunStore, SIGNALS_DIR};
use crate::types::{EarlyStop, RunManifest, RunStatus};
use crate::ResultsResult;

/// Buffers steps and flushes every `chunk_size` of them as one gzip-compressed
/// bincode file per signal. The manifest is rewritten after every flush so a
/// run directory is always readable up to `steps_written`.
#[derive(Debug)]
pub struct HistoryWriter {
    run_dir: PathBuf,
    manifest: RunManifest,
    buffer: HistoryBuffer,
    next_chunk: usize,
}

impl HistoryWriter {
    /// Create (or replace) the run directory for `manifest.run_id`.
    pub fn create(store: &RunStore, mut manifest: RunManifest) -> ResultsResult<Self> {
        store.delete_run(&manifest.run_id)?;
        let run_dir = store.run_dir(&manifest.run_id);
        for sig in Signal::all() {
            fs::create_dir_all(run_dir.join(SIGNALS_DIR).join(sig.name()))?;
        }

        manifest.status = RunStatus::Running;
        manifest.steps_written = 0;
        manifest.early_stop = None;
        store::write_manifest(&run_dir, &manifest)?;

        tracing::debug!(run_dir = %run_dir.display(), "created run directory");

        Ok(Self {
            buffer: HistoryBuffer::new(manifest.cells, manifest.chunk_size),
            run_dir,
            manifest,
            next_chunk: 0,
        })
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn manifest(&self) -> &RunManifest {
        &self.manifest
    }

    /// Staging buffer for the current step.
    pub fn buffer_mut(&mut self) -> &mut HistoryBuffer {
        &mut self.buffer
    }

    /// Close the current step; flushes when a chunk is complete.
    pub fn commit_step(&mut self) -> ResultsResult<()> {
        if self.buffer.commit_step() {
            self.flush()?;
        }
        Ok(())
    }

    /// Write buffered steps as a new chunk. No-op on an empty buffer.
    pub fn flush(&mut self) -> ResultsResult<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let index = self.next_chunk;
        let chunks = self.buffer.drain();
        let steps = chunks.first().map(|(_, c)| c.steps as usize).unwrap_or(0);

        for (sig, chunk) in &chunks {
            write_chunk(&store::chunk_path(&self.run_dir, *sig, index), chunk)?;
        }

        self.next_chunk += 1;
        self.manifest.steps_written += steps;
        store::write_manifest(&self.run_dir, &self.manifest)?;

        tracing::debug!(
            chunk = index,
            steps,
            steps_written = self.manifest.steps_written,
            "flushed history chunk"
        );
        Ok(())
    }

    /// Flush what is left and stamp the final status.
    pub fn finish(
        mut self,
        status: RunStatus,
        early_stop: Option<EarlyStop>,
    ) -> ResultsResult<RunManifest> {
        self.flush()?;
        self.manifest.status = status;
        self.manifest.early_stop = early_stop;
        store::write_manifest(&self.run_dir, &self.manifest)?;
        Ok(self.manifest)
    }
}

fn write_chunk(path: &Path, chunk: &ChunkRecord) -> ResultsResult<()> {
    let tmp_path = path.with_extension("gz.tmp");
    {
        let file = File::create(&tmp_path)?;
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::fast());
        bincode::serialize_into(&mut encoder, chunk)?;
        let mut writer = encoder.finish()?;
        writer.flush()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}
