//! In-memory history buffer for one chunk of steps.

use serde::{Deserialize, Serialize};

use crate::signal::{Signal, SignalShape};

/// One signal's slice of the run as stored on disk.
///
/// Per-cell signals are cell-major: `values[cell * steps + local_step]`.
/// Per-step signals have `cells == 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub start_step: u64,
    pub steps: u32,
    pub cells: u32,
    pub values: Vec<f32>,
}

impl ChunkRecord {
    pub fn value(&self, cell: usize, local_step: usize) -> Option<f32> {
        self.values.get(cell * self.steps as usize + local_step).copied()
    }
}

/// Pre-sized buffer holding up to `capacity` steps of every signal.
///
/// Values are staged into the current row with `record_*` and the row is
/// closed with [`commit_step`](Self::commit_step).
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    cells: usize,
    capacity: usize,
    start_step: usize,
    filled: usize,
    /// `cell_data[slot][cell * capacity + local_step]`
    cell_data: Vec<Vec<f32>>,
    step_data: Vec<Vec<f32>>,
}

impl HistoryBuffer {
    pub fn new(cells: usize, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            cells,
            capacity,
            start_step: 0,
            filled: 0,
            cell_data: vec![vec![0.0; cells * capacity]; Signal::CELL.len()],
            step_data: vec![vec![0.0; capacity]; Signal::STEP.len()],
        }
    }

    pub fn cells(&self) -> usize {
        self.cells
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Committed rows not yet drained.
    pub fn len(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    pub fn is_full(&self) -> bool {
        self.filled >= self.capacity
    }

    /// Global index of the first buffered step.
    pub fn start_step(&self) -> usize {
        self.start_step
    }

    /// Stage a per-cell value for the open row. Out-of-range writes are ignored.
    pub fn record_cell(&mut self, signal: Signal, cell: usize, value: f64) {
        if signal.shape() != SignalShape::PerCell || cell >= self.cells || self.is_full() {
            return;
        }
        let idx = cell * self.capacity + self.filled;
        self.cell_data[signal.slot()][idx] = value as f32;
    }

    /// Stage a per-step value for the open row.
    pub fn record_step(&mut self, signal: Signal, value: f64) {
        if signal.shape() != SignalShape::PerStep || self.is_full() {
            return;
        }
        self.step_data[signal.slot()][self.filled] = value as f32;
    }

    /// Close the open row. Returns `true` when the buffer is now full.
    pub fn commit_step(&mut self) -> bool {
        if !self.is_full() {
            self.filled += 1;
        }
        self.is_full()
    }

    /// Take the committed rows as one chunk per signal and reset the buffer
    /// to continue after them.
    pub fn drain(&mut self) -> Vec<(Signal, ChunkRecord)> {
        let steps = self.filled;
        let start = self.start_step as u64;
        let mut out = Vec::with_capacity(Signal::CELL.len() + Signal::STEP.len());

        for (slot, sig) in Signal::CELL.iter().enumerate() {
            let data = &self.cell_data[slot];
            let mut values = Vec::with_capacity(self.cells * steps);
            for cell in 0..self.cells {
                let row = cell * self.capacity;
                values.extend_from_slice(&data[row..row + steps]);
            }
            out.push((
                *sig,
                ChunkRecord {
                    start_step: start,
                    steps: steps as u32,
                    cells: self.cells as u32,
                    values,
                },
            ));
        }
        for (slot, sig) in Signal::STEP.iter().enumerate() {
            out.push((
                *sig,
                ChunkRecord {
                    start_step: start,
                    steps: steps as u32,
                    cells: 1,
                    values: self.step_data[slot][..steps].to_vec(),
                },
            ));
        }

        self.start_step += steps;
        self.filled = 0;
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_is_cell_major() {
        let mut buf = HistoryBuffer::new(2, 4);
        for step in 0..3 {
            for cell in 0..2 {
                buf.record_cell(Signal::Soc, cell, (10 * cell + step) as f64);
            }
            buf.record_step(Signal::Dt, 60.0);
            buf.commit_step();
        }
        assert_eq!(buf.len(), 3);

        let chunks = buf.drain();
        let (_, soc) = chunks.iter().find(|(s, _)| *s == Signal::Soc).unwrap();
        assert_eq!(soc.steps, 3);
        assert_eq!(soc.values, vec![0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
        assert_eq!(soc.value(1, 2), Some(12.0));

        let (_, dt) = chunks.iter().find(|(s, _)| *s == Signal::Dt).unwrap();
        assert_eq!(dt.values, vec![60.0; 3]);

        assert!(buf.is_empty());
        assert_eq!(buf.start_step(), 3);
    }

    #[test]
    fn full_buffer_reports_and_stops_growing() {
        let mut buf = HistoryBuffer::new(1, 2);
        assert!(!buf.commit_step());
        assert!(buf.commit_step());
        assert!(buf.commit_step());
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn wrong_shape_writes_are_ignored() {
        let mut buf = HistoryBuffer::new(1, 1);
        buf.record_step(Signal::Soc, 5.0);
        buf.record_cell(Signal::Dt, 0, 5.0);
        buf.record_cell(Signal::Soc, 3, 5.0);
        buf.commit_step();
        let chunks = buf.drain();
        assert!(chunks.iter().all(|(_, c)| c.values.iter().all(|v| *v == 0.0)));
    }
}
