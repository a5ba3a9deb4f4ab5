//! Cell records.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use ps_core::{CellId, GroupId};

use crate::error::TopologyError;

/// Free-form cell dimensions (e.g. `radius`, `height`) in metres.
pub type CellDims = BTreeMap<String, f64>;

/// Position of a cell inside its layer grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    Corner,
    Edge,
    Center,
}

impl CellKind {
    pub fn classify(row: usize, col: usize, n_rows: usize, n_cols: usize) -> Self {
        let row_edge = row == 1 || row == n_rows;
        let col_edge = col == 1 || col == n_cols;
        match (row_edge, col_edge) {
            (true, true) => CellKind::Corner,
            (true, false) | (false, true) => CellKind::Edge,
            (false, false) => CellKind::Center,
        }
    }
}

/// Grid label `R<row>C<col>L<layer>`, all 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellLabel {
    pub row: usize,
    pub col: usize,
    pub layer: usize,
}

impl fmt::Display for CellLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}C{}L{}", self.row, self.col, self.layer)
    }
}

impl FromStr for CellLabel {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TopologyError::InvalidLabel(s.to_string());
        let rest = s.strip_prefix('R').ok_or_else(invalid)?;
        let (row, rest) = rest.split_once('C').ok_or_else(invalid)?;
        let (col, layer) = rest.split_once('L').ok_or_else(invalid)?;
        let number = |part: &str| -> Result<usize, TopologyError> {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            part.parse().map_err(|_| invalid())
        };
        Ok(Self {
            row: number(row)?,
            col: number(col)?,
            layer: number(layer)?,
        })
    }
}

/// Same-layer neighbours, stored as global cell ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Neighbours {
    pub row: Vec<CellId>,
    pub col: Vec<CellId>,
    pub diagonal: Vec<CellId>,
}

/// Immutable topology record of one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub id: CellId,
    pub group: GroupId,
    pub label: String,
    pub layer: usize,
    pub row: usize,
    pub col: usize,
    /// Centre position (x, y, z) in metres.
    pub position: [f64; 3],
    pub dims: CellDims,
    pub kind: CellKind,
    pub neighbours: Neighbours,
    /// Next cell along the series busbar path, if any.
    pub next_series: Option<CellId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_round_trip() {
        let label: CellLabel = "R3C12L2".parse().unwrap();
        assert_eq!(
            label,
            CellLabel {
                row: 3,
                col: 12,
                layer: 2
            }
        );
        assert_eq!(label.to_string(), "R3C12L2");
    }

    #[test]
    fn label_rejects_garbage() {
        for bad in ["", "C1R1L1", "R1C1", "RxC1L1", "R1C-1L1", "R1C1L"] {
            assert!(
                matches!(bad.parse::<CellLabel>(), Err(TopologyError::InvalidLabel(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn classification() {
        assert_eq!(CellKind::classify(1, 1, 3, 3), CellKind::Corner);
        assert_eq!(CellKind::classify(1, 2, 3, 3), CellKind::Edge);
        assert_eq!(CellKind::classify(2, 3, 3, 3), CellKind::Edge);
        assert_eq!(CellKind::classify(2, 2, 3, 3), CellKind::Center);
        assert_eq!(CellKind::classify(1, 1, 1, 1), CellKind::Corner);
    }
}
