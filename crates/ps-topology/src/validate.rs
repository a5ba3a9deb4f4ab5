//! Topology validation logic.

use crate::cell::{Cell, CellLabel};
use crate::error::{TopologyError, TopologyResult};

/// Every cell has a well-formed label and refers to an existing group.
pub(crate) fn validate_cells(cells: &[Cell], num_groups: usize) -> TopologyResult<()> {
    if cells.is_empty() {
        return Err(TopologyError::Empty);
    }

    for cell in cells {
        let label: CellLabel = cell.label.parse()?;
        if label.row != cell.row || label.col != cell.col || label.layer != cell.layer {
            return Err(TopologyError::InvalidLabel(cell.label.clone()));
        }
        if cell.group.idx() >= num_groups {
            return Err(TopologyError::InvalidGroupRef {
                cell: cell.id.idx(),
                group: cell.group.idx(),
            });
        }
    }
    Ok(())
}

/// Every group owns at least one cell.
pub(crate) fn validate_membership(group_offsets: &[usize]) -> TopologyResult<()> {
    for (g, pair) in group_offsets.windows(2).enumerate() {
        if pair[1] == pair[0] {
            return Err(TopologyError::EmptyGroup { group: g });
        }
    }
    Ok(())
}
