//! Validated, immutable pack topology.

use ps_core::{CellId, GroupId};

use crate::cell::Cell;

/// View of one parallel group: cells sharing a node pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParallelGroup<'a> {
    pub id: GroupId,
    pub cells: &'a [CellId],
}

impl ParallelGroup<'_> {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// The topology: cells plus their partition into parallel groups.
///
/// Groups are ordered by ascending id and that order is the series chain of
/// the module. Membership is stored compactly: group g's cells are
/// `group_cells[group_offsets[g]..group_offsets[g+1]]`, ascending by cell id.
#[derive(Debug, Clone)]
pub struct Topology {
    pub(crate) cells: Vec<Cell>,
    pub(crate) group_offsets: Vec<usize>,
    pub(crate) group_cells: Vec<CellId>,
}

impl Topology {
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(id.idx())
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn num_groups(&self) -> usize {
        self.group_offsets.len().saturating_sub(1)
    }

    /// Cells of group `id`, empty if the group does not exist.
    pub fn group_cells(&self, id: GroupId) -> &[CellId] {
        let g = id.idx();
        if g + 1 >= self.group_offsets.len() {
            return &[];
        }
        &self.group_cells[self.group_offsets[g]..self.group_offsets[g + 1]]
    }

    /// Groups in series order.
    pub fn groups(&self) -> impl ExactSizeIterator<Item = ParallelGroup<'_>> + '_ {
        (0..self.num_groups()).map(move |g| {
            let id = GroupId::from_index(g as u32);
            ParallelGroup {
                id,
                cells: self.group_cells(id),
            }
        })
    }

    pub fn group_of(&self, cell: CellId) -> Option<GroupId> {
        self.cell(cell).map(|c| c.group)
    }

    /// Largest group size (cells in parallel).
    pub fn max_group_len(&self) -> usize {
        self.groups().map(|g| g.len()).max().unwrap_or(0)
    }
}
