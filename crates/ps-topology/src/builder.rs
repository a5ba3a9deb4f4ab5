//! Incremental topology builder.

use ps_core::{CellId, GroupId};

use crate::cell::{Cell, CellDims, CellKind, CellLabel, Neighbours};
use crate::error::TopologyResult;
use crate::topology::Topology;
use crate::validate;

/// Grid placement of a cell being added to a builder.
#[derive(Debug, Clone, PartialEq)]
pub struct CellPlacement {
    pub layer: usize,
    pub row: usize,
    pub col: usize,
    pub position: [f64; 3],
    pub dims: CellDims,
    pub kind: CellKind,
}

/// Builder for constructing a topology incrementally.
///
/// Use `add_group` and `add_cell` to build up the pack,
/// then call `build()` to validate and freeze it into an immutable `Topology`.
#[derive(Debug, Default)]
pub struct TopologyBuilder {
    cells: Vec<Cell>,
    next_group: u32,
}

impl TopologyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new parallel group at the end of the series chain.
    pub fn add_group(&mut self) -> GroupId {
        let id = GroupId::from_index(self.next_group);
        self.next_group += 1;
        id
    }

    /// Add a cell to `group` and return its id.
    pub fn add_cell(&mut self, group: GroupId, placement: CellPlacement) -> CellId {
        let id = CellId::from_index(self.cells.len() as u32);
        let label = CellLabel {
            row: placement.row,
            col: placement.col,
            layer: placement.layer,
        };
        self.cells.push(Cell {
            id,
            group,
            label: label.to_string(),
            layer: placement.layer,
            row: placement.row,
            col: placement.col,
            position: placement.position,
            dims: placement.dims,
            kind: placement.kind,
            neighbours: Neighbours::default(),
            next_series: None,
        });
        id
    }

    /// Add a cell with no geometry (single row, one column per cell).
    pub fn add_plain_cell(&mut self, group: GroupId) -> CellId {
        let col = self.cells.len() + 1;
        self.add_cell(
            group,
            CellPlacement {
                layer: 1,
                row: group.idx() + 1,
                col,
                position: [0.0; 3],
                dims: CellDims::new(),
                kind: CellKind::Corner,
            },
        )
    }

    pub fn set_neighbours(&mut self, cell: CellId, neighbours: Neighbours) {
        if let Some(c) = self.cells.get_mut(cell.idx()) {
            c.neighbours = neighbours;
        }
    }

    pub fn set_next_series(&mut self, cell: CellId, next: Option<CellId>) {
        if let Some(c) = self.cells.get_mut(cell.idx()) {
            c.next_series = next;
        }
    }

    /// Cells added so far.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Build and validate the topology.
    ///
    /// This checks labels and group references and constructs compact
    /// group membership lists.
    pub fn build(self) -> TopologyResult<Topology> {
        validate::validate_cells(&self.cells, self.next_group as usize)?;

        let (group_offsets, group_cells) =
            Self::build_membership(&self.cells, self.next_group as usize);

        validate::validate_membership(&group_offsets)?;

        Ok(Topology {
            cells: self.cells,
            group_offsets,
            group_cells,
        })
    }

    /// Counting sort of cells by group; ids stay ascending inside a group.
    fn build_membership(cells: &[Cell], num_groups: usize) -> (Vec<usize>, Vec<CellId>) {
        let mut counts = vec![0usize; num_groups];
        for cell in cells {
            counts[cell.group.idx()] += 1;
        }

        let mut offsets = Vec::with_capacity(num_groups + 1);
        offsets.push(0);
        for count in &counts {
            let last = offsets[offsets.len() - 1];
            offsets.push(last + count);
        }

        let mut cursor = offsets[..num_groups].to_vec();
        let mut members = vec![CellId::from_index(0); cells.len()];
        for cell in cells {
            let g = cell.group.idx();
            members[cursor[g]] = cell.id;
            cursor[g] += 1;
        }

        (offsets, members)
    }
}
