//! Pack construction from layer grids and a busbar connection type.

use std::fmt;
use std::str::FromStr;

use ps_core::{CellId, GroupId};

use crate::builder::{CellPlacement, TopologyBuilder};
use crate::cell::{CellDims, CellKind, Neighbours};
use crate::error::{TopologyError, TopologyResult};
use crate::topology::Topology;

/// How busbars tie the grid of a layer together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionType {
    /// Every row is one parallel group; rows are chained in series.
    RowSeriesColumnParallel,
    /// Every column is one parallel group; columns are chained in series.
    RowParallelColumnSeries,
}

impl ConnectionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionType::RowSeriesColumnParallel => "row_series_column_parallel",
            ConnectionType::RowParallelColumnSeries => "row_parallel_column_series",
        }
    }

    fn groups_per_layer(self, layer: &LayerSpec) -> usize {
        match self {
            ConnectionType::RowSeriesColumnParallel => layer.n_rows,
            ConnectionType::RowParallelColumnSeries => layer.n_cols,
        }
    }

    /// 0-based group slot within the layer for a 1-based grid position.
    fn group_slot(self, row: usize, col: usize) -> usize {
        match self {
            ConnectionType::RowSeriesColumnParallel => row - 1,
            ConnectionType::RowParallelColumnSeries => col - 1,
        }
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionType {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "row_series_column_parallel" => Ok(ConnectionType::RowSeriesColumnParallel),
            "row_parallel_column_series" => Ok(ConnectionType::RowParallelColumnSeries),
            other => Err(TopologyError::UnsupportedConnection(other.to_string())),
        }
    }
}

/// One layer of cells on a rectangular grid.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    pub grid_type: String,
    pub n_rows: usize,
    pub n_cols: usize,
    /// Column pitch (m)
    pub pitch_x: f64,
    /// Row pitch (m)
    pub pitch_y: f64,
    /// Layer height (m)
    pub z_center: f64,
}

impl LayerSpec {
    pub fn cell_count(&self) -> usize {
        self.n_rows * self.n_cols
    }
}

/// Lay out all layers, classify cells and assign busbar groups.
///
/// `cell_dims` supplies dimensions in layer/row/column order; it must have at
/// least one entry per grid position. Groups are numbered layer by layer, and
/// the last group of a layer is wired in series to the first group of the next.
pub fn build_pack(
    layers: &[LayerSpec],
    cell_dims: &[CellDims],
    connection: ConnectionType,
) -> TopologyResult<Topology> {
    let expected: usize = layers.iter().map(LayerSpec::cell_count).sum();
    if cell_dims.len() < expected {
        return Err(TopologyError::CellCountMismatch {
            expected,
            found: cell_dims.len(),
        });
    }

    let mut builder = TopologyBuilder::new();
    let mut layer_groups: Vec<Vec<GroupId>> = Vec::with_capacity(layers.len());
    let mut dims = cell_dims.iter();

    for (l, layer) in layers.iter().enumerate() {
        if layer.n_rows == 0 || layer.n_cols == 0 {
            return Err(TopologyError::EmptyLayer {
                layer: l + 1,
                rows: layer.n_rows,
                cols: layer.n_cols,
            });
        }

        let groups: Vec<GroupId> = (0..connection.groups_per_layer(layer))
            .map(|_| builder.add_group())
            .collect();
        let base = builder.cells().len();

        for row in 1..=layer.n_rows {
            for col in 1..=layer.n_cols {
                let placement = CellPlacement {
                    layer: l + 1,
                    row,
                    col,
                    position: [
                        (col - 1) as f64 * layer.pitch_x,
                        (row - 1) as f64 * layer.pitch_y,
                        layer.z_center,
                    ],
                    dims: dims.next().cloned().unwrap_or_default(),
                    kind: CellKind::classify(row, col, layer.n_rows, layer.n_cols),
                };
                builder.add_cell(groups[connection.group_slot(row, col)], placement);
            }
        }

        wire_layer(&mut builder, layer, base, connection);
        layer_groups.push(groups);
    }

    for l in 1..layer_groups.len() {
        let (Some(prev_last), Some(next_first)) = (layer_groups[l - 1].last(), layer_groups[l].first())
        else {
            continue;
        };
        let prev = members(&builder, *prev_last);
        let next = members(&builder, *next_first);
        if prev.len() != next.len() {
            return Err(TopologyError::LayerMismatch {
                layer: l + 1,
                prev: prev.len(),
                next: next.len(),
            });
        }
        for (p, n) in prev.into_iter().zip(next) {
            builder.set_next_series(p, Some(n));
        }
    }

    builder.build()
}

fn members(builder: &TopologyBuilder, group: GroupId) -> Vec<CellId> {
    builder
        .cells()
        .iter()
        .filter(|c| c.group == group)
        .map(|c| c.id)
        .collect()
}

/// Neighbour lists and in-layer series links for the cells of one layer.
fn wire_layer(
    builder: &mut TopologyBuilder,
    layer: &LayerSpec,
    base: usize,
    connection: ConnectionType,
) {
    let (n_rows, n_cols) = (layer.n_rows, layer.n_cols);
    let id_at = |row: usize, col: usize| CellId::from_index((base + (row - 1) * n_cols + (col - 1)) as u32);

    for row in 1..=n_rows {
        for col in 1..=n_cols {
            let mut neighbours = Neighbours::default();
            if col > 1 {
                neighbours.row.push(id_at(row, col - 1));
            }
            if col < n_cols {
                neighbours.row.push(id_at(row, col + 1));
            }
            if row > 1 {
                neighbours.col.push(id_at(row - 1, col));
            }
            if row < n_rows {
                neighbours.col.push(id_at(row + 1, col));
            }
            for (dr, dc) in [(-1i64, -1i64), (-1, 1), (1, -1), (1, 1)] {
                let r = row as i64 + dr;
                let c = col as i64 + dc;
                if r >= 1 && r <= n_rows as i64 && c >= 1 && c <= n_cols as i64 {
                    neighbours.diagonal.push(id_at(r as usize, c as usize));
                }
            }

            let next = match connection {
                ConnectionType::RowSeriesColumnParallel if row < n_rows => Some(id_at(row + 1, col)),
                ConnectionType::RowParallelColumnSeries if col < n_cols => Some(id_at(row, col + 1)),
                _ => None,
            };

            let id = id_at(row, col);
            builder.set_neighbours(id, neighbours);
            builder.set_next_series(id, next);
        }
    }
}
