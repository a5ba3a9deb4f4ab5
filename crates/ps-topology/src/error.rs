//! Topology-specific error types.

use thiserror::Error;

/// Topology construction and validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// Connection type string is not one of the supported busbar layouts.
    #[error("Unsupported connection type: {0}")]
    UnsupportedConnection(String),

    /// A cell label does not follow `R<row>C<col>L<layer>`.
    #[error("Invalid cell label format: {0}")]
    InvalidLabel(String),

    /// Fewer cell definitions than grid positions.
    #[error("Layer grid needs {expected} cells but {found} were defined")]
    CellCountMismatch { expected: usize, found: usize },

    /// A layer has an empty grid.
    #[error("Layer {layer} has an empty grid ({rows}x{cols})")]
    EmptyLayer { layer: usize, rows: usize, cols: usize },

    /// Adjacent layers cannot be chained group to group.
    #[error("Cannot chain layer {layer}: group sizes differ ({prev} vs {next})")]
    LayerMismatch {
        layer: usize,
        prev: usize,
        next: usize,
    },

    /// A cell refers to a group that does not exist.
    #[error("Cell {cell} refers to non-existent group {group}")]
    InvalidGroupRef { cell: usize, group: usize },

    /// A group has no cells.
    #[error("Parallel group {group} has no cells")]
    EmptyGroup { group: usize },

    /// The pack has no cells at all.
    #[error("Topology has no cells")]
    Empty,
}

pub type TopologyResult<T> = Result<T, TopologyError>;
