//! ps-topology: static cell/group layout of a pack.
//!
//! Provides:
//! - Cell records (label, grid position, classification, neighbours)
//! - Parallel groups with compact membership lists
//! - Incremental topology builder with validation
//! - Pack construction from layer grids and a busbar connection type
//!
//! # Example
//!
//! ```
//! use ps_topology::TopologyBuilder;
//!
//! let mut builder = TopologyBuilder::new();
//! let g = builder.add_group();
//! builder.add_plain_cell(g);
//! builder.add_plain_cell(g);
//! let topology = builder.build().unwrap();
//!
//! assert_eq!(topology.num_cells(), 2);
//! assert_eq!(topology.num_groups(), 1);
//! ```

pub mod builder;
pub mod cell;
pub mod error;
pub mod pack;
pub mod topology;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use builder::TopologyBuilder;
pub use cell::{Cell, CellDims, CellKind, CellLabel, Neighbours};
pub use error::{TopologyError, TopologyResult};
pub use pack::{ConnectionType, LayerSpec, build_pack};
pub use topology::{ParallelGroup, Topology};
