//! Pack document to topology.

use ps_topology::{CellDims, ConnectionType, LayerSpec, Topology, build_pack};

use crate::ProjectResult;
use crate::schema::{LayerDef, PackDoc};

impl From<&LayerDef> for LayerSpec {
    fn from(def: &LayerDef) -> Self {
        LayerSpec {
            grid_type: def.grid_type.clone(),
            n_rows: def.n_rows,
            n_cols: def.n_cols,
            pitch_x: def.pitch_x,
            pitch_y: def.pitch_y,
            z_center: def.z_center,
        }
    }
}

impl PackDoc {
    pub fn connection(&self) -> ProjectResult<ConnectionType> {
        Ok(self.connection_type.parse()?)
    }

    pub fn layer_specs(&self) -> Vec<LayerSpec> {
        self.meta.layers.iter().map(LayerSpec::from).collect()
    }

    /// Lay out cells, classify them and assign busbar groups.
    pub fn build_topology(&self) -> ProjectResult<Topology> {
        let dims: Vec<CellDims> = self.cells.iter().map(|c| c.dims.clone()).collect();
        let topology = build_pack(&self.layer_specs(), &dims, self.connection()?)?;
        if self.cells.len() > topology.num_cells() {
            tracing::warn!(
                defined = self.cells.len(),
                used = topology.num_cells(),
                "pack defines more cells than its layer grids hold, ignoring the rest"
            );
        }
        Ok(topology)
    }
}
