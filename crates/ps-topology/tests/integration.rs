//! Integration tests for ps-topology.

use ps_core::{CellId, GroupId};
use ps_topology::{CellDims, CellKind, ConnectionType, LayerSpec, TopologyError, build_pack};

fn grid(rows: usize, cols: usize) -> LayerSpec {
    LayerSpec {
        grid_type: "rectangular".to_string(),
        n_rows: rows,
        n_cols: cols,
        pitch_x: 0.021,
        pitch_y: 0.021,
        z_center: 0.0,
    }
}

fn dims(n: usize) -> Vec<CellDims> {
    let mut d = CellDims::new();
    d.insert("radius".to_string(), 0.0105);
    d.insert("height".to_string(), 0.07);
    vec![d; n]
}

#[test]
fn rows_in_series_columns_in_parallel() {
    // 3 rows x 2 cols: three groups of two cells
    let topo = build_pack(&[grid(3, 2)], &dims(6), ConnectionType::RowSeriesColumnParallel).unwrap();

    assert_eq!(topo.num_cells(), 6);
    assert_eq!(topo.num_groups(), 3);
    for group in topo.groups() {
        assert_eq!(group.len(), 2);
        let row = topo.cell(group.cells[0]).unwrap().row;
        assert!(group.cells.iter().all(|&c| topo.cell(c).unwrap().row == row));
    }

    // R1C1 -> R2C1 -> R3C1
    let first = topo.cell(CellId::from_index(0)).unwrap();
    assert_eq!(first.next_series, Some(CellId::from_index(2)));
    let last = topo.cell(CellId::from_index(4)).unwrap();
    assert_eq!(last.next_series, None);
}

#[test]
fn rows_in_parallel_columns_in_series() {
    let topo = build_pack(&[grid(2, 4)], &dims(8), ConnectionType::RowParallelColumnSeries).unwrap();

    assert_eq!(topo.num_groups(), 4);
    assert_eq!(topo.max_group_len(), 2);
    let g0 = topo.group_cells(GroupId::from_index(0));
    assert_eq!(g0, &[CellId::from_index(0), CellId::from_index(4)]);

    let c = topo.cell(CellId::from_index(1)).unwrap();
    assert_eq!(c.next_series, Some(CellId::from_index(2)));
    let end = topo.cell(CellId::from_index(3)).unwrap();
    assert_eq!(end.next_series, None);
}

#[test]
fn classification_and_neighbours() {
    let topo = build_pack(&[grid(3, 3)], &dims(9), ConnectionType::RowSeriesColumnParallel).unwrap();
    let kinds: Vec<CellKind> = topo.cells().iter().map(|c| c.kind).collect();
    assert_eq!(kinds.iter().filter(|k| **k == CellKind::Corner).count(), 4);
    assert_eq!(kinds.iter().filter(|k| **k == CellKind::Edge).count(), 4);
    assert_eq!(kinds.iter().filter(|k| **k == CellKind::Center).count(), 1);

    let center = topo.cell(CellId::from_index(4)).unwrap();
    assert_eq!(center.label, "R2C2L1");
    assert_eq!(center.neighbours.row.len(), 2);
    assert_eq!(center.neighbours.col.len(), 2);
    assert_eq!(center.neighbours.diagonal.len(), 4);

    let corner = topo.cell(CellId::from_index(0)).unwrap();
    assert_eq!(corner.neighbours.row, vec![CellId::from_index(1)]);
    assert_eq!(corner.neighbours.col, vec![CellId::from_index(3)]);
    assert_eq!(corner.neighbours.diagonal, vec![CellId::from_index(4)]);
}

#[test]
fn layers_chain_last_group_to_first() {
    let mut upper = grid(2, 2);
    upper.z_center = 0.08;
    let topo = build_pack(
        &[grid(2, 2), upper],
        &dims(8),
        ConnectionType::RowSeriesColumnParallel,
    )
    .unwrap();

    assert_eq!(topo.num_groups(), 4);
    // last group of layer 1 is R2 (cells 2,3); first group of layer 2 is R1 (cells 4,5)
    assert_eq!(
        topo.cell(CellId::from_index(2)).unwrap().next_series,
        Some(CellId::from_index(4))
    );
    assert_eq!(
        topo.cell(CellId::from_index(3)).unwrap().next_series,
        Some(CellId::from_index(5))
    );
    let top = topo.cell(CellId::from_index(7)).unwrap();
    assert_eq!(top.label, "R2C2L2");
    assert!((top.position[2] - 0.08).abs() < 1e-12);
}

#[test]
fn mismatched_layers_are_rejected() {
    let err = build_pack(
        &[grid(2, 2), grid(2, 3)],
        &dims(10),
        ConnectionType::RowSeriesColumnParallel,
    )
    .unwrap_err();
    assert_eq!(
        err,
        TopologyError::LayerMismatch {
            layer: 2,
            prev: 2,
            next: 3
        }
    );
}

#[test]
fn too_few_cells_is_a_config_error() {
    let err = build_pack(&[grid(2, 2)], &dims(3), ConnectionType::RowSeriesColumnParallel)
        .unwrap_err();
    assert_eq!(
        err,
        TopologyError::CellCountMismatch {
            expected: 4,
            found: 3
        }
    );
}

#[test]
fn empty_layer_is_rejected() {
    let err = build_pack(&[grid(0, 2)], &[], ConnectionType::RowSeriesColumnParallel).unwrap_err();
    assert!(matches!(err, TopologyError::EmptyLayer { layer: 1, .. }));
}
