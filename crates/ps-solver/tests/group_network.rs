//! Group solve properties: KCL, shared node voltage, symmetric split.

use proptest::prelude::*;
use ps_params::{EcmParams, Mode};
use ps_solver::{
    BisectionLimiter, CellBranch, CurrentLimitPolicy, ModuleSolver, VoltageLimits, solve_group,
};
use ps_topology::TopologyBuilder;

fn branch(ocv: f64, r0: f64, r1: f64, c1: f64, v_rc1: f64) -> CellBranch {
    CellBranch {
        params: EcmParams {
            ocv,
            r0,
            r1,
            r2: 0.01,
            c1,
            c2: 10_000.0,
        },
        v_rc1,
        v_rc2: 0.0,
    }
}

fn arb_branch() -> impl Strategy<Value = CellBranch> {
    (3.0f64..4.2, 0.005f64..0.05, 0.0f64..0.02, 0.0f64..5000.0, -0.05f64..0.05)
        .prop_map(|(ocv, r0, r1, c1, v)| branch(ocv, r0, r1, c1, v))
}

proptest! {
    #[test]
    fn kcl_holds_for_any_group(
        cells in prop::collection::vec(arb_branch(), 1..8),
        i_group in -50.0f64..50.0,
        dt in 0.1f64..600.0,
        r_p in 0.0f64..0.005,
    ) {
        let sol = solve_group(&cells, r_p, i_group, dt);
        prop_assert!(!sol.singular);
        let sum: f64 = sol.currents.iter().sum();
        prop_assert!((sum - i_group).abs() < 1e-8 * (1.0 + i_group.abs()));

        // every branch equation sees the same node voltage
        for (cell, i) in cells.iter().zip(&sol.currents) {
            let d = ps_solver::Decay::new(&cell.params, dt);
            let v = d.source_voltage(&cell.params, cell.v_rc1, cell.v_rc2)
                - d.effective_resistance(&cell.params, r_p) * i;
            prop_assert!((v - sol.v_node).abs() < 1e-8);
        }
    }
}

#[test]
fn identical_cells_split_equally() {
    let c = branch(3.7, 0.02, 0.01, 1000.0, 0.0);
    let sol = solve_group(&[c, c], 0.001, 6.0, 60.0);
    assert!((sol.currents[0] - 3.0).abs() < 1e-12);
    assert!((sol.currents[1] - 3.0).abs() < 1e-12);
}

#[test]
fn limiter_finds_safe_discharge_current() {
    let mut b = TopologyBuilder::new();
    let g = b.add_group();
    b.add_plain_cell(g);
    b.add_plain_cell(g);
    let topo = b.build().unwrap();

    let branches = [branch(3.0, 0.02, 0.01, 1000.0, 0.0); 2];
    let solver = ModuleSolver::new(&topo, 0.0);
    let limits = VoltageLimits::new(4.2, Some(2.9));
    let dt = 60.0;

    let requested = 40.0;
    let mut violates = |candidate: f64| {
        let sol = solver.solve(&branches, candidate, dt).unwrap();
        let v = solver.terminal_voltages(&branches, &sol, dt);
        limits.first_violation(Mode::Discharge, &v).is_some()
    };
    assert!(violates(requested));

    let committed = BisectionLimiter::default()
        .limit(requested, &mut violates)
        .committed(requested);
    assert!(committed > 0.0 && committed < requested);
    assert!(!violates(committed));
    assert!(violates(committed + 2.0 * requested / 2f64.powi(20)));
}
