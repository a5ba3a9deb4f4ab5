//! Linear solve of one parallel group.

use nalgebra::{DMatrix, DVector};
use ps_params::EcmParams;

use crate::rc::{Decay, relax, terminal_voltage};

/// Inputs for one cell of a group: this step's parameters and the RC
/// voltages left by the previous step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CellBranch {
    pub params: EcmParams,
    pub v_rc1: f64,
    pub v_rc2: f64,
}

impl CellBranch {
    /// RC voltages and terminal voltage after carrying `current` for `dt`.
    pub fn advance(&self, current: f64, dt: f64) -> (f64, f64, f64) {
        let decay = Decay::new(&self.params, dt);
        let v_rc1 = relax(self.v_rc1, self.params.r1, current, decay.e1);
        let v_rc2 = relax(self.v_rc2, self.params.r2, current, decay.e2);
        let v = terminal_voltage(&self.params, current, v_rc1, v_rc2);
        (v_rc1, v_rc2, v)
    }
}

/// Branch currents and the shared node voltage of one group.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupSolution {
    pub currents: Vec<f64>,
    pub v_node: f64,
    /// The system had no unique solution; currents are zero.
    pub singular: bool,
}

impl GroupSolution {
    fn singular(n: usize) -> Self {
        Self {
            currents: vec![0.0; n],
            v_node: 0.0,
            singular: true,
        }
    }
}

/// Solve the (N+1)×(N+1) system of a group carrying `i_group`.
///
/// Row i: `R_eff_i · I_i + V_node = K_i`; last row: `Σ I_i = I_group`.
/// A singular or non-finite system yields zero currents and `V_node = 0`
/// with `singular` set; it never fails.
pub fn solve_group(cells: &[CellBranch], r_p: f64, i_group: f64, dt: f64) -> GroupSolution {
    let n = cells.len();
    if n == 0 {
        return GroupSolution::default();
    }

    let dim = n + 1;
    let mut a = DMatrix::<f64>::zeros(dim, dim);
    let mut b = DVector::<f64>::zeros(dim);

    for (i, cell) in cells.iter().enumerate() {
        let decay = Decay::new(&cell.params, dt);
        a[(i, i)] = decay.effective_resistance(&cell.params, r_p);
        a[(i, n)] = 1.0;
        b[i] = decay.source_voltage(&cell.params, cell.v_rc1, cell.v_rc2);
        a[(n, i)] = 1.0;
    }
    b[n] = i_group;

    if !a.iter().chain(b.iter()).all(|v| v.is_finite()) {
        return GroupSolution::singular(n);
    }

    match a.lu().solve(&b) {
        Some(x) if x.iter().all(|v| v.is_finite()) => GroupSolution {
            currents: x.rows(0, n).iter().copied().collect(),
            v_node: x[n],
            singular: false,
        },
        _ => GroupSolution::singular(n),
    }
}
