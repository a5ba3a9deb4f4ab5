//! Solve every group of a module at one module current.

use ps_core::GroupId;
use ps_topology::Topology;
use rayon::prelude::*;

use crate::error::{SolverError, SolverResult};
use crate::group::{CellBranch, GroupSolution, solve_group};

/// Solution of all groups at one candidate module current.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModuleSolution {
    /// Module current the groups were solved for (A).
    pub current: f64,
    /// Branch current per cell, indexed by cell id.
    pub cell_currents: Vec<f64>,
    /// Node voltage per group, in series order.
    pub node_voltages: Vec<f64>,
    /// Groups whose system was singular this solve.
    pub singular_groups: Vec<GroupId>,
}

impl ModuleSolution {
    /// Module terminal voltage: series sum of group node voltages minus the
    /// drop across the series interconnects.
    pub fn module_voltage(&self, r_s: f64) -> f64 {
        let sum: f64 = self.node_voltages.iter().sum();
        sum - self.current * self.node_voltages.len() as f64 * r_s
    }
}

/// Group solver bound to a topology.
///
/// Every group carries the full module current, since groups are in series.
#[derive(Debug, Clone, Copy)]
pub struct ModuleSolver<'t> {
    topology: &'t Topology,
    r_p: f64,
    parallel: bool,
}

impl<'t> ModuleSolver<'t> {
    pub fn new(topology: &'t Topology, r_p: f64) -> Self {
        Self {
            topology,
            r_p,
            parallel: false,
        }
    }

    /// Fan group solves out over the rayon pool. Results are identical to
    /// the sequential order.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn topology(&self) -> &'t Topology {
        self.topology
    }

    /// Solve all groups; `branches` is indexed by cell id.
    pub fn solve(
        &self,
        branches: &[CellBranch],
        i_module: f64,
        dt: f64,
    ) -> SolverResult<ModuleSolution> {
        let n_cells = self.topology.num_cells();
        if branches.len() != n_cells {
            return Err(SolverError::BranchCount {
                expected: n_cells,
                found: branches.len(),
            });
        }

        let solve_one = |cells: &[ps_core::CellId]| -> GroupSolution {
            let inputs: Vec<CellBranch> = cells.iter().map(|c| branches[c.idx()]).collect();
            solve_group(&inputs, self.r_p, i_module, dt)
        };

        let groups: Vec<_> = self.topology.groups().collect();
        let solutions: Vec<GroupSolution> = if self.parallel {
            groups.par_iter().map(|g| solve_one(g.cells)).collect()
        } else {
            groups.iter().map(|g| solve_one(g.cells)).collect()
        };

        let mut out = ModuleSolution {
            current: i_module,
            cell_currents: vec![0.0; n_cells],
            node_voltages: Vec::with_capacity(groups.len()),
            singular_groups: Vec::new(),
        };
        for (group, sol) in groups.iter().zip(solutions) {
            if sol.singular {
                tracing::debug!(group = group.id.index(), "singular group matrix");
                out.singular_groups.push(group.id);
            }
            for (cell, current) in group.cells.iter().zip(&sol.currents) {
                out.cell_currents[cell.idx()] = *current;
            }
            out.node_voltages.push(sol.v_node);
        }
        Ok(out)
    }

    /// Provisional terminal voltage of every cell under `solution`.
    pub fn terminal_voltages(
        &self,
        branches: &[CellBranch],
        solution: &ModuleSolution,
        dt: f64,
    ) -> Vec<f64> {
        branches
            .iter()
            .zip(&solution.cell_currents)
            .map(|(b, i)| b.advance(*i, dt).2)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ps_params::EcmParams;
    use ps_topology::TopologyBuilder;

    fn branch() -> CellBranch {
        CellBranch {
            params: EcmParams {
                ocv: 3.7,
                r0: 0.02,
                r1: 0.01,
                r2: 0.01,
                c1: 1000.0,
                c2: 10_000.0,
            },
            v_rc1: 0.0,
            v_rc2: 0.0,
        }
    }

    fn two_by_two() -> Topology {
        let mut b = TopologyBuilder::new();
        for _ in 0..2 {
            let g = b.add_group();
            b.add_plain_cell(g);
            b.add_plain_cell(g);
        }
        b.build().unwrap()
    }

    #[test]
    fn series_groups_share_module_current() {
        let topo = two_by_two();
        let solver = ModuleSolver::new(&topo, 0.0);
        let sol = solver.solve(&[branch(); 4], 4.0, 60.0).unwrap();
        for c in &sol.cell_currents {
            assert!((c - 2.0).abs() < 1e-12);
        }
        assert_eq!(sol.node_voltages.len(), 2);
        let expected = 2.0 * sol.node_voltages[0] - 4.0 * 2.0 * 0.001;
        assert!((sol.module_voltage(0.001) - expected).abs() < 1e-12);
    }

    #[test]
    fn parallel_fan_out_matches_sequential() {
        let topo = two_by_two();
        let mut branches = [branch(); 4];
        branches[1].params.r0 = 0.03;
        branches[2].v_rc1 = 0.01;
        let seq = ModuleSolver::new(&topo, 0.001).solve(&branches, 3.0, 10.0).unwrap();
        let par = ModuleSolver::new(&topo, 0.001)
            .with_parallel(true)
            .solve(&branches, 3.0, 10.0)
            .unwrap();
        assert_eq!(seq, par);
    }

    #[test]
    fn wrong_branch_count_is_rejected() {
        let topo = two_by_two();
        let err = ModuleSolver::new(&topo, 0.0).solve(&[branch(); 3], 1.0, 1.0);
        assert!(matches!(
            err,
            Err(SolverError::BranchCount {
                expected: 4,
                found: 3
            })
        ));
    }
}
