use crate::cnf::cnf::Formula;
use crate::sat::assignment::Assignment;
use crate::sat::control::CancelFlag;
use crate::sat::dpll::{Dpll, DpllVerdict};
use crate::solver::{SatSolver, SolveResult, SolverStats};

#[derive(Debug, Clone)]
pub struct DpllSolverBackend {
    parallel: bool,
    cancel: Option<CancelFlag>,
    last_model: Option<Assignment>,
    stats: SolverStats,
}

impl DpllSolverBackend {
    pub fn new(parallel: bool, cancel: Option<CancelFlag>) -> Self {
        Self {
            parallel,
            cancel,
            last_model: None,
            stats: SolverStats::default(),
        }
    }
}

impl Default for DpllSolverBackend {
    fn default() -> Self {
        Self::new(false, None)
    }
}

impl SatSolver for DpllSolverBackend {
    fn solve(&mut self, formula: &Formula) -> SolveResult {
        let mut dpll = Dpll::new().progress_every(0);
        if let Some(flag) = &self.cancel {
            dpll = dpll.cancel_flag(flag.clone());
        }
        let verdict = if self.parallel {
            dpll.solve_parallel(formula)
        } else {
            dpll.solve(formula)
        };
        let run = dpll.stats();
        self.stats = SolverStats {
            solve_calls: self.stats.solve_calls + 1,
            decisions: run.decisions,
            conflicts: run.conflicts,
            propagations: run.propagations,
            ..SolverStats::default()
        };
        match verdict {
            DpllVerdict::Sat { assignment } => {
                self.last_model = Some(assignment);
                SolveResult::Sat
            }
            DpllVerdict::Unsat => {
                self.last_model = None;
                SolveResult::Unsat
            }
            DpllVerdict::Interrupted => {
                self.last_model = None;
                SolveResult::Unknown
            }
        }
    }

    fn model_value(&self, var: u32) -> Option<bool> {
        self.last_model.as_ref().and_then(|m| m.value(var))
    }

    fn stats(&self) -> SolverStats {
        self.stats
    }

    fn backend_name(&self) -> &'static str {
        if self.parallel { "dpll-par" } else { "dpll" }
    }
}
