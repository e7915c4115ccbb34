use crate::cnf::cnf::Formula;
use crate::sat::control::CancelFlag;
use crate::sat::resolution::{FrontierPolicy, ResolutionVerdict, Resolver};
use crate::solver::{SatSolver, SolveResult, SolverStats};

/// Resolution engine behind [`SatSolver`]. SAT answers carry no model.
#[derive(Debug, Clone)]
pub struct ResolutionBackend {
    policy: FrontierPolicy,
    cancel: Option<CancelFlag>,
    stats: SolverStats,
}

impl ResolutionBackend {
    pub fn new(policy: FrontierPolicy, cancel: Option<CancelFlag>) -> Self {
        Self {
            policy,
            cancel,
            stats: SolverStats::default(),
        }
    }
}

impl Default for ResolutionBackend {
    fn default() -> Self {
        Self::new(FrontierPolicy::default(), None)
    }
}

impl SatSolver for ResolutionBackend {
    fn solve(&mut self, formula: &Formula) -> SolveResult {
        let mut resolver = Resolver::new().policy(self.policy).progress_every(0);
        if let Some(flag) = &self.cancel {
            resolver = resolver.cancel_flag(flag.clone());
        }
        let verdict = resolver.solve(formula);
        self.stats = SolverStats {
            solve_calls: self.stats.solve_calls + 1,
            steps: verdict.steps(),
            new_clauses: verdict.new_clauses(),
            ..SolverStats::default()
        };
        match verdict {
            ResolutionVerdict::Sat { .. } => SolveResult::Sat,
            ResolutionVerdict::Unsat { .. } => SolveResult::Unsat,
            ResolutionVerdict::Interrupted { .. } => SolveResult::Unknown,
        }
    }

    fn model_value(&self, _var: u32) -> Option<bool> {
        None
    }

    fn stats(&self) -> SolverStats {
        self.stats
    }

    fn backend_name(&self) -> &'static str {
        match self.policy {
            FrontierPolicy::Frontier => "resolution",
            FrontierPolicy::Naive => "resolution-naive",
        }
    }
}
