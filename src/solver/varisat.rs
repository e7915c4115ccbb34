use crate::cnf::cnf::{Formula, Lit};
use crate::solver::{SatSolver, SolveResult, SolverStats};
use varisat::ExtendFormula;

/// Reference CDCL backend used to cross-check the classical engines. Each
/// call builds a fresh solver; it does not observe cancel flags.
pub struct VarisatSolver {
    vars: Vec<varisat::Var>,
    last_model: Option<Vec<varisat::Lit>>,
    stats: SolverStats,
}

impl VarisatSolver {
    pub fn new() -> Self {
        Self {
            vars: Vec::new(),
            last_model: None,
            stats: SolverStats::default(),
        }
    }

    fn to_var(&self, v: u32) -> Option<varisat::Var> {
        if v == 0 {
            return None;
        }
        self.vars.get(v as usize - 1).copied()
    }

    fn to_lit(&self, lit: Lit) -> Option<varisat::Lit> {
        let var = self.to_var(lit.var)?;
        Some(varisat::Lit::from_var(var, lit.sign))
    }
}

impl Default for VarisatSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SatSolver for VarisatSolver {
    fn solve(&mut self, formula: &Formula) -> SolveResult {
        self.stats = SolverStats {
            solve_calls: self.stats.solve_calls + 1,
            ..SolverStats::default()
        };
        let mut inner = varisat::Solver::new();
        self.vars = (0..formula.max_var()).map(|_| inner.new_var()).collect();
        for clause in formula.clauses() {
            let lits = clause
                .lits()
                .iter()
                .filter_map(|&l| self.to_lit(l))
                .collect::<Vec<_>>();
            inner.add_clause(&lits);
        }
        match inner.solve() {
            Ok(true) => {
                self.last_model = inner.model();
                SolveResult::Sat
            }
            Ok(false) => {
                self.last_model = None;
                SolveResult::Unsat
            }
            Err(_) => {
                self.last_model = None;
                SolveResult::Unknown
            }
        }
    }

    fn model_value(&self, var: u32) -> Option<bool> {
        let v = self.to_var(var)?;
        let model = self.last_model.as_ref()?;
        if model.contains(&v.lit(true)) {
            Some(true)
        } else if model.contains(&v.lit(false)) {
            Some(false)
        } else {
            None
        }
    }

    fn stats(&self) -> SolverStats {
        self.stats
    }

    fn backend_name(&self) -> &'static str {
        "varisat"
    }
}
