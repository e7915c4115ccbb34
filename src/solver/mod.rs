pub mod dpll_backend;
pub mod resolution_backend;
pub mod varisat;

use std::fmt;
use std::str::FromStr;

use anyhow::bail;

use crate::cnf::cnf::Formula;
use crate::sat::control::CancelFlag;
use crate::sat::resolution::FrontierPolicy;

use self::dpll_backend::DpllSolverBackend;
use self::resolution_backend::ResolutionBackend;
use self::varisat::VarisatSolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveResult {
    Sat,
    Unsat,
    /// Stopped through the cancel flag before reaching a verdict.
    Unknown,
}

impl fmt::Display for SolveResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolveResult::Sat => "SAT",
            SolveResult::Unsat => "UNSAT",
            SolveResult::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// Counters from the most recent `solve` call. Backends leave the fields
/// they do not track at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolverStats {
    pub solve_calls: usize,
    pub steps: u64,
    pub new_clauses: u64,
    pub decisions: u64,
    pub conflicts: u64,
    pub propagations: u64,
}

pub trait SatSolver {
    fn solve(&mut self, formula: &Formula) -> SolveResult;
    /// Model value after a SAT result, if the backend produces a witness.
    fn model_value(&self, var: u32) -> Option<bool>;
    fn stats(&self) -> SolverStats;
    fn backend_name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Resolution(FrontierPolicy),
    Dpll,
    DpllParallel,
    Varisat,
}

impl Backend {
    pub const ALL: [Backend; 5] = [
        Backend::Resolution(FrontierPolicy::Frontier),
        Backend::Resolution(FrontierPolicy::Naive),
        Backend::Dpll,
        Backend::DpllParallel,
        Backend::Varisat,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Backend::Resolution(FrontierPolicy::Frontier) => "resolution",
            Backend::Resolution(FrontierPolicy::Naive) => "resolution-naive",
            Backend::Dpll => "dpll",
            Backend::DpllParallel => "dpll-par",
            Backend::Varisat => "varisat",
        }
    }

    pub fn build(self, cancel: Option<CancelFlag>) -> Box<dyn SatSolver> {
        match self {
            Backend::Resolution(policy) => Box::new(ResolutionBackend::new(policy, cancel)),
            Backend::Dpll => Box::new(DpllSolverBackend::new(false, cancel)),
            Backend::DpllParallel => Box::new(DpllSolverBackend::new(true, cancel)),
            Backend::Varisat => Box::new(VarisatSolver::new()),
        }
    }
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Backend::ALL.into_iter().find(|b| b.name() == s) {
            Some(b) => Ok(b),
            None => bail!(
                "unknown engine '{}', expected resolution|resolution-naive|dpll|dpll-par|varisat",
                s
            ),
        }
    }
}
