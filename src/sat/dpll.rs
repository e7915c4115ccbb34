//! Backtracking search with unit propagation.
//!
//! Every search state owns its own simplified clause list and assignment.
//! Pending states live on an explicit stack rather than the call stack, so
//! deep searches do not overflow it. Exploration is depth-first and tries
//! the true branch before the false one.

use std::rc::Rc;
use std::sync::mpsc;
use std::thread;

use tracing::{debug, info};

use crate::cnf::cnf::{Formula, Lit};
use crate::sat::assignment::Assignment;
use crate::sat::control::CancelFlag;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DpllVerdict {
    /// A total assignment over every variable of the formula.
    Sat { assignment: Assignment },
    Unsat,
    Interrupted,
}

impl DpllVerdict {
    pub fn is_sat(&self) -> bool {
        matches!(self, Self::Sat { .. })
    }

    pub fn is_unsat(&self) -> bool {
        matches!(self, Self::Unsat)
    }

    pub fn assignment(&self) -> Option<&Assignment> {
        match self {
            Self::Sat { assignment } => Some(assignment),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DpllStats {
    pub decisions: u64,
    pub conflicts: u64,
    pub propagations: u64,
}

impl DpllStats {
    fn absorb(&mut self, other: DpllStats) {
        self.decisions += other.decisions;
        self.conflicts += other.conflicts;
        self.propagations += other.propagations;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DpllProgress {
    pub decisions: u64,
    pub conflicts: u64,
    pub depth: usize,
    pub pending: usize,
}

type Clauses = Vec<Vec<Lit>>;

enum Pending {
    Start {
        clauses: Clauses,
        assignment: Assignment,
        depth: usize,
    },
    Branch {
        parent: Rc<Clauses>,
        assignment: Assignment,
        lit: Lit,
        depth: usize,
    },
}

enum Propagated {
    Conflict,
    Open(Clauses, Assignment),
}

pub struct Dpll<'a> {
    progress_every: u64,
    on_progress: Option<Box<dyn FnMut(&DpllProgress) + 'a>>,
    cancel: Option<CancelFlag>,
    stats: DpllStats,
}

impl Default for Dpll<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Dpll<'a> {
    pub fn new() -> Self {
        Self {
            progress_every: 1000,
            on_progress: None,
            cancel: None,
            stats: DpllStats::default(),
        }
    }

    /// Report progress every `n` decisions; `0` disables reporting.
    pub fn progress_every(mut self, n: u64) -> Self {
        self.progress_every = n;
        self
    }

    pub fn on_progress<F: FnMut(&DpllProgress) + 'a>(mut self, f: F) -> Self {
        self.on_progress = Some(Box::new(f));
        self
    }

    pub fn cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Counters accumulated over every call on this instance.
    pub fn stats(&self) -> DpllStats {
        self.stats
    }

    pub fn solve(&mut self, formula: &Formula) -> DpllVerdict {
        let start = Pending::Start {
            clauses: initial_clauses(formula),
            assignment: Assignment::new(formula.max_var()),
            depth: 0,
        };
        let verdict = self.search(start, formula);
        log_verdict(&verdict, self.stats);
        verdict
    }

    /// Splits on the first decision of the search and explores both branches
    /// on their own threads. The first satisfying branch wins and cancels the
    /// other. Progress callbacks are not forwarded to the workers.
    pub fn solve_parallel(&mut self, formula: &Formula) -> DpllVerdict {
        let verdict = self.split_search(formula);
        log_verdict(&verdict, self.stats);
        verdict
    }

    fn split_search(&mut self, formula: &Formula) -> DpllVerdict {
        let clauses = initial_clauses(formula);
        if clauses.iter().any(Vec::is_empty) {
            self.stats.conflicts += 1;
            return DpllVerdict::Unsat;
        }
        let (clauses, assignment) =
            match self.propagate(clauses, Assignment::new(formula.max_var())) {
                Propagated::Conflict => return DpllVerdict::Unsat,
                Propagated::Open(c, a) => (c, a),
            };
        if clauses.is_empty() {
            return DpllVerdict::Sat {
                assignment: complete(assignment, formula),
            };
        }

        let var = clauses[0][0].var;
        self.stats.decisions += 1;
        let shared = match &self.cancel {
            Some(flag) => flag.child(),
            None => CancelFlag::new(),
        };
        let (tx, rx) = mpsc::channel::<(DpllVerdict, DpllStats)>();

        thread::scope(|s| {
            for sign in [true, false] {
                let tx = tx.clone();
                let flag = shared.clone();
                let lit = Lit::new(var, sign);
                let mut assignment = assignment.clone();
                let branch = simplify(&clauses, lit);
                s.spawn(move || {
                    let mut worker = Dpll::new().progress_every(0).cancel_flag(flag);
                    let verdict = match branch {
                        Some(clauses) => {
                            assignment.assign(lit);
                            worker.search(
                                Pending::Start {
                                    clauses,
                                    assignment,
                                    depth: 1,
                                },
                                formula,
                            )
                        }
                        None => {
                            worker.stats.conflicts += 1;
                            DpllVerdict::Unsat
                        }
                    };
                    let _ = tx.send((verdict, worker.stats));
                });
            }
            // receiver ends once both workers have sent
            drop(tx);

            let mut outcome = DpllVerdict::Unsat;
            for (verdict, stats) in rx {
                self.stats.absorb(stats);
                match verdict {
                    DpllVerdict::Sat { .. } if !outcome.is_sat() => {
                        shared.cancel();
                        outcome = verdict;
                    }
                    DpllVerdict::Interrupted if !outcome.is_sat() => outcome = verdict,
                    _ => {}
                }
            }
            outcome
        })
    }

    fn search(&mut self, start: Pending, formula: &Formula) -> DpllVerdict {
        let mut stack = vec![start];

        while let Some(pending) = stack.pop() {
            if self.cancelled() {
                return DpllVerdict::Interrupted;
            }

            let (clauses, assignment, depth) = match pending {
                Pending::Start {
                    clauses,
                    assignment,
                    depth,
                } => {
                    if clauses.iter().any(Vec::is_empty) {
                        self.stats.conflicts += 1;
                        continue;
                    }
                    (clauses, assignment, depth)
                }
                Pending::Branch {
                    parent,
                    mut assignment,
                    lit,
                    depth,
                } => match simplify(&parent, lit) {
                    Some(clauses) => {
                        assignment.assign(lit);
                        (clauses, assignment, depth)
                    }
                    None => {
                        self.stats.conflicts += 1;
                        continue;
                    }
                },
            };

            let (clauses, assignment) = match self.propagate(clauses, assignment) {
                Propagated::Conflict => continue,
                Propagated::Open(c, a) => (c, a),
            };
            if clauses.is_empty() {
                return DpllVerdict::Sat {
                    assignment: complete(assignment, formula),
                };
            }

            let var = clauses[0][0].var;
            self.stats.decisions += 1;
            self.report(depth, stack.len());

            let parent = Rc::new(clauses);
            // false is pushed first so the true branch is explored first
            for sign in [false, true] {
                stack.push(Pending::Branch {
                    parent: Rc::clone(&parent),
                    assignment: assignment.clone(),
                    lit: Lit::new(var, sign),
                    depth: depth + 1,
                });
            }
        }

        DpllVerdict::Unsat
    }

    fn propagate(&mut self, mut clauses: Clauses, mut assignment: Assignment) -> Propagated {
        while let Some(lit) = clauses.iter().find(|c| c.len() == 1).map(|c| c[0]) {
            if assignment.contains(lit.neg()) {
                self.stats.conflicts += 1;
                return Propagated::Conflict;
            }
            assignment.assign(lit);
            self.stats.propagations += 1;
            match simplify(&clauses, lit) {
                Some(next) => clauses = next,
                None => {
                    self.stats.conflicts += 1;
                    return Propagated::Conflict;
                }
            }
        }
        Propagated::Open(clauses, assignment)
    }

    fn cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled)
    }

    fn report(&mut self, depth: usize, pending: usize) {
        if self.progress_every == 0 || self.stats.decisions % self.progress_every != 0 {
            return;
        }
        let progress = DpllProgress {
            decisions: self.stats.decisions,
            conflicts: self.stats.conflicts,
            depth,
            pending,
        };
        debug!(
            decisions = progress.decisions,
            conflicts = progress.conflicts,
            depth,
            pending,
            "dpll progress"
        );
        if let Some(cb) = self.on_progress.as_mut() {
            cb(&progress);
        }
    }
}

/// Makes `lit` true: drops satisfied clauses and strips `-lit` from the rest.
/// Returns `None` if some clause runs out of literals.
fn simplify(clauses: &[Vec<Lit>], lit: Lit) -> Option<Clauses> {
    let opposite = lit.neg();
    let mut out = Vec::with_capacity(clauses.len());
    for clause in clauses {
        if clause.contains(&lit) {
            continue;
        }
        let reduced = clause
            .iter()
            .copied()
            .filter(|&l| l != opposite)
            .collect::<Vec<_>>();
        if reduced.is_empty() {
            return None;
        }
        out.push(reduced);
    }
    Some(out)
}

fn initial_clauses(formula: &Formula) -> Clauses {
    formula.clauses().map(|c| c.lits().to_vec()).collect()
}

// variables left open by the search are fixed to false
fn complete(mut assignment: Assignment, formula: &Formula) -> Assignment {
    assignment.fill_unassigned(&formula.variables(), false);
    assignment
}

fn log_verdict(verdict: &DpllVerdict, stats: DpllStats) {
    let status = match verdict {
        DpllVerdict::Sat { .. } => "SAT",
        DpllVerdict::Unsat => "UNSAT",
        DpllVerdict::Interrupted => "interrupted",
    };
    info!(
        decisions = stats.decisions,
        conflicts = stats.conflicts,
        propagations = stats.propagations,
        "dpll: {status}"
    );
}

pub fn solve(formula: &Formula) -> DpllVerdict {
    Dpll::new().solve(formula)
}

pub fn solve_parallel(formula: &Formula) -> DpllVerdict {
    Dpll::new().solve_parallel(formula)
}
