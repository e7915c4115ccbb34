//! Davis–Putnam style saturation under propositional resolution.
//!
//! Each round resolves every eligible pair of clauses on each complementary
//! literal pair. Resolvents of a round are buffered in a frontier and merged
//! only when the round ends, so the clauses being enumerated are fixed at
//! round start. Deriving the empty clause proves the formula unsatisfiable;
//! a round that derives nothing new means the resolution closure was reached
//! without contradiction, so the formula is satisfiable.
//!
//! A satisfiable verdict carries no model. Callers that need one use
//! [`crate::sat::dpll`].
//!
//! The closure can be exponentially larger than the input. Nothing here caps
//! it; bound the run with a [`CancelFlag`] instead.

use indexmap::IndexSet;
use tracing::{debug, info};

use crate::cnf::cnf::{Clause, Formula, Resolvent};
use crate::sat::control::CancelFlag;

/// Which clause pairs a round examines after the first one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FrontierPolicy {
    /// Only pairs with at least one clause derived by the previous round.
    #[default]
    Frontier,
    /// Every pair of the whole collection, every round.
    Naive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionVerdict {
    Unsat { steps: u64, new_clauses: u64 },
    Sat { steps: u64, new_clauses: u64 },
    Interrupted { steps: u64, new_clauses: u64 },
}

impl ResolutionVerdict {
    /// Complementary-literal pair examinations performed.
    pub fn steps(&self) -> u64 {
        match *self {
            Self::Unsat { steps, .. }
            | Self::Sat { steps, .. }
            | Self::Interrupted { steps, .. } => steps,
        }
    }

    /// Distinct clauses added to the formula.
    pub fn new_clauses(&self) -> u64 {
        match *self {
            Self::Unsat { new_clauses, .. }
            | Self::Sat { new_clauses, .. }
            | Self::Interrupted { new_clauses, .. } => new_clauses,
        }
    }

    pub fn is_unsat(&self) -> bool {
        matches!(self, Self::Unsat { .. })
    }

    pub fn is_sat(&self) -> bool {
        matches!(self, Self::Sat { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionProgress {
    pub round: usize,
    pub steps: u64,
    pub new_clauses: u64,
    pub clauses: usize,
}

/// Saturation state handed from one round to the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Saturation {
    pub formula: Formula,
    /// Index of the first clause merged by the previous round.
    pub fresh_from: usize,
    pub round: usize,
    pub steps: u64,
    pub new_clauses: u64,
}

impl Saturation {
    pub fn new(formula: Formula) -> Self {
        Self {
            formula,
            fresh_from: 0,
            round: 0,
            steps: 0,
            new_clauses: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    /// The empty clause was derived.
    Refuted(Saturation),
    /// Nothing new was derived.
    Closed(Saturation),
    /// New clauses were merged; another round is needed.
    Grew(Saturation),
    Interrupted(Saturation),
}

pub struct Resolver<'a> {
    policy: FrontierPolicy,
    progress_every: u64,
    on_progress: Option<Box<dyn FnMut(&ResolutionProgress) + 'a>>,
    cancel: Option<CancelFlag>,
}

impl Default for Resolver<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Resolver<'a> {
    pub fn new() -> Self {
        Self {
            policy: FrontierPolicy::default(),
            progress_every: 100,
            on_progress: None,
            cancel: None,
        }
    }

    pub fn policy(mut self, policy: FrontierPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Report progress every `n` derived clauses; `0` disables reporting.
    pub fn progress_every(mut self, n: u64) -> Self {
        self.progress_every = n;
        self
    }

    pub fn on_progress<F: FnMut(&ResolutionProgress) + 'a>(mut self, f: F) -> Self {
        self.on_progress = Some(Box::new(f));
        self
    }

    pub fn cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn solve(&mut self, formula: &Formula) -> ResolutionVerdict {
        self.run(formula.clone()).0
    }

    /// Saturates `formula` and hands back the grown collection with the verdict.
    pub fn run(&mut self, formula: Formula) -> (ResolutionVerdict, Formula) {
        if formula.has_empty_clause() {
            info!(steps = 0, new_clauses = 0, "resolution: input holds the empty clause");
            return (
                ResolutionVerdict::Unsat {
                    steps: 0,
                    new_clauses: 0,
                },
                formula,
            );
        }

        let mut state = Saturation::new(formula);
        loop {
            match self.round(state) {
                RoundOutcome::Grew(next) => state = next,
                RoundOutcome::Closed(s) => {
                    info!(
                        steps = s.steps,
                        new_clauses = s.new_clauses,
                        rounds = s.round,
                        "resolution: SAT"
                    );
                    let verdict = ResolutionVerdict::Sat {
                        steps: s.steps,
                        new_clauses: s.new_clauses,
                    };
                    return (verdict, s.formula);
                }
                RoundOutcome::Refuted(s) => {
                    info!(
                        steps = s.steps,
                        new_clauses = s.new_clauses,
                        rounds = s.round,
                        "resolution: UNSAT"
                    );
                    let verdict = ResolutionVerdict::Unsat {
                        steps: s.steps,
                        new_clauses: s.new_clauses,
                    };
                    return (verdict, s.formula);
                }
                RoundOutcome::Interrupted(s) => {
                    info!(steps = s.steps, new_clauses = s.new_clauses, "resolution: interrupted");
                    let verdict = ResolutionVerdict::Interrupted {
                        steps: s.steps,
                        new_clauses: s.new_clauses,
                    };
                    return (verdict, s.formula);
                }
            }
        }
    }

    /// Runs one round over `state`.
    ///
    /// Pairs `(i, j)` with `i < j` are visited in index order; with the
    /// frontier policy `j` is restricted to clauses merged by the previous
    /// round, which yields the old×new pairs followed by the new×new pairs.
    pub fn round(&mut self, state: Saturation) -> RoundOutcome {
        let Saturation {
            mut formula,
            fresh_from,
            round,
            mut steps,
            mut new_clauses,
        } = state;

        let total = formula.len();
        let first_fresh = match self.policy {
            FrontierPolicy::Frontier => fresh_from.min(total),
            FrontierPolicy::Naive => 0,
        };
        let mut frontier = IndexSet::<Clause>::new();
        let mut stop = None::<Stop>;

        'pairs: for i in 0..total {
            let Some(c1) = formula.clause(i) else { break };
            for j in (i + 1).max(first_fresh)..total {
                let Some(c2) = formula.clause(j) else { break };
                for &lit in c1.lits() {
                    if !c2.contains(lit.neg()) {
                        continue;
                    }
                    if self.cancelled() {
                        stop = Some(Stop::Interrupted);
                        break 'pairs;
                    }
                    steps += 1;
                    match c1.resolve(c2, lit) {
                        Resolvent::Empty => {
                            debug!(
                                round,
                                step = steps,
                                left = %c1,
                                right = %c2,
                                "derived the empty clause"
                            );
                            stop = Some(Stop::Refuted);
                            break 'pairs;
                        }
                        Resolvent::Tautology => {}
                        Resolvent::Clause(r) => {
                            if !formula.contains(&r) && frontier.insert(r) {
                                new_clauses += 1;
                                self.report(ResolutionProgress {
                                    round,
                                    steps,
                                    new_clauses,
                                    clauses: total + frontier.len(),
                                });
                            }
                        }
                    }
                }
            }
        }

        let derived = frontier.len();
        for clause in frontier {
            formula.insert(clause);
        }
        debug!(round, derived, clauses = formula.len(), steps, "resolution round finished");

        let next = Saturation {
            formula,
            fresh_from: total,
            round: round + 1,
            steps,
            new_clauses,
        };
        match stop {
            Some(Stop::Refuted) => RoundOutcome::Refuted(next),
            Some(Stop::Interrupted) => RoundOutcome::Interrupted(next),
            None if derived == 0 => RoundOutcome::Closed(next),
            None => RoundOutcome::Grew(next),
        }
    }

    fn cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled)
    }

    fn report(&mut self, progress: ResolutionProgress) {
        if self.progress_every == 0 || progress.new_clauses % self.progress_every != 0 {
            return;
        }
        if let Some(cb) = self.on_progress.as_mut() {
            cb(&progress);
        }
    }
}

enum Stop {
    Refuted,
    Interrupted,
}

/// Saturates with the default frontier policy.
pub fn solve(formula: &Formula) -> ResolutionVerdict {
    Resolver::new().solve(formula)
}
