use std::fmt;

use indexmap::IndexSet;

/// A literal: variable index (1-based) plus polarity.
///
/// The derived ordering sorts by variable first, so a canonical clause keeps
/// `-v` and `v` adjacent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Lit {
    pub var: u32,
    pub sign: bool,
}

impl Lit {
    pub fn new(var: u32, sign: bool) -> Self {
        Self { var, sign }
    }

    pub fn neg(self) -> Self {
        Self {
            var: self.var,
            sign: !self.sign,
        }
    }

    /// Converts a signed DIMACS integer. Returns `None` for `0` and for
    /// magnitudes that do not fit a `u32` variable index.
    pub fn from_dimacs(v: i64) -> Option<Self> {
        if v == 0 {
            return None;
        }
        let var = u32::try_from(v.unsigned_abs()).ok()?;
        Some(Self::new(var, v > 0))
    }

    pub fn to_dimacs(self) -> i64 {
        let v = self.var as i64;
        if self.sign { v } else { -v }
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_dimacs())
    }
}

/// A disjunction of distinct literals, kept sorted so that equality and
/// hashing only see the literal set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Clause {
    lits: Vec<Lit>,
}

/// Outcome of resolving two clauses on a complementary pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolvent {
    Empty,
    Tautology,
    Clause(Clause),
}

impl Clause {
    /// Builds the canonical clause, or `None` when the literals contain a
    /// complementary pair.
    pub fn new<I: IntoIterator<Item = Lit>>(lits: I) -> Option<Self> {
        let mut lits = lits.into_iter().collect::<Vec<_>>();
        lits.sort_unstable();
        lits.dedup();
        if lits.windows(2).any(|w| w[0].var == w[1].var) {
            return None;
        }
        Some(Self { lits })
    }

    pub fn empty() -> Self {
        Self { lits: Vec::new() }
    }

    pub fn lits(&self) -> &[Lit] {
        &self.lits
    }

    pub fn len(&self) -> usize {
        self.lits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lits.is_empty()
    }

    pub fn is_unit(&self) -> bool {
        self.lits.len() == 1
    }

    pub fn contains(&self, lit: Lit) -> bool {
        self.lits.binary_search(&lit).is_ok()
    }

    /// Resolves `self` (holding `pivot`) against `other` (holding `-pivot`).
    pub fn resolve(&self, other: &Clause, pivot: Lit) -> Resolvent {
        let opposite = pivot.neg();
        let merged = self
            .lits
            .iter()
            .copied()
            .filter(|&l| l != pivot)
            .chain(other.lits.iter().copied().filter(|&l| l != opposite));
        match Clause::new(merged) {
            None => Resolvent::Tautology,
            Some(c) if c.is_empty() => Resolvent::Empty,
            Some(c) => Resolvent::Clause(c),
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, lit) in self.lits.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{lit}")?;
        }
        write!(f, "}}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddClause {
    Added,
    Duplicate,
    Tautology,
}

/// Insertion-ordered set of clauses. The `IndexSet` is both the sequence the
/// engines enumerate and the content index used for duplicate detection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Formula {
    num_vars: u32,
    clauses: IndexSet<Clause>,
}

impl Formula {
    pub fn new(num_vars: u32) -> Self {
        Self {
            num_vars,
            clauses: IndexSet::new(),
        }
    }

    pub fn add_clause<I: IntoIterator<Item = Lit>>(&mut self, lits: I) -> AddClause {
        match Clause::new(lits) {
            None => AddClause::Tautology,
            Some(clause) => {
                if self.insert(clause) {
                    AddClause::Added
                } else {
                    AddClause::Duplicate
                }
            }
        }
    }

    /// Raises the variable count, e.g. to honor a DIMACS header.
    pub fn declare_vars(&mut self, num_vars: u32) {
        self.num_vars = self.num_vars.max(num_vars);
    }

    /// Appends a canonical clause; false if an equal clause is present.
    pub fn insert(&mut self, clause: Clause) -> bool {
        if let Some(max) = clause.lits().iter().map(|l| l.var).max() {
            self.num_vars = self.num_vars.max(max);
        }
        self.clauses.insert(clause)
    }

    pub fn contains(&self, clause: &Clause) -> bool {
        self.clauses.contains(clause)
    }

    pub fn clause(&self, idx: usize) -> Option<&Clause> {
        self.clauses.get_index(idx)
    }

    pub fn clauses(&self) -> impl Iterator<Item = &Clause> + '_ {
        self.clauses.iter()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn num_vars(&self) -> u32 {
        self.num_vars
    }

    pub fn has_empty_clause(&self) -> bool {
        self.clauses.iter().any(Clause::is_empty)
    }

    pub fn max_clause_width(&self) -> usize {
        self.clauses.iter().map(Clause::len).max().unwrap_or(0)
    }

    /// Variables that occur in some clause, ascending.
    pub fn variables(&self) -> Vec<u32> {
        let mut vars = self
            .clauses
            .iter()
            .flat_map(|c| c.lits().iter().map(|l| l.var))
            .collect::<Vec<_>>();
        vars.sort_unstable();
        vars.dedup();
        vars
    }

    /// Largest variable occurring in some clause; 0 when none does. Unlike
    /// [`Formula::num_vars`] this ignores declared but unused variables.
    pub fn max_var(&self) -> u32 {
        self.clauses
            .iter()
            .flat_map(|c| c.lits().iter().map(|l| l.var))
            .max()
            .unwrap_or(0)
    }

    pub fn eval_lit_partial(lit: Lit, assignment: &[Option<bool>]) -> Option<bool> {
        let var = lit.var as usize;
        if var >= assignment.len() {
            return None;
        }
        assignment[var].map(|v| if lit.sign { v } else { !v })
    }

    pub fn eval_clause_partial(clause: &Clause, assignment: &[Option<bool>]) -> Option<bool> {
        let mut any_unknown = false;
        for &lit in clause.lits() {
            match Self::eval_lit_partial(lit, assignment) {
                Some(true) => return Some(true),
                Some(false) => {}
                None => any_unknown = true,
            }
        }
        if any_unknown { None } else { Some(false) }
    }

    pub fn eval_partial(&self, assignment: &[Option<bool>]) -> Option<bool> {
        let mut all_true = true;
        for clause in &self.clauses {
            match Self::eval_clause_partial(clause, assignment) {
                Some(true) => {}
                Some(false) => return Some(false),
                None => all_true = false,
            }
        }
        if all_true { Some(true) } else { None }
    }
}
