use crate::cnf::cnf::{Formula, Lit};

/// A consistent set of literals, stored as one optional value per variable so
/// a literal and its complement can never both be present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    values: Vec<Option<bool>>,
}

impl Assignment {
    pub fn new(num_vars: u32) -> Self {
        Self {
            values: vec![None; num_vars as usize + 1],
        }
    }

    pub fn value(&self, var: u32) -> Option<bool> {
        self.values.get(var as usize).copied().flatten()
    }

    pub fn contains(&self, lit: Lit) -> bool {
        self.value(lit.var) == Some(lit.sign)
    }

    /// Adds `lit`. Returns false, leaving the assignment unchanged, when its
    /// complement is already present.
    pub fn assign(&mut self, lit: Lit) -> bool {
        let var = lit.var as usize;
        if var >= self.values.len() {
            self.values.resize(var + 1, None);
        }
        match self.values[var] {
            Some(v) => v == lit.sign,
            None => {
                self.values[var] = Some(lit.sign);
                true
            }
        }
    }

    /// Number of assigned variables.
    pub fn len(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_total_for(&self, formula: &Formula) -> bool {
        formula
            .variables()
            .into_iter()
            .all(|var| self.value(var).is_some())
    }

    pub fn fill_unassigned(&mut self, vars: &[u32], value: bool) {
        for &var in vars {
            if self.value(var).is_none() {
                self.assign(Lit::new(var, value));
            }
        }
    }

    /// Assigned literals in variable order.
    pub fn lits(&self) -> Vec<Lit> {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(var, v)| v.map(|sign| Lit::new(var as u32, sign)))
            .collect()
    }

    pub fn values(&self) -> &[Option<bool>] {
        &self.values
    }

    pub fn satisfies(&self, formula: &Formula) -> bool {
        formula.eval_partial(&self.values) == Some(true)
    }
}
