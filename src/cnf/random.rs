use anyhow::{Result, bail};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::cnf::{Formula, Lit};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomCnf {
    pub formula: Formula,
    /// Hidden model indexed by variable (slot 0 unused) when planted.
    pub planted: Option<Vec<bool>>,
}

/// Uniform random k-CNF over `vars` variables with distinct variables per
/// clause. With `planted`, every clause is made true under a hidden random
/// assignment, so the result is satisfiable.
///
/// Duplicate draws collapse in the formula; generation retries a bounded
/// number of times, so very dense requests can come back short.
pub fn random_kcnf(
    vars: u32,
    clauses: usize,
    k: usize,
    seed: u64,
    planted: bool,
) -> Result<RandomCnf> {
    if k == 0 {
        bail!("k must be >= 1");
    }
    if k > vars as usize {
        bail!("k={} exceeds the number of variables ({})", k, vars);
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let hidden = planted.then(|| {
        (0..=vars)
            .map(|v| v != 0 && rng.random_bool(0.5))
            .collect::<Vec<_>>()
    });

    let mut formula = Formula::new(vars);
    let max_attempts = clauses.saturating_mul(20).saturating_add(100);
    let mut attempts = 0usize;
    while formula.len() < clauses && attempts < max_attempts {
        attempts += 1;
        let picked = rand::seq::index::sample(&mut rng, vars as usize, k);
        let mut lits = picked
            .into_iter()
            .map(|i| Lit::new(i as u32 + 1, rng.random_bool(0.5)))
            .collect::<Vec<_>>();

        if let Some(model) = &hidden {
            let satisfied = lits.iter().any(|l| model[l.var as usize] == l.sign);
            if !satisfied {
                let flip = rng.random_range(0..lits.len());
                lits[flip] = lits[flip].neg();
            }
        }
        formula.add_clause(lits);
    }

    Ok(RandomCnf {
        formula,
        planted: hidden,
    })
}
