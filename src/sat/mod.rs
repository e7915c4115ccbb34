//! The two satisfiability engines and the state they share.
//!
//! [`resolution`] saturates a formula under propositional resolution and
//! [`dpll`] runs backtracking search with unit propagation. Neither calls the
//! other; both read a [`Formula`](crate::cnf::cnf::Formula) and return a
//! verdict.

pub mod assignment;
pub mod control;
pub mod dpll;
pub mod resolution;
