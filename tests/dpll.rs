use dpsat::cnf::cnf::{Formula, Lit};
use dpsat::cnf::dimacs::{from_int_clauses, parse_dimacs_str};
use dpsat::sat::control::CancelFlag;
use dpsat::sat::dpll::{Dpll, DpllVerdict, solve, solve_parallel};

fn formula(clauses: &[&[i64]]) -> Formula {
    from_int_clauses(clauses).expect("formula")
}

fn model_of(verdict: &DpllVerdict) -> &dpsat::sat::assignment::Assignment {
    match verdict.assignment() {
        Some(a) => a,
        None => panic!("expected SAT, got {verdict:?}"),
    }
}

#[test]
fn all_sign_combinations_are_unsat() {
    let f = formula(&[&[1, 2], &[-1, 2], &[1, -2], &[-1, -2]]);
    assert_eq!(solve(&f), DpllVerdict::Unsat);
    assert_eq!(solve_parallel(&f), DpllVerdict::Unsat);
}

#[test]
fn complementary_units_conflict_without_branching() {
    let f = formula(&[&[1], &[-1]]);
    let mut dpll = Dpll::new();
    assert_eq!(dpll.solve(&f), DpllVerdict::Unsat);
    let stats = dpll.stats();
    assert_eq!(stats.decisions, 0);
    assert_eq!(stats.conflicts, 1);
    assert_eq!(stats.propagations, 1);
}

#[test]
fn single_clause_model_makes_it_true() {
    let f = formula(&[&[1, 2]]);
    let verdict = solve(&f);
    let model = model_of(&verdict);
    assert!(model.contains(Lit::new(1, true)) || model.contains(Lit::new(2, true)));
    assert!(model.satisfies(&f));
    assert!(model.is_total_for(&f));
}

#[test]
fn true_branch_is_tried_first() {
    let f = formula(&[&[1, 2]]);
    let verdict = solve(&f);
    let model = model_of(&verdict);
    assert_eq!(model.value(1), Some(true));
    // free after the decision, filled with false
    assert_eq!(model.value(2), Some(false));
}

#[test]
fn declared_variable_count_does_not_size_the_search() {
    let f = parse_dimacs_str("p cnf 3000000000 2\n1 2 0\n-1 3 0\n").expect("parse");
    assert_eq!(f.num_vars(), 3_000_000_000);
    assert_eq!(f.max_var(), 3);
    for verdict in [solve(&f), solve_parallel(&f)] {
        let model = model_of(&verdict);
        assert!(model.satisfies(&f));
        // slot 0 plus the three used variables
        assert_eq!(model.values().len(), 4);
    }
}

#[test]
fn empty_formula_is_sat_without_decisions() {
    let f = Formula::new(0);
    let mut dpll = Dpll::new();
    assert!(dpll.solve(&f).is_sat());
    assert_eq!(dpll.stats().decisions, 0);
}

#[test]
fn empty_clause_input_is_unsat_without_decisions() {
    let f = formula(&[&[1, 2], &[]]);
    let mut dpll = Dpll::new();
    assert_eq!(dpll.solve(&f), DpllVerdict::Unsat);
    assert_eq!(dpll.stats().decisions, 0);
    assert_eq!(solve_parallel(&f), DpllVerdict::Unsat);
}

#[test]
fn backtracks_out_of_a_failed_true_branch() {
    // x1 = true forces both 2 and -2
    let f = formula(&[&[1, 3], &[-1, 2], &[-1, -2], &[3, 4]]);
    let verdict = solve(&f);
    let model = model_of(&verdict);
    assert_eq!(model.value(1), Some(false));
    assert!(model.satisfies(&f));
}

#[test]
fn unit_propagation_chain_needs_no_decision() {
    let f = formula(&[&[1], &[-1, 2], &[-2, 3], &[-3, 4]]);
    let mut dpll = Dpll::new();
    let verdict = dpll.solve(&f);
    let model = model_of(&verdict);
    for v in 1..=4 {
        assert_eq!(model.value(v), Some(true));
    }
    assert_eq!(dpll.stats().decisions, 0);
    assert_eq!(dpll.stats().propagations, 4);
}

#[test]
fn long_chains_do_not_exhaust_the_stack() {
    // a deep search: 400 binary clauses with no unit clause to start from
    let n = 400i64;
    let mut clauses = Vec::new();
    for v in 1..n {
        clauses.push(vec![v, v + 1]);
    }
    clauses.push(vec![-n, -1]);
    let f = from_int_clauses(&clauses).expect("formula");
    let verdict = solve(&f);
    assert!(model_of(&verdict).satisfies(&f));
}

#[test]
fn parallel_finds_valid_model() {
    let f = formula(&[&[1, 2, 3], &[-1, -2], &[-1, -3], &[-2, -3], &[1, -2]]);
    let verdict = solve_parallel(&f);
    assert!(model_of(&verdict).satisfies(&f));
}

#[test]
fn progress_callback_sees_every_decision() {
    let f = formula(&[&[1, 2, 3], &[-1, 2], &[-2, 3], &[-3, -1]]);
    let mut seen = Vec::new();
    let decisions;
    {
        let mut dpll = Dpll::new().progress_every(1).on_progress(|p| seen.push(p.decisions));
        assert!(dpll.solve(&f).is_sat());
        decisions = dpll.stats().decisions;
    }
    assert_eq!(seen, (1..=decisions).collect::<Vec<_>>());
}

#[test]
fn raised_cancel_flag_interrupts() {
    let f = formula(&[&[1, 2], &[-1, 2]]);
    let flag = CancelFlag::new();
    flag.cancel();
    let verdict = Dpll::new().cancel_flag(flag).solve(&f);
    assert_eq!(verdict, DpllVerdict::Interrupted);

    let parent = CancelFlag::new();
    let child = parent.child();
    parent.cancel();
    assert!(child.is_cancelled());

    let fresh = CancelFlag::new();
    let sub = fresh.child();
    sub.cancel();
    assert!(!fresh.is_cancelled());
}
