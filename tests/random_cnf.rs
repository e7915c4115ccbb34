use dpsat::cnf::random::random_kcnf;

#[test]
fn same_seed_same_instance() {
    let a = random_kcnf(20, 60, 3, 9, false).expect("generate");
    let b = random_kcnf(20, 60, 3, 9, false).expect("generate");
    assert_eq!(a, b);
    let c = random_kcnf(20, 60, 3, 10, false).expect("generate");
    assert_ne!(a.formula, c.formula);
}

#[test]
fn clauses_have_k_distinct_variables() {
    let inst = random_kcnf(12, 40, 4, 3, false).expect("generate");
    assert_eq!(inst.formula.len(), 40);
    assert_eq!(inst.formula.num_vars(), 12);
    for clause in inst.formula.clauses() {
        assert_eq!(clause.len(), 4);
        assert!(clause.lits().iter().all(|l| (1..=12).contains(&l.var)));
    }
    assert!(inst.planted.is_none());
}

#[test]
fn rejects_bad_widths() {
    assert!(random_kcnf(3, 5, 0, 1, false).is_err());
    assert!(random_kcnf(3, 5, 4, 1, false).is_err());
}
