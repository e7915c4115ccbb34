use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use dpsat::bench::{BenchRow, run_dataset, run_one};
use dpsat::cnf::dimacs::write_cnf;
use dpsat::cnf::random::random_kcnf;
use dpsat::sat::resolution::FrontierPolicy;
use dpsat::solver::Backend;

#[test]
fn benchmark_csv_has_expected_shape() {
    let root = temp_dataset_dir("bench_csv_shape");
    fs::create_dir_all(root.join("nested")).expect("mkdir");

    fs::write(root.join("a_sat.cnf"), "c sat\np cnf 2 1\n1 2 0\n").expect("write sat");
    fs::write(root.join("nested/b_unsat.cnf"), "p cnf 1 2\n1 0\n-1 0\n").expect("write unsat");
    fs::write(root.join("c_broken.cnf"), "p cnf 2 1\n1 2\n").expect("write broken");
    fs::write(root.join("notes.txt"), "not an instance\n").expect("write txt");

    let csv_path = root.join("results.csv");
    let backends = [Backend::Resolution(FrontierPolicy::Frontier), Backend::Dpll];
    let rows = run_dataset(&root, &backends, Duration::from_millis(10_000), &csv_path)
        .expect("run dataset");
    assert_eq!(rows.len(), 6);

    let csv_text = fs::read_to_string(&csv_path).expect("read csv");
    let mut lines = csv_text.lines();
    let header = lines.next().unwrap_or("");
    assert_eq!(header, BenchRow::csv_header());
    let data = lines.collect::<Vec<_>>();
    assert_eq!(data.len(), 6);

    for line in &data {
        let cols = line.split(',').collect::<Vec<_>>();
        assert_eq!(cols.len(), 11);
    }

    // sorted paths: a_sat, c_broken, nested/b_unsat
    assert_eq!(rows[0].engine, "resolution");
    assert_eq!(rows[0].verdict, "SAT");
    assert_eq!(rows[0].steps, Some(0));
    assert_eq!(rows[1].engine, "dpll");
    assert_eq!(rows[1].verdict, "SAT");

    assert_eq!(rows[2].status, "parse_error");
    assert_eq!(rows[3].status, "parse_error");

    assert_eq!(rows[4].verdict, "UNSAT");
    assert_eq!(rows[4].steps, Some(1));
    assert_eq!(rows[5].verdict, "UNSAT");
    assert_eq!(rows[5].decisions, Some(0));
    for row in rows.iter().filter(|r| r.status != "parse_error") {
        assert_eq!(row.status, "ok");
        assert!(row.wall_ms.is_some());
    }
}

#[test]
fn exhausted_budget_yields_timeout_row() {
    let root = temp_dataset_dir("bench_timeout");
    fs::create_dir_all(&root).expect("mkdir");
    let path = root.join("hard.cnf");
    let inst = random_kcnf(60, 255, 3, 5, false).expect("generate");
    write_cnf(&path, &inst.formula).expect("write cnf");

    let row = run_one(
        &path,
        Backend::Resolution(FrontierPolicy::Naive),
        Duration::ZERO,
    );
    assert_eq!(row.status, "timeout");
    assert_eq!(row.verdict, "UNKNOWN");
    assert_eq!(row.vars, Some(60));
    assert_eq!(row.clauses, Some(255));
}

fn temp_dataset_dir(tag: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    let t = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time")
        .as_nanos();
    p.push(format!("dpsat_{}_{}", tag, t));
    p
}
