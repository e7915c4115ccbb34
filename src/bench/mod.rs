use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cnf::dimacs::load_cnf;
use crate::sat::control::CancelFlag;
use crate::solver::{Backend, SolveResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchRow {
    pub path: String,
    pub status: String,
    pub engine: String,
    pub verdict: String,
    pub wall_ms: Option<u128>,
    pub steps: Option<u64>,
    pub new_clauses: Option<u64>,
    pub decisions: Option<u64>,
    pub conflicts: Option<u64>,
    pub vars: Option<u32>,
    pub clauses: Option<usize>,
}

impl BenchRow {
    pub fn csv_header() -> &'static str {
        "path,status,engine,verdict,wall_ms,steps,new_clauses,decisions,conflicts,vars,clauses"
    }

    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{},{},{}",
            esc_csv(&self.path),
            self.status,
            self.engine,
            self.verdict,
            opt_u128(self.wall_ms),
            opt_u64(self.steps),
            opt_u64(self.new_clauses),
            opt_u64(self.decisions),
            opt_u64(self.conflicts),
            opt_u32(self.vars),
            opt_usize(self.clauses),
        )
    }

    fn empty(path: &Path, backend: Backend) -> Self {
        Self {
            path: path.to_string_lossy().to_string(),
            status: "ok".to_string(),
            engine: backend.name().to_string(),
            verdict: String::new(),
            wall_ms: None,
            steps: None,
            new_clauses: None,
            decisions: None,
            conflicts: None,
            vars: None,
            clauses: None,
        }
    }
}

/// Solves one instance with one engine under a wall-clock budget.
///
/// The solve runs on a worker thread. When the budget runs out the worker's
/// cancel flag is raised and a `timeout` row is returned without waiting for
/// it; engines that poll the flag stop shortly after, varisat runs to the end
/// in the background.
pub fn run_one(path: &Path, backend: Backend, timeout: Duration) -> BenchRow {
    let mut row = BenchRow::empty(path, backend);
    let formula = match load_cnf(path) {
        Ok(v) => v,
        Err(e) => {
            warn!(path = %path.display(), "skipping instance: {e:#}");
            row.status = "parse_error".to_string();
            return row;
        }
    };
    row.vars = Some(formula.num_vars());
    row.clauses = Some(formula.len());

    let cancel = CancelFlag::new();
    let worker_cancel = cancel.clone();
    let start = Instant::now();
    let (tx, rx) = mpsc::channel();

    std::thread::spawn(move || {
        let mut solver = backend.build(Some(worker_cancel));
        let result = solver.solve(&formula);
        let _ = tx.send((result, solver.stats()));
    });

    match rx.recv_timeout(timeout) {
        Ok((result, stats)) => {
            row.wall_ms = Some(start.elapsed().as_millis());
            row.verdict = result.to_string();
            if result == SolveResult::Unknown {
                row.status = "timeout".to_string();
            }
            match backend {
                Backend::Resolution(_) => {
                    row.steps = Some(stats.steps);
                    row.new_clauses = Some(stats.new_clauses);
                }
                Backend::Dpll | Backend::DpllParallel => {
                    row.decisions = Some(stats.decisions);
                    row.conflicts = Some(stats.conflicts);
                }
                Backend::Varisat => {}
            }
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            cancel.cancel();
            row.status = "timeout".to_string();
            row.verdict = SolveResult::Unknown.to_string();
            row.wall_ms = Some(start.elapsed().as_millis());
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            row.status = "internal_error".to_string();
            row.wall_ms = Some(start.elapsed().as_millis());
        }
    }
    row
}

pub fn run_dataset(
    dir: &Path,
    backends: &[Backend],
    timeout: Duration,
    csv_path: &Path,
) -> Result<Vec<BenchRow>> {
    let paths =
        discover_paths(dir).with_context(|| format!("failed to scan {}", dir.display()))?;
    let mut csv = File::create(csv_path)
        .with_context(|| format!("failed to create {}", csv_path.display()))?;
    writeln!(csv, "{}", BenchRow::csv_header())?;
    csv.flush()?;

    let mut rows = Vec::new();
    for path in paths {
        for &backend in backends {
            let row = run_one(&path, backend, timeout);
            info!(
                path = %row.path,
                engine = %row.engine,
                status = %row.status,
                verdict = %row.verdict,
                wall_ms = row.wall_ms.unwrap_or_default() as u64,
                "bench row"
            );
            writeln!(csv, "{}", row.to_csv_line())?;
            csv.flush()?;
            rows.push(row);
        }
    }

    Ok(rows)
}

fn discover_paths(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut out = Vec::<PathBuf>::new();
    collect_paths(dir, &mut out)?;
    out.sort();
    Ok(out)
}

fn collect_paths(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let p = entry.path();
        if p.is_dir() {
            collect_paths(&p, out)?;
            continue;
        }
        if p.extension().and_then(|x| x.to_str()) == Some("cnf") {
            out.push(p);
        }
    }
    Ok(())
}

fn opt_usize(v: Option<usize>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}
fn opt_u32(v: Option<u32>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}
fn opt_u64(v: Option<u64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}
fn opt_u128(v: Option<u128>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

fn esc_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
