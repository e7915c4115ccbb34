use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use dpsat::cnf::cnf::Formula;
use dpsat::cnf::dimacs::{load_cnf, write_cnf};
use dpsat::cnf::random::random_kcnf;
use dpsat::sat::control::CancelFlag;
use dpsat::sat::dpll::{Dpll, DpllVerdict};
use dpsat::sat::resolution::{FrontierPolicy, ResolutionVerdict, Resolver};
use dpsat::solver::{Backend, SolveResult};

#[derive(Debug, Parser)]
#[command(name = "dpsat")]
#[command(about = "Davis-Putnam resolution and DPLL on DIMACS CNF")]
struct Cli {
    /// Verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Decide one instance with one engine
    Solve {
        path: String,
        #[arg(long, default_value = "dpll")]
        engine: String,
        #[arg(long, default_value = "frontier")]
        policy: String,
        #[arg(long = "timeout-ms")]
        timeout_ms: Option<u64>,
        /// Progress interval in derived clauses (resolution) or decisions (dpll); 0 = off
        #[arg(long, default_value_t = 0)]
        progress: u64,
        /// Print the DPLL model as a DIMACS "v" line
        #[arg(long)]
        model: bool,
    },
    /// Run every engine and compare verdicts
    Check { path: String },
    /// Print instance statistics
    Stats { path: String },
    /// Write a random k-CNF instance
    Gen {
        #[arg(long)]
        vars: u32,
        #[arg(long)]
        clauses: usize,
        #[arg(long, default_value_t = 3)]
        k: usize,
        #[arg(long, default_value_t = 1)]
        seed: u64,
        #[arg(long)]
        planted: bool,
        #[arg(long)]
        emit: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Cmd::Solve {
            path,
            engine,
            policy,
            timeout_ms,
            progress,
            model,
        } => solve_cmd(&path, &engine, &policy, timeout_ms, progress, model)?,
        Cmd::Check { path } => check_cmd(&path)?,
        Cmd::Stats { path } => stats_cmd(&path)?,
        Cmd::Gen {
            vars,
            clauses,
            k,
            seed,
            planted,
            emit,
        } => gen_cmd(vars, clauses, k, seed, planted, &emit)?,
    }
    Ok(())
}

fn parse_policy(s: &str) -> Result<FrontierPolicy> {
    match s {
        "frontier" => Ok(FrontierPolicy::Frontier),
        "naive" => Ok(FrontierPolicy::Naive),
        _ => bail!("unknown policy '{}', expected frontier|naive", s),
    }
}

fn solve_cmd(
    path: &str,
    engine: &str,
    policy: &str,
    timeout_ms: Option<u64>,
    progress: u64,
    model: bool,
) -> Result<()> {
    let policy = parse_policy(policy)?;
    let formula = load_cnf(path)?;
    println!("Loaded {} clauses over {} vars", formula.len(), formula.num_vars());

    let cancel = CancelFlag::new();
    if let Some(ms) = timeout_ms {
        cancel.cancel_after(Duration::from_millis(ms));
    }

    let start = Instant::now();
    match engine {
        "resolution" => {
            let verdict = Resolver::new()
                .policy(policy)
                .progress_every(progress)
                .on_progress(|p| {
                    info!(
                        round = p.round,
                        steps = p.steps,
                        new_clauses = p.new_clauses,
                        clauses = p.clauses,
                        "resolution progress"
                    )
                })
                .cancel_flag(cancel)
                .solve(&formula);
            let status = match verdict {
                ResolutionVerdict::Sat { .. } => "SAT",
                ResolutionVerdict::Unsat { .. } => "UNSAT",
                ResolutionVerdict::Interrupted { .. } => "UNKNOWN",
            };
            println!("Status: {status}");
            println!("Steps: {}", verdict.steps());
            println!("New clauses: {}", verdict.new_clauses());
        }
        "dpll" | "dpll-par" => {
            let mut dpll = Dpll::new()
                .progress_every(progress)
                .on_progress(|p| {
                    info!(
                        decisions = p.decisions,
                        conflicts = p.conflicts,
                        depth = p.depth,
                        "dpll progress"
                    )
                })
                .cancel_flag(cancel);
            let verdict = if engine == "dpll-par" {
                dpll.solve_parallel(&formula)
            } else {
                dpll.solve(&formula)
            };
            let stats = dpll.stats();
            let status = match &verdict {
                DpllVerdict::Sat { .. } => "SAT",
                DpllVerdict::Unsat => "UNSAT",
                DpllVerdict::Interrupted => "UNKNOWN",
            };
            println!("Status: {status}");
            println!("Decisions: {}", stats.decisions);
            println!("Conflicts: {}", stats.conflicts);
            if let (true, Some(assignment)) = (model, verdict.assignment()) {
                let lits = assignment
                    .lits()
                    .iter()
                    .map(|l| l.to_string())
                    .collect::<Vec<_>>();
                println!("v {} 0", lits.join(" "));
            }
        }
        "varisat" => {
            let mut solver = Backend::Varisat.build(None);
            println!("Status: {}", solver.solve(&formula));
        }
        _ => bail!("unknown engine '{}', expected resolution|dpll|dpll-par|varisat", engine),
    }
    println!("Time: {:.3}s", start.elapsed().as_secs_f64());
    Ok(())
}

fn check_cmd(path: &str) -> Result<()> {
    let formula = load_cnf(path)?;
    let mut verdicts = Vec::new();
    for backend in Backend::ALL {
        let mut solver = backend.build(None);
        let start = Instant::now();
        let result = solver.solve(&formula);
        println!(
            "engine={} status={} ms={}",
            solver.backend_name(),
            result,
            start.elapsed().as_millis()
        );
        if result == SolveResult::Sat && solver.backend_name().starts_with("dpll") {
            ensure_model(&formula, solver.as_ref())?;
        }
        verdicts.push(result);
    }
    if verdicts.windows(2).any(|w| w[0] != w[1]) {
        bail!("engines disagree on {}", path);
    }
    println!("CHECK: all engines agree");
    Ok(())
}

fn ensure_model(formula: &Formula, solver: &dyn dpsat::solver::SatSolver) -> Result<()> {
    for clause in formula.clauses() {
        let ok = clause
            .lits()
            .iter()
            .any(|l| solver.model_value(l.var) == Some(l.sign));
        if !ok {
            bail!("{} model falsifies clause {}", solver.backend_name(), clause);
        }
    }
    Ok(())
}

fn stats_cmd(path: &str) -> Result<()> {
    let formula = load_cnf(path)?;
    println!("num_vars={}", formula.num_vars());
    println!("used_vars={}", formula.variables().len());
    println!("num_clauses={}", formula.len());
    println!("max_clause_width={}", formula.max_clause_width());
    println!("has_empty_clause={}", formula.has_empty_clause());
    Ok(())
}

fn gen_cmd(
    vars: u32,
    clauses: usize,
    k: usize,
    seed: u64,
    planted: bool,
    emit: &str,
) -> Result<()> {
    let inst = random_kcnf(vars, clauses, k, seed, planted)?;
    write_cnf(emit, &inst.formula)?;
    println!(
        "GEN: wrote {} | vars={} clauses={} k={} planted={}",
        emit,
        vars,
        inst.formula.len(),
        k,
        planted
    );
    Ok(())
}
