use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use dpsat::bench::run_dataset;
use dpsat::solver::Backend;

#[derive(Debug, Parser)]
#[command(name = "bench_dataset")]
struct Cli {
    #[arg(long)]
    dir: String,
    /// Engine to run; repeat for several
    #[arg(long = "engine", default_values_t = vec!["resolution".to_string(), "dpll".to_string()])]
    engines: Vec<String>,
    #[arg(long = "timeout_ms", default_value_t = 30000)]
    timeout_ms: u64,
    #[arg(long)]
    csv: String,
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter = if cli.verbose > 0 { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();
    run_from_args(&cli)
}

fn run_from_args(cli: &Cli) -> Result<()> {
    let backends = cli
        .engines
        .iter()
        .map(|s| s.parse::<Backend>())
        .collect::<Result<Vec<_>>>()?;
    let rows = run_dataset(
        &PathBuf::from(&cli.dir),
        &backends,
        Duration::from_millis(cli.timeout_ms),
        &PathBuf::from(&cli.csv),
    )?;
    println!("rows={}", rows.len());
    Ok(())
}
