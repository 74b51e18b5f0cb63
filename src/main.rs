//! rateforge: hotel discount analysis CLI
//!
//! Runs the full pipeline and prints the report to stdout.

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use rateforge::logging::{init_logging, LogConfig};
use rateforge::{report, run, Args};

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&LogConfig::from_verbosity(args.verbose))
        .context("failed to install log subscriber")?;

    let config = args.to_config()?;
    let start_time = Instant::now();

    let analysis = run(&config)
        .with_context(|| format!("analysis of {} failed", config.input.display()))?;

    report::print_report(&analysis);

    println!(
        "\nTotal processing time: {:.2}s",
        start_time.elapsed().as_secs_f64()
    );
    Ok(())
}
