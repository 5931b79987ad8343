use anyhow::Context;
use clap::Parser;

use karnataka_master::{args::Args, pipeline, report::print_run_report};

fn main() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = Args::parse().into_config();
    let outcome = pipeline::run(&config).context("build failed")?;
    print_run_report(&outcome);
    Ok(())
}
