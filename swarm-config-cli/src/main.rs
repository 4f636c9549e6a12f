mod cli;
mod config;
mod output;

use std::process;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use swarm_config::{DockerEngine, InMemorySwarm, Migrator, SwarmApi};
use tracing::{Level, error, info};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use crate::cli::Args;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let json = args.json;
    if let Err(e) = run(args).await {
        error!("{:#}", e);
        output::print_error(&e, json);
        process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let settings = config::engine_settings(&args).context("invalid engine settings")?;
    info!(
        host = %settings.base_url(),
        api_version = %settings.api_version,
        "Connecting to engine"
    );

    let engine: Arc<dyn SwarmApi> = Arc::new(
        DockerEngine::connect(settings)
            .await
            .context("failed to set up engine client")?,
    );

    let api: Arc<dyn SwarmApi> = if args.dry_run {
        let snapshot = InMemorySwarm::snapshot(engine.as_ref())
            .await
            .context("failed to snapshot cluster for dry run")?;
        Arc::new(snapshot)
    } else {
        engine
    };

    let report = Migrator::new(api)
        .migrate(&args.from_config, &args.to_config)
        .await?;

    output::print_report(&report, args.dry_run, args.json)
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(verbose),
        )
        .init();
}
