use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dining_philosophers::{metrics, Metrics, Supervisor, TableConfig};

#[derive(Parser)]
#[command(name = "dining-philosophers")]
#[command(about = "Philosophers contending for the forks between them")]
struct Cli {
    /// JSON config file; flags below override it
    #[arg(long, env = "DINING_CONFIG")]
    config: Option<PathBuf>,

    /// Number of philosophers (and forks)
    #[arg(long)]
    philosophers: Option<usize>,

    /// Seed for seating orientation and phase durations
    #[arg(long)]
    seed: Option<u64>,

    /// Stop each philosopher after this many rounds
    #[arg(long)]
    rounds: Option<u64>,

    /// Stop the dinner after this many seconds
    #[arg(long)]
    run_for_secs: Option<u64>,

    /// Serve Prometheus metrics on this port
    #[arg(long)]
    metrics_port: Option<u16>,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<TableConfig> {
        let mut config = match &self.config {
            Some(path) => TableConfig::from_json_file(path)?,
            None => TableConfig::default(),
        };

        if let Some(philosophers) = self.philosophers {
            config.philosophers = philosophers;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.rounds.is_some() {
            config.rounds = self.rounds;
        }
        if self.run_for_secs.is_some() {
            config.run_for_secs = self.run_for_secs;
        }
        if self.metrics_port.is_some() {
            config.metrics_port = self.metrics_port;
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with environment-based filtering
    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=dining_philosophers=info cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,dining_philosophers=debug")),
        )
        .init();

    let config = Cli::parse().into_config().context("Invalid configuration")?;

    tracing::info!("🚀 Starting Dining Philosophers");

    // === 1. Initialize Prometheus metrics ===
    let metrics = Arc::new(Metrics::new()?);

    // Start metrics HTTP server in background thread
    if let Some(port) = config.metrics_port {
        let exported = metrics.clone();
        std::thread::spawn(move || {
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    tracing::error!("Failed to start metrics runtime: {}", e);
                    return;
                }
            };
            rt.block_on(async {
                if let Err(e) = metrics::start_metrics_server(exported, port).await {
                    tracing::error!("Metrics server error: {}", e);
                }
            });
        });
    }

    // === 2. Stop on Ctrl-C ===
    let stop = CancellationToken::new();
    let interrupt = {
        let stop = stop.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Received interrupt, clearing the table");
                stop.cancel();
            }
        })
    };

    // === 3. Serve dinner ===
    let supervisor = Supervisor::new(config, metrics).context("Invalid configuration")?;
    let report = supervisor.run(stop).await.context("Dinner aborted")?;
    interrupt.abort();

    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
