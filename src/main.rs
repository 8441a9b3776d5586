//! Heart Rate Relay CLI
//!
//! Receives heart-rate readings from a watch over HTTP and re-exposes the
//! latest value for overlays, OSC receivers and Prometheus.

use clap::Parser;
use heart_rate_relay::{
    config::{FileConfig, MetricTarget},
    server::RelayServer,
    sink::Sinks,
};
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Command-line options. Flags override the config file.
#[derive(Debug, Parser)]
#[command(name = "heart-rate-relay", version, about)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on.
    #[arg(short, long)]
    port: Option<u16>,

    /// Label value for `heart_rate_bpm{target=...}`.
    #[arg(long)]
    metric_target: Option<String>,

    /// Append every reading to a CSV file.
    #[arg(long)]
    log_csv: bool,
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match FileConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if cli.log_csv {
        config.csv.enabled = true;
    }

    let target = MetricTarget::resolve(cli.metric_target.as_deref(), config.metric_target.as_deref());

    info!("Heart Rate Relay v{}", heart_rate_relay::VERSION);
    info!(
        port = config.server.port,
        metric_target = %target,
        "Starting HTTP server"
    );
    if config.visualization.enabled {
        warn!("Visualization is provided by a separate tool; flag ignored");
    }

    let sinks = Sinks::from_config(&config.osc, &config.csv).await;

    let server = match RelayServer::bind(&config.server, target, sinks).await {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        error!("Server stopped with error: {}", e);
        std::process::exit(1);
    }

    info!("Done");
}
