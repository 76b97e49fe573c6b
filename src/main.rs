//! allkeyshop exporter
//!
//! Resolves the products in the settings file, then serves their best
//! prices on a Prometheus scrape endpoint while refreshing them every minute.

use allkeyshop_exporter::{
    constants::{
        ALLKEYSHOP_BASE_URL, DEFAULT_ADDRESS, DEFAULT_CONFIG_PATH, DEFAULT_PORT, REFRESH_INTERVAL_SECS,
        REQUEST_TIMEOUT_SECS,
    },
    providers::AllKeyShopProvider,
    server,
    telemetry::init_tracing,
    tracker::{PriceTracker, TrackerOptions},
    ConfigError, Settings, StartupError,
};
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

/// Prometheus exporter for allkeyshop.com best prices
#[derive(Parser, Debug)]
#[command(name = "allkeyshop-exporter")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the settings file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Address to listen on
    #[arg(short, long, default_value = DEFAULT_ADDRESS)]
    address: IpAddr,

    /// Seconds between two price updates
    #[arg(long, default_value_t = REFRESH_INTERVAL_SECS, value_parser = clap::value_parser!(u64).range(1..))]
    interval_secs: u64,

    /// Timeout of a single request to allkeyshop, in seconds
    #[arg(long, default_value_t = REQUEST_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: u64,

    /// Number of products fetched at the same time
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    concurrency: u16,
}

/// Loads the settings and resolves every product
///
/// Any error here means the exporter must not start serving.
async fn setup(args: &Args) -> Result<PriceTracker, StartupError> {
    tracing::info!(config = %args.config.display(), "Loading settings");
    let settings = Settings::load(&args.config)?;

    if settings.products.is_empty() {
        tracing::warn!("No products configured, only an empty gauge will be served");
    }

    let provider = AllKeyShopProvider::with_options(
        ALLKEYSHOP_BASE_URL,
        Duration::from_secs(args.timeout_secs),
    )
    .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

    let options = TrackerOptions {
        interval: Duration::from_secs(args.interval_secs),
        concurrency: usize::from(args.concurrency),
        ..TrackerOptions::default()
    };

    PriceTracker::from_specs(&settings.products, Arc::new(provider), options).await
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = init_tracing("info") {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    let args = Args::parse();

    let tracker = match setup(&args).await {
        Ok(tracker) => Arc::new(tracker),
        Err(e) => {
            tracing::error!(error = %e, "Failed to set up products");
            return ExitCode::FAILURE;
        }
    };

    let addr = SocketAddr::new(args.address, args.port);
    let poller = tracker.start_background_task();

    let result = tokio::select! {
        result = server::serve(tracker.clone(), addr) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
            Ok(())
        }
    };

    poller.abort();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Scrape endpoint failed");
            ExitCode::FAILURE
        }
    }
}
