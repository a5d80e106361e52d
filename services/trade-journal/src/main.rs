//! Trade journal - Main Entry Point

use anyhow::Result;
use clap::{Arg, Command};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trade_journal::{JournalConfig, StoreBackend, start_server};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is normal outside local development
    let dotenv_loaded = dotenv::dotenv().is_ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trade_journal=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let matches = Command::new("trade-journal")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Trade Journal Team")
        .about("REST backend for a crypto trading journal")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("journal.toml"),
        )
        .arg(
            Arg::new("routes")
                .long("routes")
                .help("Print available routes and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    if matches.get_flag("routes") {
        trade_journal::server::print_routes();
        return Ok(());
    }

    if dotenv_loaded {
        info!("Loaded environment from .env");
    }

    let default_config = "journal.toml".to_string();
    let config_path = matches
        .get_one::<String>("config")
        .unwrap_or(&default_config);
    let config = match JournalConfig::load(config_path) {
        Ok(config) => {
            info!("Loaded configuration from: {}", config_path);
            config
        }
        Err(e) => {
            error!("Failed to load config from {}: {}", config_path, e);
            warn!("Using default configuration");
            JournalConfig::default()
        }
    };

    info!("Starting Trade Journal v{}", env!("CARGO_PKG_VERSION"));
    info!("Server will bind to: {}", config.server_address());
    info!(
        "Trade store: {}",
        match config.store.backend {
            StoreBackend::Memory => "memory",
            StoreBackend::Postgres => "postgres",
        }
    );
    info!("Price feed:");
    info!("  Enabled: {}", config.price_feed.enabled);
    info!("  Exchange: {}", config.price_feed.base_url);
    info!(
        "  Refresh: every {}s for {} pairs",
        config.price_feed.refresh_interval_seconds,
        config.price_feed.pairs.len()
    );

    info!("Features enabled:");
    info!("  CORS: {}", config.cors.enabled);
    info!("  Metrics: {}", config.monitoring.metrics_enabled);
    info!("  Compression: {}", config.server.compression);

    if let Err(e) = start_server(config).await {
        error!("Server error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
