//! Trade journal server implementation

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef},
    middleware,
    response::Json,
    routing::get,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::{net::SocketAddr, sync::Arc, time::Instant};
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::{
    config::JournalConfig,
    handlers::{HealthHandlers, MarketHandlers, TradeHandlers},
    metrics,
    middleware::{create_cors_layer, logging_middleware},
    models::MessageResponse,
    price_feed::PriceFeed,
    store::{self, TradeStore},
};

/// Unified application state; each handler group extracts its own slice
#[derive(Clone, FromRef)]
pub struct AppState {
    pub trades: TradeHandlers,
    pub market: MarketHandlers,
    pub health: HealthHandlers,
}

impl AppState {
    pub fn new(
        store: Arc<dyn TradeStore>,
        feed: &PriceFeed,
        prometheus: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            trades: TradeHandlers::new(Arc::clone(&store)),
            market: MarketHandlers::new(feed.cache(), feed.source()),
            health: HealthHandlers::new(
                store,
                feed.cache(),
                feed.is_enabled(),
                prometheus,
                Instant::now(),
            ),
        }
    }
}

/// Trade journal HTTP server
pub struct JournalServer {
    config: JournalConfig,
    store: Arc<dyn TradeStore>,
    feed: PriceFeed,
    prometheus: Option<PrometheusHandle>,
}

impl JournalServer {
    /// Connect the store and prepare the price feed
    pub async fn new(config: JournalConfig) -> Result<Self> {
        info!("Initializing trade journal server");

        let store = match store::connect(&config.store).await {
            Ok(store) => store,
            Err(e) => {
                error!("Failed to open trade store: {}", e);
                return Err(e.into());
            }
        };

        let feed = PriceFeed::from_config(&config.price_feed)
            .context("Failed to configure price feed")?;

        let prometheus = if config.monitoring.metrics_enabled {
            Some(metrics::install_recorder()?)
        } else {
            None
        };

        info!("Trade journal server initialized successfully");

        Ok(Self {
            config,
            store,
            feed,
            prometheus,
        })
    }

    /// Start the price feed and serve until interrupted
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self
            .config
            .server_address()
            .parse()
            .with_context(|| format!("Invalid server address '{}'", self.config.server_address()))?;

        let feed_task = if self.feed.is_enabled() {
            Some(self.feed.clone().spawn())
        } else {
            warn!("Price feed disabled; popular pairs will report stale data");
            None
        };

        let state = AppState::new(self.store, &self.feed, self.prometheus);
        let app = build_router(state, &self.config);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind to address {addr}"))?;
        info!("Trade journal listening on {}", addr);

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        if let Some(task) = feed_task {
            task.abort();
        }

        served.context("Server error")?;
        info!("Trade journal stopped");
        Ok(())
    }
}

/// Build the application router with all routes and middleware
pub fn build_router(state: AppState, config: &JournalConfig) -> Router {
    let api = Router::new()
        .route("/", get(api_root))
        .route(
            "/trades",
            get(TradeHandlers::list).post(TradeHandlers::create),
        )
        .route("/trades/stats/summary", get(TradeHandlers::summary))
        .route(
            "/trades/:id",
            get(TradeHandlers::get)
                .put(TradeHandlers::update)
                .delete(TradeHandlers::delete),
        )
        .route("/mexc/popular-pairs", get(MarketHandlers::popular_pairs))
        .route("/mexc/ticker", get(MarketHandlers::ticker));

    let mut router = Router::new()
        .route(&config.monitoring.health_path, get(HealthHandlers::health_check))
        .route(&config.monitoring.metrics_path, get(HealthHandlers::metrics))
        .route("/api/", get(api_root))
        .nest("/api", api)
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(TimeoutLayer::new(std::time::Duration::from_secs(
            config.server.timeout_seconds,
        )))
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http());

    if config.server.compression {
        router = router.layer(CompressionLayer::new());
    }
    if config.cors.enabled {
        router = router.layer(create_cors_layer(&config.cors));
    }

    router
}

async fn api_root() -> Json<MessageResponse> {
    Json(MessageResponse::new("Crypto Trading Journal API"))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// API route documentation
pub fn print_routes() {
    println!("Trade Journal Routes:");
    println!("=====================");
    println!();
    println!("Health & Monitoring:");
    println!("  GET    /health                    - Health check");
    println!("  GET    /metrics                   - Prometheus metrics");
    println!();
    println!("Trades:");
    println!("  GET    /api/trades                - List trades (filter, sort, paginate)");
    println!("  POST   /api/trades                - Create trade");
    println!("  GET    /api/trades/:id            - Get trade");
    println!("  PUT    /api/trades/:id            - Replace trade");
    println!("  DELETE /api/trades/:id            - Delete trade");
    println!("  GET    /api/trades/stats/summary  - Journal statistics");
    println!();
    println!("Market Data:");
    println!("  GET    /api/mexc/popular-pairs    - Cached 24h tickers");
    println!("  GET    /api/mexc/ticker?symbols=  - Live 24h tickers");
}
