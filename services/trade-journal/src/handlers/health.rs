//! Health check and monitoring handlers

use axum::{extract::State, http::StatusCode, response::Json};
use metrics_exporter_prometheus::PrometheusHandle;
use rustc_hash::FxHashMap;
use std::{sync::Arc, time::Instant};
use tracing::{debug, error};

use crate::{
    models::{FeedHealth, HealthCheckResponse},
    price_feed::PriceFeedCache,
    store::TradeStore,
};

/// Health check handlers
#[derive(Clone)]
pub struct HealthHandlers {
    store: Arc<dyn TradeStore>,
    cache: Arc<PriceFeedCache>,
    feed_enabled: bool,
    prometheus: Option<PrometheusHandle>,
    start_time: Instant,
}

impl HealthHandlers {
    pub fn new(
        store: Arc<dyn TradeStore>,
        cache: Arc<PriceFeedCache>,
        feed_enabled: bool,
        prometheus: Option<PrometheusHandle>,
        start_time: Instant,
    ) -> Self {
        Self {
            store,
            cache,
            feed_enabled,
            prometheus,
            start_time,
        }
    }

    /// Health check endpoint.
    ///
    /// An unreachable store is unhealthy (503); a stale price feed only
    /// degrades the service. A disabled feed is not reported at all.
    pub async fn health_check(
        State(handlers): State<Self>,
    ) -> (StatusCode, Json<HealthCheckResponse>) {
        debug!("Health check request");

        let store_ok = match handlers.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                error!("Trade store health check failed: {}", e);
                false
            }
        };

        let mut services = FxHashMap::default();
        services.insert("store".to_string(), store_ok);

        let (feed_fresh, price_feed) = if handlers.feed_enabled {
            let fresh = !handlers.cache.snapshot().stale;
            services.insert("price_feed".to_string(), fresh);

            let state = handlers.cache.state();
            let detail = FeedHealth {
                fetched_at: state.fetched_at,
                last_attempt: state.last_attempt,
                consecutive_failures: state.consecutive_failures,
                last_error: state.last_error.clone(),
            };
            (fresh, Some(detail))
        } else {
            (true, None)
        };

        let (status_code, status) = match (store_ok, feed_fresh) {
            (true, true) => (StatusCode::OK, "healthy"),
            (true, false) => (StatusCode::OK, "degraded"),
            (false, _) => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy"),
        };

        let response = HealthCheckResponse {
            status: status.to_string(),
            services,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: handlers.start_time.elapsed().as_secs(),
            price_feed,
        };

        (status_code, Json(response))
    }

    /// Prometheus metrics endpoint
    pub async fn metrics(State(handlers): State<Self>) -> Result<String, StatusCode> {
        handlers
            .prometheus
            .as_ref()
            .map(PrometheusHandle::render)
            .ok_or(StatusCode::NOT_FOUND)
    }
}
