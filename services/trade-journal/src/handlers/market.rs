//! Exchange ticker handlers

use axum::{
    extract::{Query, State, rejection::QueryRejection},
    response::Json,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

use crate::{
    errors::{JournalError, JournalResult},
    models::TickerResponse,
    price_feed::{PriceFeedCache, TickerSource},
};

/// Query string of `GET /mexc/ticker`
#[derive(Debug, Deserialize)]
pub struct TickerQuery {
    /// Comma-separated pairs, e.g. `BTC/USDT,ETH/USDT`
    pub symbols: Option<String>,
}

/// Market data handlers
#[derive(Clone)]
pub struct MarketHandlers {
    cache: Arc<PriceFeedCache>,
    source: Arc<dyn TickerSource>,
}

impl MarketHandlers {
    pub fn new(cache: Arc<PriceFeedCache>, source: Arc<dyn TickerSource>) -> Self {
        Self { cache, source }
    }

    /// `GET /mexc/popular-pairs`, served from the background cache
    pub async fn popular_pairs(State(handlers): State<Self>) -> Json<TickerResponse> {
        Json(handlers.cache.snapshot().to_response())
    }

    /// `GET /mexc/ticker`, fetched live with the cache as fallback
    pub async fn ticker(
        State(handlers): State<Self>,
        query: Result<Query<TickerQuery>, QueryRejection>,
    ) -> JournalResult<Json<TickerResponse>> {
        let Query(query) = query?;
        let pairs = parse_symbols(query.symbols.as_deref())?;

        match handlers.source.fetch_24h(&pairs).await {
            Ok(tickers) => Ok(Json(TickerResponse {
                tickers,
                fetched_at: Some(Utc::now()),
                stale: false,
            })),
            Err(e) => {
                warn!("Live ticker lookup failed, serving cached entries: {}", e);
                let snapshot = handlers.cache.snapshot();
                Ok(Json(TickerResponse {
                    tickers: snapshot.select(&pairs),
                    fetched_at: snapshot.fetched_at,
                    stale: true,
                }))
            }
        }
    }
}

/// Split and normalize a `symbols` parameter
fn parse_symbols(raw: Option<&str>) -> JournalResult<Vec<String>> {
    let mut pairs: Vec<String> = Vec::new();
    for pair in raw.unwrap_or_default().split(',') {
        let pair = pair.trim().to_uppercase();
        if !pair.is_empty() && !pairs.contains(&pair) {
            pairs.push(pair);
        }
    }

    if pairs.is_empty() {
        return Err(JournalError::validation(
            "'symbols' must list at least one pair",
        ));
    }
    Ok(pairs)
}
