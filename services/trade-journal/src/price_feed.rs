//! Exchange price feed cache
//!
//! A background task refreshes 24h tickers for a fixed pair set on a fixed
//! interval. The snapshot is swapped wholesale, so readers always see one
//! complete set. Failed refreshes keep the previous set and mark it stale;
//! the next tick is the retry.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use reqwest::Client;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::{sync::Arc, time::Duration};
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::{
    config::PriceFeedConfig,
    errors::{JournalError, JournalResult},
    metrics,
    models::{TickerResponse, TickerSnapshot},
};

const TICKER_24H_PATH: &str = "/api/v3/ticker/24hr";

/// Source of 24h ticker statistics
#[async_trait]
pub trait TickerSource: Send + Sync {
    /// Tickers for `pairs`, in the order given; pairs the exchange does not
    /// list are omitted
    async fn fetch_24h(&self, pairs: &[String]) -> JournalResult<Vec<TickerSnapshot>>;
}

/// `BTC/USDT` -> `BTCUSDT`
#[must_use]
pub fn exchange_symbol(pair: &str) -> String {
    pair.replace('/', "").to_uppercase()
}

/// Raw MEXC 24h ticker; numbers arrive as strings
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MexcTicker {
    symbol: String,
    last_price: String,
    #[serde(default)]
    price_change: Option<String>,
    price_change_percent: String,
    #[serde(default)]
    high_price: Option<String>,
    #[serde(default)]
    low_price: Option<String>,
    #[serde(default)]
    volume: Option<String>,
}

impl MexcTicker {
    fn into_snapshot(self, pair: &str) -> JournalResult<TickerSnapshot> {
        Ok(TickerSnapshot {
            symbol: pair.to_string(),
            last_price: parse_number("lastPrice", &self.last_price)?,
            price_change: parse_optional("priceChange", self.price_change.as_deref())?,
            price_change_percent: parse_number("priceChangePercent", &self.price_change_percent)?,
            high_price: parse_optional("highPrice", self.high_price.as_deref())?,
            low_price: parse_optional("lowPrice", self.low_price.as_deref())?,
            volume: parse_optional("volume", self.volume.as_deref())?,
        })
    }
}

fn parse_number(field: &str, raw: &str) -> JournalResult<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|e| JournalError::Upstream(format!("invalid {field} '{raw}': {e}")))
}

fn parse_optional(field: &str, raw: Option<&str>) -> JournalResult<f64> {
    raw.map_or(Ok(0.0), |raw| parse_number(field, raw))
}

/// MEXC public REST client
#[derive(Debug, Clone)]
pub struct MexcClient {
    client: Client,
    base_url: String,
}

impl MexcClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> JournalResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("trade-journal/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl TickerSource for MexcClient {
    async fn fetch_24h(&self, pairs: &[String]) -> JournalResult<Vec<TickerSnapshot>> {
        let url = format!("{}{}", self.base_url, TICKER_24H_PATH);

        // One request for every listed symbol keeps a refresh all-or-nothing
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(JournalError::Upstream(format!(
                "ticker endpoint returned status {}",
                response.status()
            )));
        }

        let raw: Vec<MexcTicker> = response.json().await?;
        let mut by_symbol: FxHashMap<String, MexcTicker> =
            raw.into_iter().map(|t| (t.symbol.clone(), t)).collect();

        let mut tickers = Vec::with_capacity(pairs.len());
        for pair in pairs {
            match by_symbol.remove(&exchange_symbol(pair)) {
                Some(ticker) => match ticker.into_snapshot(pair) {
                    Ok(snapshot) => tickers.push(snapshot),
                    Err(e) => warn!("Skipping ticker for {}: {}", pair, e),
                },
                None => debug!("Exchange does not list {}", pair),
            }
        }

        Ok(tickers)
    }
}

/// Cached ticker set and its refresh bookkeeping
#[derive(Debug, Clone, Default)]
pub struct FeedState {
    pub tickers: Arc<Vec<TickerSnapshot>>,
    /// Time of the last successful refresh
    pub fetched_at: Option<DateTime<Utc>>,
    /// Time of the last refresh attempt, successful or not
    pub last_attempt: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
}

/// Point-in-time copy handed to readers
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    pub tickers: Arc<Vec<TickerSnapshot>>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub stale: bool,
}

impl FeedSnapshot {
    /// Response for the popular-pairs endpoint
    #[must_use]
    pub fn to_response(&self) -> TickerResponse {
        TickerResponse {
            tickers: self.tickers.as_ref().clone(),
            fetched_at: self.fetched_at,
            stale: self.stale,
        }
    }

    /// Cached entries for `pairs`, in request order
    #[must_use]
    pub fn select(&self, pairs: &[String]) -> Vec<TickerSnapshot> {
        pairs
            .iter()
            .filter_map(|pair| self.tickers.iter().find(|t| t.symbol == *pair).cloned())
            .collect()
    }
}

/// Shared, read-mostly ticker cache
#[derive(Debug)]
pub struct PriceFeedCache {
    state: RwLock<Arc<FeedState>>,
    max_age: Duration,
}

impl PriceFeedCache {
    /// Snapshots older than `max_age` read as stale
    #[must_use]
    pub fn new(max_age: Duration) -> Self {
        Self {
            state: RwLock::new(Arc::new(FeedState::default())),
            max_age,
        }
    }

    /// Latest complete snapshot; never waits on a refresh
    #[must_use]
    pub fn snapshot(&self) -> FeedSnapshot {
        let state = Arc::clone(&*self.state.read());
        let stale = match state.fetched_at {
            None => true,
            Some(fetched_at) => {
                // A timestamp ahead of the clock counts as fresh
                let too_old = (Utc::now() - fetched_at)
                    .to_std()
                    .is_ok_and(|age| age > self.max_age);
                state.last_error.is_some() || too_old
            }
        };

        FeedSnapshot {
            tickers: Arc::clone(&state.tickers),
            fetched_at: state.fetched_at,
            stale,
        }
    }

    /// Full bookkeeping, for health reporting
    #[must_use]
    pub fn state(&self) -> Arc<FeedState> {
        Arc::clone(&*self.state.read())
    }

    /// Replace the ticker set
    pub fn publish(&self, tickers: Vec<TickerSnapshot>, at: DateTime<Utc>) {
        let next = Arc::new(FeedState {
            tickers: Arc::new(tickers),
            fetched_at: Some(at),
            last_attempt: Some(at),
            last_error: None,
            consecutive_failures: 0,
        });
        *self.state.write() = next;
    }

    /// Record a failed refresh, keeping the current ticker set
    pub fn record_failure(&self, error: &JournalError, at: DateTime<Utc>) {
        let mut guard = self.state.write();
        let next = Arc::new(FeedState {
            tickers: Arc::clone(&guard.tickers),
            fetched_at: guard.fetched_at,
            last_attempt: Some(at),
            last_error: Some(error.to_string()),
            consecutive_failures: guard.consecutive_failures.saturating_add(1),
        });
        *guard = next;
    }
}

/// Periodic refresher feeding a [`PriceFeedCache`]
#[derive(Clone)]
pub struct PriceFeed {
    cache: Arc<PriceFeedCache>,
    source: Arc<dyn TickerSource>,
    pairs: Arc<Vec<String>>,
    interval: Duration,
    enabled: bool,
}

impl PriceFeed {
    /// Pairs are normalized to the trimmed, uppercase form requests use
    pub fn new(
        cache: Arc<PriceFeedCache>,
        source: Arc<dyn TickerSource>,
        pairs: Vec<String>,
        interval: Duration,
    ) -> Self {
        let pairs = pairs
            .iter()
            .map(|pair| pair.trim().to_uppercase())
            .filter(|pair| !pair.is_empty())
            .collect();

        Self {
            cache,
            source,
            pairs: Arc::new(pairs),
            interval,
            enabled: true,
        }
    }

    /// A disabled feed is never spawned and is left out of health checks
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn pairs(&self) -> &[String] {
        &self.pairs
    }

    /// Feed wired to MEXC per configuration
    pub fn from_config(config: &PriceFeedConfig) -> JournalResult<Self> {
        let interval = config.refresh_interval();
        if interval.is_zero() {
            return Err(JournalError::Config(
                "price_feed.refresh_interval_seconds must be positive".to_string(),
            ));
        }

        let source = MexcClient::new(config.base_url.clone(), config.request_timeout())?;
        let cache = Arc::new(PriceFeedCache::new(interval * 2));
        Ok(Self::new(cache, Arc::new(source), config.pairs.clone(), interval)
            .with_enabled(config.enabled))
    }

    #[must_use]
    pub fn cache(&self) -> Arc<PriceFeedCache> {
        Arc::clone(&self.cache)
    }

    #[must_use]
    pub fn source(&self) -> Arc<dyn TickerSource> {
        Arc::clone(&self.source)
    }

    /// Fetch once and publish or record the failure
    pub async fn refresh_once(&self) -> JournalResult<usize> {
        let result = self.source.fetch_24h(&self.pairs).await.and_then(|tickers| {
            if tickers.is_empty() && !self.pairs.is_empty() {
                Err(JournalError::Upstream(
                    "none of the configured pairs were returned".to_string(),
                ))
            } else {
                Ok(tickers)
            }
        });

        let now = Utc::now();
        match result {
            Ok(tickers) => {
                let count = tickers.len();
                self.cache.publish(tickers, now);
                metrics::record_feed_refresh(true);
                debug!("Price feed refreshed with {} tickers", count);
                Ok(count)
            }
            Err(e) => {
                self.cache.record_failure(&e, now);
                metrics::record_feed_refresh(false);
                warn!("Price feed refresh failed, serving previous snapshot: {}", e);
                Err(e)
            }
        }
    }

    /// Refresh immediately, then on every interval tick
    pub fn spawn(self) -> JoinHandle<()> {
        info!(
            "Starting price feed for {} pairs every {:?}",
            self.pairs.len(),
            self.interval
        );

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                // Failures are already logged and recorded in the cache
                let _ = self.refresh_once().await;
            }
        })
    }
}
