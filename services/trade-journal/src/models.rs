//! Trade entities and REST request/response types

use chrono::{DateTime, NaiveDate, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Direction of a logged position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeType {
    Long,
    Short,
}

impl TradeType {
    /// Canonical wire and storage form
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Long => "Long",
            Self::Short => "Short",
        }
    }
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "long" => Ok(Self::Long),
            "short" => Ok(Self::Short),
            other => Err(format!("unknown trade type '{other}', expected Long or Short")),
        }
    }
}

/// A persisted trade record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: Uuid,
    /// Uppercase trading pair, e.g. "BTC/USDT"
    pub pair: String,
    pub entry_price: f64,
    pub exit_price: Option<f64>,
    /// Capital committed in USD
    pub usd_amount: f64,
    /// Always `usd_amount / entry_price` as of the last write
    pub quantity: f64,
    pub trade_date: NaiveDate,
    pub pnl: Option<f64>,
    pub strategy: String,
    pub trade_type: TradeType,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub notes: Option<String>,
    /// Base64 image, stored inline
    pub image_data: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated editable fields of a trade.
///
/// Produced only by [`crate::validation::validate_trade`], so `quantity` and
/// `pnl` are already derived when a store sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTrade {
    pub pair: String,
    pub entry_price: f64,
    pub exit_price: Option<f64>,
    pub usd_amount: f64,
    pub quantity: f64,
    pub trade_date: NaiveDate,
    pub pnl: Option<f64>,
    pub strategy: String,
    pub trade_type: TradeType,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub notes: Option<String>,
    pub image_data: Option<String>,
}

impl NewTrade {
    /// Materialize a stored trade with store-assigned identity and timestamps
    #[must_use]
    pub fn into_trade(self, id: Uuid, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Trade {
        Trade {
            id,
            pair: self.pair,
            entry_price: self.entry_price,
            exit_price: self.exit_price,
            usd_amount: self.usd_amount,
            quantity: self.quantity,
            trade_date: self.trade_date,
            pnl: self.pnl,
            strategy: self.strategy,
            trade_type: self.trade_type,
            stop_loss: self.stop_loss,
            take_profit: self.take_profit,
            notes: self.notes,
            image_data: self.image_data,
            created_at,
            updated_at,
        }
    }
}

/// Raw create/update body as sent by the client.
///
/// Every field is optional here so that missing required fields surface as
/// validation errors naming the field rather than opaque decode failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TradeInput {
    pub pair: Option<String>,
    pub entry_price: Option<f64>,
    pub exit_price: Option<f64>,
    pub usd_amount: Option<f64>,
    pub trade_date: Option<NaiveDate>,
    pub pnl: Option<f64>,
    pub strategy: Option<String>,
    pub trade_type: Option<TradeType>,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub notes: Option<String>,
    pub image_data: Option<String>,
}

/// Paged trade listing
#[derive(Debug, Serialize, Deserialize)]
pub struct TradeListResponse {
    pub trades: Vec<Trade>,
    pub page: u32,
    pub limit: u32,
    /// Matching records across all pages
    pub total: u64,
    pub total_pages: u64,
}

/// Summary statistics over the whole journal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeStats {
    pub total_trades: u64,
    pub total_pnl: f64,
    pub total_invested: f64,
    pub winning_trades: u64,
    pub losing_trades: u64,
    pub win_rate: f64,
    pub avg_pnl: f64,
    pub roi: f64,
}

/// 24h ticker reading for one pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerSnapshot {
    /// Pair in journal form, e.g. "BTC/USDT"
    pub symbol: String,
    pub last_price: f64,
    pub price_change: f64,
    pub price_change_percent: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub volume: f64,
}

/// Ticker set served to the dashboard
#[derive(Debug, Serialize, Deserialize)]
pub struct TickerResponse {
    pub tickers: Vec<TickerSnapshot>,
    /// When the served set was fetched, if ever
    pub fetched_at: Option<DateTime<Utc>>,
    /// Freshness could not be confirmed at the last attempt
    pub stale: bool,
}

/// Plain message body
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Error response model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Additional error details
    pub details: Option<FxHashMap<String, String>>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Overall health status
    pub status: String,
    /// Component health status map
    pub services: FxHashMap<String, bool>,
    /// Service version
    pub version: String,
    /// Service uptime in seconds
    pub uptime_seconds: u64,
    /// Refresh bookkeeping, absent when the price feed is disabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_feed: Option<FeedHealth>,
}

/// Price feed refresh bookkeeping reported by the health check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedHealth {
    pub fetched_at: Option<DateTime<Utc>>,
    pub last_attempt: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
}
