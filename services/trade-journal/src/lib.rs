//! Crypto trading journal
//!
//! REST backend for a personal trading journal:
//! - Trade CRUD with server-side quantity and P&L derivation
//! - Filtered, sorted and paginated trade listing
//! - Journal-wide performance statistics
//! - Cached 24h exchange tickers refreshed in the background

#![allow(missing_docs)]

use anyhow::Result;

pub mod config;
pub mod errors;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod price_feed;
pub mod query;
pub mod server;
pub mod stats;
pub mod store;
pub mod validation;

pub use config::{JournalConfig, PriceFeedConfig, ServerConfig, StoreBackend, StoreConfig};
pub use errors::{JournalError, JournalResult};
pub use server::{AppState, JournalServer, build_router};

/// Start the trade journal server
pub async fn start_server(config: JournalConfig) -> Result<()> {
    let server = JournalServer::new(config).await?;
    server.start().await
}
