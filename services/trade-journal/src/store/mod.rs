//! Trade persistence
//!
//! One async trait, two backends: an in-process map for local runs and
//! tests, and PostgreSQL for deployments.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::{
    config::{StoreBackend, StoreConfig},
    errors::{JournalError, JournalResult},
    models::{NewTrade, Trade},
    query::{TradePage, TradeQuery},
    stats::StatsSample,
};

pub use memory::MemoryTradeStore;
pub use postgres::PgTradeStore;

/// Single-table trade store.
///
/// Implementations assign `id`, `created_at`, `updated_at` and an
/// insertion sequence used to break sort ties.
#[async_trait]
pub trait TradeStore: Send + Sync {
    /// Persist a new trade
    async fn insert(&self, trade: NewTrade) -> JournalResult<Trade>;

    /// Fetch one trade
    async fn get(&self, id: Uuid) -> JournalResult<Option<Trade>>;

    /// Replace the editable fields of a trade; `None` if it does not exist
    async fn update(&self, id: Uuid, trade: NewTrade) -> JournalResult<Option<Trade>>;

    /// Hard delete; `false` if it did not exist
    async fn delete(&self, id: Uuid) -> JournalResult<bool>;

    /// Filtered, sorted page plus the total match count
    async fn query(&self, query: &TradeQuery) -> JournalResult<TradePage>;

    /// P&L and capital of every stored trade
    async fn stats_samples(&self) -> JournalResult<Vec<StatsSample>>;

    /// Reachability check for health reporting
    async fn ping(&self) -> JournalResult<()>;
}

/// Build the configured store backend
pub async fn connect(config: &StoreConfig) -> JournalResult<Arc<dyn TradeStore>> {
    match config.backend {
        StoreBackend::Memory => {
            info!("Using in-memory trade store");
            Ok(Arc::new(MemoryTradeStore::new()))
        }
        StoreBackend::Postgres => {
            let url = config.database_url.as_deref().ok_or_else(|| {
                JournalError::Config("store.database_url is required for postgres".to_string())
            })?;
            let store = PgTradeStore::connect(url, config.max_connections).await?;
            store.run_migrations().await?;
            Ok(Arc::new(store))
        }
    }
}
