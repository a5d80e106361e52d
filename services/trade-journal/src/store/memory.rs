//! In-process trade store

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::debug;
use uuid::Uuid;

use super::TradeStore;
use crate::{
    errors::JournalResult,
    models::{NewTrade, Trade},
    query::{TradePage, TradeQuery},
    stats::StatsSample,
};

#[derive(Debug)]
struct StoredTrade {
    seq: u64,
    trade: Trade,
}

#[derive(Debug, Default)]
struct Inner {
    next_seq: u64,
    trades: FxHashMap<Uuid, StoredTrade>,
}

/// Trade store backed by a locked hash map
#[derive(Debug, Default)]
pub struct MemoryTradeStore {
    inner: RwLock<Inner>,
}

impl MemoryTradeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored trades
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().trades.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TradeStore for MemoryTradeStore {
    async fn insert(&self, trade: NewTrade) -> JournalResult<Trade> {
        let now = Utc::now();
        let mut id = Uuid::new_v4();

        let mut inner = self.inner.write();
        while inner.trades.contains_key(&id) {
            id = Uuid::new_v4();
        }
        let seq = inner.next_seq;
        inner.next_seq += 1;

        let trade = trade.into_trade(id, now, now);
        inner.trades.insert(
            id,
            StoredTrade {
                seq,
                trade: trade.clone(),
            },
        );

        debug!("Trade {} stored with sequence {}", id, seq);
        Ok(trade)
    }

    async fn get(&self, id: Uuid) -> JournalResult<Option<Trade>> {
        Ok(self.inner.read().trades.get(&id).map(|s| s.trade.clone()))
    }

    async fn update(&self, id: Uuid, trade: NewTrade) -> JournalResult<Option<Trade>> {
        let mut inner = self.inner.write();
        let Some(stored) = inner.trades.get_mut(&id) else {
            return Ok(None);
        };

        let created_at = stored.trade.created_at;
        stored.trade = trade.into_trade(id, created_at, Utc::now());
        Ok(Some(stored.trade.clone()))
    }

    async fn delete(&self, id: Uuid) -> JournalResult<bool> {
        Ok(self.inner.write().trades.remove(&id).is_some())
    }

    async fn query(&self, query: &TradeQuery) -> JournalResult<TradePage> {
        let inner = self.inner.read();

        let mut matching: Vec<&StoredTrade> = inner
            .trades
            .values()
            .filter(|s| query.filter.matches(&s.trade))
            .collect();

        matching.sort_by(|a, b| {
            query
                .sort
                .compare(&a.trade, &b.trade)
                .then(a.seq.cmp(&b.seq))
        });

        let total = matching.len() as u64;
        let offset = usize::try_from(query.pagination.offset()).unwrap_or(usize::MAX);
        let trades = matching
            .into_iter()
            .skip(offset)
            .take(query.pagination.limit as usize)
            .map(|s| s.trade.clone())
            .collect();

        Ok(TradePage { trades, total })
    }

    async fn stats_samples(&self) -> JournalResult<Vec<StatsSample>> {
        Ok(self
            .inner
            .read()
            .trades
            .values()
            .map(|s| StatsSample::from(&s.trade))
            .collect())
    }

    async fn ping(&self) -> JournalResult<()> {
        Ok(())
    }
}
