//! PostgreSQL trade store
//!
//! Filters are pushed down into SQL through a `QueryBuilder`; the `seq`
//! column records insertion order for stable tie-breaking.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{
    PgPool, Postgres, QueryBuilder, Row,
    postgres::{PgPoolOptions, PgRow},
};
use tracing::{debug, info};
use uuid::Uuid;

use super::TradeStore;
use crate::{
    errors::{JournalError, JournalResult},
    models::{NewTrade, Trade, TradeType},
    query::{SortKey, SortOrder, TradeFilter, TradePage, TradeQuery, TradeSort},
    stats::StatsSample,
};

const TRADE_COLUMNS: &str = "id, pair, entry_price, exit_price, usd_amount, quantity, \
     trade_date, pnl, strategy, trade_type, stop_loss, take_profit, notes, image_data, \
     created_at, updated_at";

/// Trade store on a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgTradeStore {
    /// Database pool
    db_pool: PgPool,
}

impl PgTradeStore {
    #[must_use]
    pub const fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Open a pool against `database_url`
    pub async fn connect(database_url: &str, max_connections: u32) -> JournalResult<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        info!("Connected to PostgreSQL trade store");
        Ok(Self::new(db_pool))
    }

    /// Create the trades table if it does not exist
    pub async fn run_migrations(&self) -> JournalResult<()> {
        info!("Running trade store migrations");

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS trades (
                seq BIGSERIAL NOT NULL UNIQUE,
                id UUID PRIMARY KEY,
                pair TEXT NOT NULL,
                entry_price DOUBLE PRECISION NOT NULL CHECK (entry_price > 0),
                exit_price DOUBLE PRECISION,
                usd_amount DOUBLE PRECISION NOT NULL,
                quantity DOUBLE PRECISION NOT NULL,
                trade_date DATE NOT NULL,
                pnl DOUBLE PRECISION,
                strategy TEXT NOT NULL,
                trade_type TEXT NOT NULL CHECK (trade_type IN ('Long', 'Short')),
                stop_loss DOUBLE PRECISION,
                take_profit DOUBLE PRECISION,
                notes TEXT,
                image_data TEXT,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            ",
        )
        .execute(&self.db_pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_trades_created ON trades (created_at DESC)")
            .execute(&self.db_pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_trades_trade_date ON trades (trade_date)")
            .execute(&self.db_pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl TradeStore for PgTradeStore {
    async fn insert(&self, trade: NewTrade) -> JournalResult<Trade> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO trades ({TRADE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
             RETURNING {TRADE_COLUMNS}"
        );

        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(&trade.pair)
            .bind(trade.entry_price)
            .bind(trade.exit_price)
            .bind(trade.usd_amount)
            .bind(trade.quantity)
            .bind(trade.trade_date)
            .bind(trade.pnl)
            .bind(&trade.strategy)
            .bind(trade.trade_type.as_str())
            .bind(trade.stop_loss)
            .bind(trade.take_profit)
            .bind(trade.notes.as_deref())
            .bind(trade.image_data.as_deref())
            .bind(now)
            .bind(now)
            .fetch_one(&self.db_pool)
            .await?;

        let stored = trade_from_row(&row)?;
        debug!("Trade {} persisted", stored.id);
        Ok(stored)
    }

    async fn get(&self, id: Uuid) -> JournalResult<Option<Trade>> {
        let sql = format!("SELECT {TRADE_COLUMNS} FROM trades WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?;

        row.as_ref().map(trade_from_row).transpose()
    }

    async fn update(&self, id: Uuid, trade: NewTrade) -> JournalResult<Option<Trade>> {
        let sql = format!(
            "UPDATE trades SET \
                pair = $1, entry_price = $2, exit_price = $3, usd_amount = $4, \
                quantity = $5, trade_date = $6, pnl = $7, strategy = $8, \
                trade_type = $9, stop_loss = $10, take_profit = $11, notes = $12, \
                image_data = $13, updated_at = $14 \
             WHERE id = $15 \
             RETURNING {TRADE_COLUMNS}"
        );

        let row = sqlx::query(&sql)
            .bind(&trade.pair)
            .bind(trade.entry_price)
            .bind(trade.exit_price)
            .bind(trade.usd_amount)
            .bind(trade.quantity)
            .bind(trade.trade_date)
            .bind(trade.pnl)
            .bind(&trade.strategy)
            .bind(trade.trade_type.as_str())
            .bind(trade.stop_loss)
            .bind(trade.take_profit)
            .bind(trade.notes.as_deref())
            .bind(trade.image_data.as_deref())
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?;

        row.as_ref().map(trade_from_row).transpose()
    }

    async fn delete(&self, id: Uuid) -> JournalResult<bool> {
        let result = sqlx::query("DELETE FROM trades WHERE id = $1")
            .bind(id)
            .execute(&self.db_pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn query(&self, query: &TradeQuery) -> JournalResult<TradePage> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM trades");
        push_filter(&mut count_qb, &query.filter);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.db_pool)
            .await?;

        let mut page_qb = QueryBuilder::<Postgres>::new(format!("SELECT {TRADE_COLUMNS} FROM trades"));
        push_filter(&mut page_qb, &query.filter);

        push_order(&mut page_qb, &query.sort);
        page_qb
            .push(" LIMIT ")
            .push_bind(i64::from(query.pagination.limit))
            .push(" OFFSET ")
            .push_bind(i64::try_from(query.pagination.offset()).unwrap_or(i64::MAX));

        let rows = page_qb.build().fetch_all(&self.db_pool).await?;
        let trades = rows
            .iter()
            .map(trade_from_row)
            .collect::<JournalResult<Vec<_>>>()?;

        Ok(TradePage {
            trades,
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    async fn stats_samples(&self) -> JournalResult<Vec<StatsSample>> {
        let rows = sqlx::query("SELECT pnl, usd_amount FROM trades")
            .fetch_all(&self.db_pool)
            .await?;

        rows.iter()
            .map(|row| -> JournalResult<StatsSample> {
                Ok(StatsSample {
                    pnl: row.try_get("pnl")?,
                    usd_amount: row.try_get("usd_amount")?,
                })
            })
            .collect()
    }

    async fn ping(&self) -> JournalResult<()> {
        sqlx::query("SELECT 1").execute(&self.db_pool).await?;
        Ok(())
    }
}

/// Append the WHERE clause for `filter`
fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &TradeFilter) {
    qb.push(" WHERE TRUE");

    if let Some(search) = &filter.search {
        qb.push(" AND pair ILIKE ")
            .push_bind(like_pattern(search))
            .push(r" ESCAPE '\'");
    }
    if let Some(strategy) = &filter.strategy {
        qb.push(" AND strategy ILIKE ")
            .push_bind(like_pattern(strategy))
            .push(r" ESCAPE '\'");
    }
    if let Some(trade_type) = filter.trade_type {
        qb.push(" AND trade_type = ").push_bind(trade_type.as_str());
    }
    if let Some(from) = filter.date_from {
        qb.push(" AND trade_date >= ").push_bind(from);
    }
    if let Some(to) = filter.date_to {
        qb.push(" AND trade_date <= ").push_bind(to);
    }
    if let Some(min) = filter.pnl_min {
        qb.push(" AND pnl >= ").push_bind(min);
    }
    if let Some(max) = filter.pnl_max {
        qb.push(" AND pnl <= ").push_bind(max);
    }
}

/// Sort clause matching the in-memory ordering: missing P&L sorts as
/// largest, pairs compare bytewise, and insertion order breaks ties
fn push_order(qb: &mut QueryBuilder<'_, Postgres>, sort: &TradeSort) {
    let (direction, nulls) = match sort.order {
        SortOrder::Asc => ("ASC", "LAST"),
        SortOrder::Desc => ("DESC", "FIRST"),
    };
    let collate = match sort.key {
        SortKey::Pair => r#" COLLATE "C""#,
        SortKey::CreatedAt | SortKey::Pnl => "",
    };
    qb.push(format!(
        " ORDER BY {}{collate} {direction} NULLS {nulls}, seq ASC",
        sort.key.column()
    ));
}

/// `%needle%` with LIKE metacharacters escaped
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn trade_from_row(row: &PgRow) -> JournalResult<Trade> {
    let trade_type: String = row.try_get("trade_type")?;
    let trade_type = trade_type
        .parse::<TradeType>()
        .map_err(JournalError::Store)?;

    Ok(Trade {
        id: row.try_get("id")?,
        pair: row.try_get("pair")?,
        entry_price: row.try_get("entry_price")?,
        exit_price: row.try_get("exit_price")?,
        usd_amount: row.try_get("usd_amount")?,
        quantity: row.try_get("quantity")?,
        trade_date: row.try_get("trade_date")?,
        pnl: row.try_get("pnl")?,
        strategy: row.try_get("strategy")?,
        trade_type,
        stop_loss: row.try_get("stop_loss")?,
        take_profit: row.try_get("take_profit")?,
        notes: row.try_get("notes")?,
        image_data: row.try_get("image_data")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
