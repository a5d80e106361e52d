//! Trade CRUD, listing and summary handlers

use axum::{
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::Json,
};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    errors::{JournalError, JournalResult},
    metrics,
    models::{MessageResponse, Trade, TradeInput, TradeListResponse, TradeStats},
    query::{TradeListParams, TradeQuery},
    stats,
    store::TradeStore,
    validation::validate_trade,
};

/// Trade handlers
#[derive(Clone)]
pub struct TradeHandlers {
    store: Arc<dyn TradeStore>,
}

impl TradeHandlers {
    pub fn new(store: Arc<dyn TradeStore>) -> Self {
        Self { store }
    }

    /// `GET /trades`
    pub async fn list(
        State(handlers): State<Self>,
        params: Result<Query<TradeListParams>, QueryRejection>,
    ) -> JournalResult<Json<TradeListResponse>> {
        let Query(params) = params?;
        let query = TradeQuery::try_from(params)?;
        debug!(?query, "Listing trades");

        let pagination = query.pagination;
        let page = handlers.store.query(&query).await?;
        Ok(Json(page.into_response(pagination)))
    }

    /// `POST /trades`
    pub async fn create(
        State(handlers): State<Self>,
        body: Result<Json<TradeInput>, JsonRejection>,
    ) -> JournalResult<(StatusCode, Json<Trade>)> {
        let Json(input) = body?;
        let trade = validate_trade(input)?;

        let stored = handlers.store.insert(trade).await?;
        metrics::record_trade_write("create");
        info!(trade_id = %stored.id, pair = %stored.pair, "Trade created");

        Ok((StatusCode::CREATED, Json(stored)))
    }

    /// `GET /trades/:id`
    pub async fn get(
        State(handlers): State<Self>,
        Path(id): Path<String>,
    ) -> JournalResult<Json<Trade>> {
        let trade_id = parse_trade_id(&id)?;
        handlers
            .store
            .get(trade_id)
            .await?
            .map(Json)
            .ok_or_else(|| JournalError::not_found(id))
    }

    /// `PUT /trades/:id`, a full replace of the editable fields
    pub async fn update(
        State(handlers): State<Self>,
        Path(id): Path<String>,
        body: Result<Json<TradeInput>, JsonRejection>,
    ) -> JournalResult<Json<Trade>> {
        let trade_id = parse_trade_id(&id)?;
        let Json(input) = body?;
        let trade = validate_trade(input)?;

        let updated = handlers
            .store
            .update(trade_id, trade)
            .await?
            .ok_or_else(|| JournalError::not_found(&id))?;
        metrics::record_trade_write("update");
        info!(trade_id = %updated.id, "Trade updated");

        Ok(Json(updated))
    }

    /// `DELETE /trades/:id`
    pub async fn delete(
        State(handlers): State<Self>,
        Path(id): Path<String>,
    ) -> JournalResult<Json<MessageResponse>> {
        let trade_id = parse_trade_id(&id)?;
        if !handlers.store.delete(trade_id).await? {
            return Err(JournalError::not_found(id));
        }
        metrics::record_trade_write("delete");
        info!(trade_id = %trade_id, "Trade deleted");

        Ok(Json(MessageResponse::new("Trade deleted successfully")))
    }

    /// `GET /trades/stats/summary`; list filters do not apply here
    pub async fn summary(State(handlers): State<Self>) -> JournalResult<Json<TradeStats>> {
        let samples = handlers.store.stats_samples().await?;
        Ok(Json(stats::summarize(samples)))
    }
}

/// An id that is not a UUID cannot name a stored trade
fn parse_trade_id(id: &str) -> JournalResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| JournalError::not_found(id))
}
