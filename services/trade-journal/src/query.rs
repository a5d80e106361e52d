//! Trade query and filter engine
//!
//! Parses list parameters into a [`TradeQuery`] and provides the predicate,
//! ordering and pagination rules every store backend honours.

use chrono::NaiveDate;
use serde::Deserialize;
use std::{cmp::Ordering, str::FromStr};

use crate::{
    errors::{JournalError, JournalResult},
    models::{Trade, TradeListResponse, TradeType},
};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// Raw query string of `GET /trades`.
///
/// Values stay strings so empty parameters (`?strategy=`) can mean "no
/// constraint" instead of failing to decode.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TradeListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub search: Option<String>,
    pub strategy: Option<String>,
    pub trade_type: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub pnl_min: Option<String>,
    pub pnl_max: Option<String>,
}

/// Column a listing is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    CreatedAt,
    Pnl,
    Pair,
}

impl SortKey {
    /// Store column backing this key
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::Pnl => "pnl",
            Self::Pair => "pair",
        }
    }
}

impl FromStr for SortKey {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created_at" => Ok(Self::CreatedAt),
            "pnl" => Ok(Self::Pnl),
            "pair" => Ok(Self::Pair),
            other => Err(JournalError::validation(format!(
                "unsupported sort_by '{other}', expected created_at, pnl or pair"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(JournalError::validation(format!(
                "unsupported sort_order '{other}', expected asc or desc"
            ))),
        }
    }
}

/// Filter predicates; `None` means no constraint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeFilter {
    /// Case-insensitive substring of `pair`
    pub search: Option<String>,
    /// Case-insensitive substring of `strategy`
    pub strategy: Option<String>,
    pub trade_type: Option<TradeType>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub pnl_min: Option<f64>,
    pub pnl_max: Option<f64>,
}

impl TradeFilter {
    /// Whether a trade satisfies every active predicate
    #[must_use]
    pub fn matches(&self, trade: &Trade) -> bool {
        if let Some(search) = &self.search {
            if !contains_ignore_case(&trade.pair, search) {
                return false;
            }
        }
        if let Some(strategy) = &self.strategy {
            if !contains_ignore_case(&trade.strategy, strategy) {
                return false;
            }
        }
        if let Some(trade_type) = self.trade_type {
            if trade.trade_type != trade_type {
                return false;
            }
        }
        if let Some(from) = self.date_from {
            if trade.trade_date < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if trade.trade_date > to {
                return false;
            }
        }
        if self.pnl_min.is_some() || self.pnl_max.is_some() {
            // A P&L bound never matches a trade without P&L
            let Some(pnl) = trade.pnl else {
                return false;
            };
            if self.pnl_min.is_some_and(|min| pnl < min) {
                return false;
            }
            if self.pnl_max.is_some_and(|max| pnl > max) {
                return false;
            }
        }
        true
    }

    /// True when no predicate is active
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Sort key plus direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TradeSort {
    pub key: SortKey,
    pub order: SortOrder,
}

impl TradeSort {
    /// Order two trades by the sort key alone.
    ///
    /// Missing P&L compares greater than any value, so it lands last
    /// ascending and first descending, matching PostgreSQL's default.
    /// Pairs compare bytewise, as under the `"C"` collation.
    /// Callers break ties by insertion sequence.
    #[must_use]
    pub fn compare(&self, a: &Trade, b: &Trade) -> Ordering {
        let ordering = match self.key {
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            SortKey::Pair => a.pair.cmp(&b.pair),
            SortKey::Pnl => match (a.pnl, b.pnl) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        };

        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// One-based page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    /// Validated page window
    pub fn new(page: u32, limit: u32) -> JournalResult<Self> {
        if page < 1 {
            return Err(JournalError::validation("page must be at least 1"));
        }
        if limit < 1 || limit > MAX_LIMIT {
            return Err(JournalError::validation(format!(
                "limit must be between 1 and {MAX_LIMIT}"
            )));
        }
        Ok(Self { page, limit })
    }

    /// Records skipped before this page
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    /// `ceil(total / limit)`
    #[must_use]
    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(u64::from(self.limit))
    }
}

/// A complete list request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeQuery {
    pub filter: TradeFilter,
    pub sort: TradeSort,
    pub pagination: Pagination,
}

/// One page of matching trades
#[derive(Debug, Clone, PartialEq)]
pub struct TradePage {
    pub trades: Vec<Trade>,
    /// Matching records across all pages
    pub total: u64,
}

impl TradePage {
    /// Shape the page for the list endpoint
    #[must_use]
    pub fn into_response(self, pagination: Pagination) -> TradeListResponse {
        TradeListResponse {
            total_pages: pagination.total_pages(self.total),
            trades: self.trades,
            page: pagination.page,
            limit: pagination.limit,
            total: self.total,
        }
    }
}

impl TryFrom<TradeListParams> for TradeQuery {
    type Error = JournalError;

    fn try_from(params: TradeListParams) -> Result<Self, Self::Error> {
        let page = parse_opt::<u32>("page", params.page)?.unwrap_or(DEFAULT_PAGE);
        let limit = parse_opt::<u32>("limit", params.limit)?.unwrap_or(DEFAULT_LIMIT);

        let sort = TradeSort {
            key: non_empty(params.sort_by)
                .map(|s| s.parse::<SortKey>())
                .transpose()?
                .unwrap_or_default(),
            order: non_empty(params.sort_order)
                .map(|s| s.parse::<SortOrder>())
                .transpose()?
                .unwrap_or_default(),
        };

        let trade_type = non_empty(params.trade_type)
            .map(|s| s.parse::<TradeType>().map_err(JournalError::Validation))
            .transpose()?;

        let filter = TradeFilter {
            search: non_empty(params.search),
            strategy: non_empty(params.strategy),
            trade_type,
            date_from: parse_opt("date_from", params.date_from)?,
            date_to: parse_opt("date_to", params.date_to)?,
            pnl_min: parse_opt::<f64>("pnl_min", params.pnl_min)?
                .map(|v| finite("pnl_min", v))
                .transpose()?,
            pnl_max: parse_opt::<f64>("pnl_max", params.pnl_max)?
                .map(|v| finite("pnl_max", v))
                .transpose()?,
        };

        Ok(Self {
            filter,
            sort,
            pagination: Pagination::new(page, limit)?,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_opt<T>(field: &str, value: Option<String>) -> JournalResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    non_empty(value)
        .map(|raw| {
            raw.parse::<T>().map_err(|e| {
                JournalError::validation(format!("invalid value '{raw}' for '{field}': {e}"))
            })
        })
        .transpose()
}

fn finite(field: &str, value: f64) -> JournalResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(JournalError::validation(format!(
            "'{field}' must be a finite number"
        )))
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
