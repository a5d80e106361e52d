//! Query parsing and predicate tests

use chrono::Utc;
use pretty_assertions::assert_eq;
use rstest::*;
use std::cmp::Ordering;
use trade_journal::{
    JournalError,
    models::{Trade, TradeType},
    query::{
        MAX_LIMIT, Pagination, SortKey, SortOrder, TradeFilter, TradeListParams, TradeQuery,
        TradeSort,
    },
};
use uuid::Uuid;

use crate::factories::{date, new_trade};

fn stored(pair: &str, strategy: &str, pnl: Option<f64>) -> Trade {
    let now = Utc::now();
    new_trade(pair, strategy, pnl, 1000.0).into_trade(Uuid::new_v4(), now, now)
}

/// Query parameters as the extractor delivers them, every value a string
fn params(pairs: &[(&str, &str)]) -> TradeListParams {
    let map: serde_json::Map<String, serde_json::Value> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), serde_json::Value::String((*v).to_string())))
        .collect();
    serde_json::from_value(serde_json::Value::Object(map)).unwrap()
}

#[rstest]
fn test_full_parameter_set_parses() {
    let query = TradeQuery::try_from(params(&[
        ("page", "2"),
        ("limit", "25"),
        ("sort_by", "pnl"),
        ("sort_order", "ASC"),
        ("search", "btc"),
        ("strategy", "break"),
        ("trade_type", "short"),
        ("date_from", "2024-01-01"),
        ("date_to", "2024-01-31"),
        ("pnl_min", "-10.5"),
        ("pnl_max", "200"),
    ]))
    .unwrap();

    assert_eq!(query.pagination, Pagination { page: 2, limit: 25 });
    assert_eq!(
        query.sort,
        TradeSort {
            key: SortKey::Pnl,
            order: SortOrder::Asc
        }
    );
    assert_eq!(
        query.filter,
        TradeFilter {
            search: Some("btc".to_string()),
            strategy: Some("break".to_string()),
            trade_type: Some(TradeType::Short),
            date_from: Some(date(2024, 1, 1)),
            date_to: Some(date(2024, 1, 31)),
            pnl_min: Some(-10.5),
            pnl_max: Some(200.0),
        }
    );
}

#[rstest]
#[case("page", "0")]
#[case("page", "abc")]
#[case("limit", "0")]
#[case("limit", "101")]
#[case("sort_by", "quantity")]
#[case("sort_order", "sideways")]
#[case("trade_type", "hedge")]
#[case("date_from", "15/01/2024")]
#[case("pnl_min", "lots")]
#[case("pnl_max", "inf")]
fn test_invalid_parameter_is_validation_error(#[case] key: &str, #[case] value: &str) {
    let err = TradeQuery::try_from(params(&[(key, value)])).unwrap_err();
    assert!(matches!(err, JournalError::Validation(_)), "{key}={value} gave {err:?}");
}

#[rstest]
fn test_max_limit_is_accepted() {
    let limit = MAX_LIMIT.to_string();
    let query = TradeQuery::try_from(params(&[("limit", limit.as_str())])).unwrap();
    assert_eq!(query.pagination.limit, MAX_LIMIT);
}

#[rstest]
fn test_search_matches_pair_substring_ignoring_case() {
    let filter = TradeFilter {
        search: Some("Eth".to_string()),
        ..TradeFilter::default()
    };
    assert!(filter.matches(&stored("ETH/USDT", "Scalp", None)));
    assert!(!filter.matches(&stored("BTC/USDT", "Scalp", None)));
}

#[rstest]
fn test_strategy_matches_substring_ignoring_case() {
    let filter = TradeFilter {
        strategy: Some("BREAK".to_string()),
        ..TradeFilter::default()
    };
    assert!(filter.matches(&stored("BTC/USDT", "Breakout", None)));
    assert!(!filter.matches(&stored("BTC/USDT", "Swing", None)));
}

#[rstest]
#[case(Some(0.0), None, Some(10.0), true)]
#[case(Some(0.0), None, Some(-10.0), false)]
#[case(None, Some(0.0), Some(-10.0), true)]
#[case(Some(-5.0), Some(5.0), Some(5.0), true)]
#[case(Some(-5.0), Some(5.0), Some(5.01), false)]
#[case(Some(0.0), None, None, false)]
#[case(None, None, None, true)]
fn test_pnl_bounds(
    #[case] min: Option<f64>,
    #[case] max: Option<f64>,
    #[case] pnl: Option<f64>,
    #[case] expected: bool,
) {
    let filter = TradeFilter {
        pnl_min: min,
        pnl_max: max,
        ..TradeFilter::default()
    };
    assert_eq!(filter.matches(&stored("BTC/USDT", "Swing", pnl)), expected);
}

#[rstest]
fn test_date_bounds_are_inclusive() {
    let trade = stored("BTC/USDT", "Swing", None);
    let on_day = TradeFilter {
        date_from: Some(trade.trade_date),
        date_to: Some(trade.trade_date),
        ..TradeFilter::default()
    };
    assert!(on_day.matches(&trade));

    let after = TradeFilter {
        date_from: trade.trade_date.succ_opt(),
        ..TradeFilter::default()
    };
    assert!(!after.matches(&trade));
}

#[rstest]
fn test_missing_pnl_sorts_last_ascending_first_descending() {
    let valued = stored("BTC/USDT", "Swing", Some(-100.0));
    let missing = stored("BTC/USDT", "Swing", None);

    let asc = TradeSort {
        key: SortKey::Pnl,
        order: SortOrder::Asc,
    };
    let desc = TradeSort {
        key: SortKey::Pnl,
        order: SortOrder::Desc,
    };
    assert_eq!(asc.compare(&valued, &missing), Ordering::Less);
    assert_eq!(desc.compare(&valued, &missing), Ordering::Greater);
}
