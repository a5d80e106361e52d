//! Exchange client and price feed cache tests

use approx::assert_relative_eq;
use pretty_assertions::assert_eq;
use rstest::*;
use serde_json::json;
use std::{sync::Arc, time::Duration};
use trade_journal::{
    JournalError,
    price_feed::{MexcClient, PriceFeed, PriceFeedCache, TickerSource},
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

const TICKER_PATH: &str = "/api/v3/ticker/24hr";

fn exchange_tickers() -> serde_json::Value {
    json!([
        {
            "symbol": "BTCUSDT",
            "lastPrice": "65000.50",
            "priceChange": "1200.5",
            "priceChangePercent": "0.0188",
            "highPrice": "66000",
            "lowPrice": "63500",
            "volume": "1234.56"
        },
        {
            "symbol": "ETHUSDT",
            "lastPrice": "3500.25",
            "priceChange": "-20",
            "priceChangePercent": "-0.0057",
            "highPrice": "3600",
            "lowPrice": "3400",
            "volume": "98765.4"
        },
        {
            "symbol": "DOGEUSDT",
            "lastPrice": "0.15",
            "priceChangePercent": "0.01"
        }
    ])
}

fn pairs(list: &[&str]) -> Vec<String> {
    list.iter().map(|p| (*p).to_string()).collect()
}

async fn mount_tickers(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(TICKER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(exchange_tickers()))
        .mount(server)
        .await;
}

fn client(server: &MockServer) -> MexcClient {
    MexcClient::new(server.uri(), Duration::from_secs(2)).unwrap()
}

fn feed(server: &MockServer, pairs: Vec<String>) -> PriceFeed {
    let cache = Arc::new(PriceFeedCache::new(Duration::from_secs(60)));
    PriceFeed::new(cache, Arc::new(client(server)), pairs, Duration::from_secs(30))
}

#[rstest]
#[tokio::test]
async fn test_client_maps_pairs_and_parses_numbers() {
    let server = MockServer::start().await;
    mount_tickers(&server).await;

    let tickers = client(&server)
        .fetch_24h(&pairs(&["ETH/USDT", "BTC/USDT", "XRP/USDT"]))
        .await
        .unwrap();

    let symbols: Vec<&str> = tickers.iter().map(|t| t.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["ETH/USDT", "BTC/USDT"]);
    assert_relative_eq!(tickers[1].last_price, 65000.5);
    assert_relative_eq!(tickers[1].price_change_percent, 0.0188);
    assert_relative_eq!(tickers[0].price_change, -20.0);
}

#[rstest]
#[tokio::test]
async fn test_missing_optional_fields_default_to_zero() {
    let server = MockServer::start().await;
    mount_tickers(&server).await;

    let tickers = client(&server)
        .fetch_24h(&pairs(&["DOGE/USDT"]))
        .await
        .unwrap();
    assert_eq!(tickers.len(), 1);
    assert_relative_eq!(tickers[0].volume, 0.0);
}

#[rstest]
#[tokio::test]
async fn test_server_error_is_upstream_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(TICKER_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client(&server)
        .fetch_24h(&pairs(&["BTC/USDT"]))
        .await
        .unwrap_err();
    assert!(matches!(err, JournalError::Upstream(_)));
}

#[rstest]
#[tokio::test]
async fn test_undecodable_body_is_upstream_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(TICKER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = client(&server)
        .fetch_24h(&pairs(&["BTC/USDT"]))
        .await
        .unwrap_err();
    assert!(matches!(err, JournalError::Upstream(_)));
}

#[rstest]
#[tokio::test]
async fn test_refresh_publishes_fresh_snapshot() {
    crate::init_test_env();
    let server = MockServer::start().await;
    mount_tickers(&server).await;

    let feed = feed(&server, pairs(&["BTC/USDT", "ETH/USDT"]));
    assert!(feed.cache().snapshot().stale);

    assert_eq!(feed.refresh_once().await.unwrap(), 2);
    let snapshot = feed.cache().snapshot();
    assert!(!snapshot.stale);
    assert!(snapshot.fetched_at.is_some());
    assert_eq!(snapshot.tickers.len(), 2);
}

#[rstest]
#[tokio::test]
async fn test_outage_keeps_prior_snapshot_and_marks_stale() {
    let server = MockServer::start().await;
    mount_tickers(&server).await;

    let feed = feed(&server, pairs(&["BTC/USDT", "ETH/USDT"]));
    feed.refresh_once().await.unwrap();
    let before = feed.cache().snapshot();

    server.reset().await;
    Mock::given(method("GET"))
        .and(path(TICKER_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    tokio_test::assert_err!(feed.refresh_once().await);
    let after = feed.cache().snapshot();
    assert!(after.stale);
    assert_eq!(after.tickers, before.tickers);
    assert_eq!(after.fetched_at, before.fetched_at);
    assert_eq!(feed.cache().state().consecutive_failures, 1);

    // Recovery clears the stale flag
    server.reset().await;
    mount_tickers(&server).await;
    tokio_test::assert_ok!(feed.refresh_once().await);
    assert!(!feed.cache().snapshot().stale);
}

#[rstest]
#[tokio::test]
async fn test_no_configured_pair_listed_is_a_failure() {
    let server = MockServer::start().await;
    mount_tickers(&server).await;

    let feed = feed(&server, pairs(&["XRP/USDT"]));
    let err = feed.refresh_once().await.unwrap_err();
    assert!(matches!(err, JournalError::Upstream(_)));
    assert!(feed.cache().snapshot().stale);
    assert!(feed.cache().state().last_error.is_some());
}

#[rstest]
#[tokio::test]
async fn test_configured_pairs_are_normalized() {
    let server = MockServer::start().await;
    mount_tickers(&server).await;

    let feed = feed(&server, pairs(&[" btc/usdt", "Eth/Usdt ", ""]));
    assert_eq!(feed.pairs(), pairs(&["BTC/USDT", "ETH/USDT"]).as_slice());

    feed.refresh_once().await.unwrap();
    let cached = feed.cache().snapshot().select(&pairs(&["ETH/USDT", "BTC/USDT"]));
    let symbols: Vec<&str> = cached.iter().map(|t| t.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["ETH/USDT", "BTC/USDT"]);
}
