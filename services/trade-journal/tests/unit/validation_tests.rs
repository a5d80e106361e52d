//! Trade body validation tests

use approx::assert_relative_eq;
use rstest::*;
use trade_journal::{
    JournalError,
    models::{TradeInput, TradeType},
    validation::{derive_pnl, derive_quantity, validate_trade},
};

use crate::factories::trade_input;

#[fixture]
fn input() -> TradeInput {
    trade_input("BTC/USDT", "Breakout")
}

#[rstest]
#[case(100.0, 500.0, 5.0)]
#[case(65000.0, 1300.0, 0.02)]
#[case(0.5, 10.0, 20.0)]
fn test_quantity_from_capital_and_entry(#[case] entry: f64, #[case] usd: f64, #[case] expected: f64) {
    assert_relative_eq!(derive_quantity(usd, entry), expected, epsilon = 1e-12);
}

#[rstest]
#[case(TradeType::Long, 100.0, 120.0, 2.0, 40.0)]
#[case(TradeType::Long, 100.0, 80.0, 2.0, -40.0)]
#[case(TradeType::Short, 100.0, 80.0, 2.0, 40.0)]
#[case(TradeType::Short, 100.0, 120.0, 2.0, -40.0)]
fn test_pnl_sign_follows_direction(
    #[case] trade_type: TradeType,
    #[case] entry: f64,
    #[case] exit: f64,
    #[case] quantity: f64,
    #[case] expected: f64,
) {
    assert_relative_eq!(derive_pnl(trade_type, entry, exit, quantity), expected);
}

#[rstest]
#[case::pair(TradeInput { pair: None, ..trade_input("BTC/USDT", "Breakout") }, "pair")]
#[case::strategy(TradeInput { strategy: Some("   ".to_string()), ..trade_input("BTC/USDT", "Breakout") }, "strategy")]
#[case::entry(TradeInput { entry_price: None, ..trade_input("BTC/USDT", "Breakout") }, "entry_price")]
#[case::usd(TradeInput { usd_amount: Some(-5.0), ..trade_input("BTC/USDT", "Breakout") }, "usd_amount")]
#[case::date(TradeInput { trade_date: None, ..trade_input("BTC/USDT", "Breakout") }, "trade_date")]
#[case::direction(TradeInput { trade_type: None, ..trade_input("BTC/USDT", "Breakout") }, "trade_type")]
#[case::exit(TradeInput { exit_price: Some(0.0), ..trade_input("BTC/USDT", "Breakout") }, "exit_price")]
#[case::stop(TradeInput { stop_loss: Some(f64::NAN), ..trade_input("BTC/USDT", "Breakout") }, "stop_loss")]
fn test_invalid_field_is_named(#[case] body: TradeInput, #[case] field: &str) {
    let err = validate_trade(body).unwrap_err();
    assert!(matches!(err, JournalError::Validation(_)));
    assert!(
        err.to_string().contains(field),
        "error '{err}' should name field '{field}'"
    );
}

#[rstest]
fn test_pair_is_trimmed_and_uppercased(mut input: TradeInput) {
    input.pair = Some("  eth/usdt ".to_string());
    assert_eq!(validate_trade(input).unwrap().pair, "ETH/USDT");
}

#[rstest]
fn test_blank_notes_are_dropped(mut input: TradeInput) {
    input.notes = Some("  ".to_string());
    input.image_data = Some(String::new());
    let trade = validate_trade(input).unwrap();
    assert!(trade.notes.is_none());
    assert!(trade.image_data.is_none());
}

#[rstest]
fn test_derived_pnl_replaces_client_value(mut input: TradeInput) {
    input.exit_price = Some(110.0);
    input.pnl = Some(1.0);
    let trade = validate_trade(input).unwrap();
    // 1000 USD at 100 buys 10 units
    assert_relative_eq!(trade.quantity, 10.0);
    assert_relative_eq!(trade.pnl.unwrap(), 100.0);
}

#[rstest]
fn test_body_decodes_from_client_json() {
    let body: TradeInput = serde_json::from_value(serde_json::json!({
        "pair": "SOL/USDT",
        "entry_price": 150.0,
        "usd_amount": 300.0,
        "trade_date": "2024-05-01",
        "strategy": "Swing",
        "trade_type": "Short",
        "notes": "fade the pump"
    }))
    .unwrap();

    let trade = validate_trade(body).unwrap();
    assert_eq!(trade.trade_type, TradeType::Short);
    assert_relative_eq!(trade.quantity, 2.0);
    assert_eq!(trade.notes.as_deref(), Some("fade the pump"));
    assert!(trade.pnl.is_none());
}

#[rstest]
#[case::quantity(1e-300, 1e308, 2.0, "quantity")]
#[case::pnl(1.0, 1e308, 3.0, "pnl")]
fn test_overflowing_derived_value_is_rejected(
    mut input: TradeInput,
    #[case] entry: f64,
    #[case] usd: f64,
    #[case] exit: f64,
    #[case] field: &str,
) {
    input.entry_price = Some(entry);
    input.usd_amount = Some(usd);
    input.exit_price = Some(exit);

    let err = validate_trade(input).unwrap_err();
    assert!(matches!(err, JournalError::Validation(_)));
    assert!(
        err.to_string().contains(&format!("'{field}'")),
        "error '{err}' should name field '{field}'"
    );
}
