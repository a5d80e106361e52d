//! Request body validation
//!
//! Turns a loosely-typed [`TradeInput`] into a [`NewTrade`], deriving
//! `quantity` and (when an exit price is known) `pnl` on the way.

use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::{
    errors::{JournalError, JournalResult},
    models::{NewTrade, TradeInput, TradeType},
};

/// Quantity bought with `usd_amount` at `entry_price`
#[must_use]
pub fn derive_quantity(usd_amount: f64, entry_price: f64) -> f64 {
    if entry_price > 0.0 {
        usd_amount / entry_price
    } else {
        0.0
    }
}

/// Realized P&L of a closed position
#[must_use]
pub fn derive_pnl(trade_type: TradeType, entry_price: f64, exit_price: f64, quantity: f64) -> f64 {
    match trade_type {
        TradeType::Long => (exit_price - entry_price) * quantity,
        TradeType::Short => (entry_price - exit_price) * quantity,
    }
}

/// Validate a create/update body against the trade schema
pub fn validate_trade(input: TradeInput) -> JournalResult<NewTrade> {
    let pair = required_text("pair", input.pair)?.to_uppercase();
    let strategy = required_text("strategy", input.strategy)?;

    let entry_price = positive("entry_price", required("entry_price", input.entry_price)?)?;
    let usd_amount = positive("usd_amount", required("usd_amount", input.usd_amount)?)?;
    let trade_date = required("trade_date", input.trade_date)?;
    let trade_type = required("trade_type", input.trade_type)?;

    let exit_price = input.exit_price.map(|v| positive("exit_price", v)).transpose()?;
    let stop_loss = input.stop_loss.map(|v| positive("stop_loss", v)).transpose()?;
    let take_profit = input
        .take_profit
        .map(|v| positive("take_profit", v))
        .transpose()?;
    let client_pnl = input.pnl.map(|v| finite("pnl", v)).transpose()?;

    // Finite inputs can still overflow once combined
    let quantity = finite("quantity", derive_quantity(usd_amount, entry_price))?;
    let pnl = match exit_price {
        Some(exit) => Some(finite(
            "pnl",
            derive_pnl(trade_type, entry_price, exit, quantity),
        )?),
        None => client_pnl,
    };

    let notes = input.notes.filter(|n| !n.trim().is_empty());
    let image_data = input
        .image_data
        .filter(|img| !img.trim().is_empty())
        .map(validate_image)
        .transpose()?;

    Ok(NewTrade {
        pair,
        entry_price,
        exit_price,
        usd_amount,
        quantity,
        trade_date,
        pnl,
        strategy,
        trade_type,
        stop_loss,
        take_profit,
        notes,
        image_data,
    })
}

fn required<T>(field: &str, value: Option<T>) -> JournalResult<T> {
    value.ok_or_else(|| JournalError::validation(format!("missing required field '{field}'")))
}

fn required_text(field: &str, value: Option<String>) -> JournalResult<String> {
    let value = required(field, value)?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(JournalError::validation(format!(
            "field '{field}' must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

fn finite(field: &str, value: f64) -> JournalResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(JournalError::validation(format!(
            "field '{field}' must be a finite number"
        )))
    }
}

fn positive(field: &str, value: f64) -> JournalResult<f64> {
    let value = finite(field, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(JournalError::validation(format!(
            "field '{field}' must be greater than zero"
        )))
    }
}

/// Accepts bare base64 or a `data:<mime>;base64,` URL
fn validate_image(image: String) -> JournalResult<String> {
    let payload = match image.split_once(";base64,") {
        Some((prefix, payload)) if prefix.starts_with("data:") => payload,
        _ => image.as_str(),
    };

    STANDARD
        .decode(payload.trim())
        .map_err(|e| JournalError::validation(format!("field 'image_data' is not valid base64: {e}")))?;

    Ok(image)
}
