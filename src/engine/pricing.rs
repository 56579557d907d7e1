//! Platform Pricing
//!
//! Unit price precedence for a materialized line: the platform-specific
//! override if one is configured, else the POS item's own price, else the
//! price the aggregator sent. Totals go through `rust_decimal` so that
//! 3 x 33.33 lands on the paisa.

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

pub fn resolve_unit_price(
    platform_override: Option<f64>,
    base_price: f64,
    aggregator_price: f64,
) -> f64 {
    if let Some(price) = platform_override {
        return price;
    }
    if base_price > 0.0 {
        return base_price;
    }
    aggregator_price
}

/// unit price x quantity, rounded to 2 decimal places.
pub fn line_total(unit_price: f64, quantity: i64) -> f64 {
    let unit = Decimal::from_f64(unit_price).unwrap_or_default();
    let total = (unit * Decimal::from(quantity)).round_dp(2);
    total.to_f64().unwrap_or(0.0)
}
