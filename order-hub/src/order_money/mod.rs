//! Money calculation utilities using rust_decimal for precision
//!
//! All calculations are done using `Decimal` internally, then converted to `f64`
//! for storage/serialization.

use crate::orders::traits::OrderError;
use rust_decimal::prelude::*;
use shared::order::{LineItem, OrderAggregate, OrderTotals};

/// Rounding strategy for monetary values (2 decimal places, half away from zero)
const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed price per item (1,000,000)
pub const MAX_PRICE: f64 = 1_000_000.0;
/// Maximum allowed quantity per line
pub const MAX_QUANTITY: u32 = 9999;
/// Maximum allowed single tip
pub const MAX_TIP: f64 = 100_000.0;

/// Convert f64 to Decimal for calculation
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(value = ?value, "Non-finite f64 in monetary calculation, defaulting to zero");
        Decimal::ZERO
    })
}

/// Round to 2 places, half away from zero
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert Decimal back to f64 for storage, rounded to 2 places
pub fn to_f64(value: Decimal) -> f64 {
    round_money(value).to_f64().unwrap_or_default()
}

/// Validate that a f64 value is finite (not NaN, not Infinity)
#[inline]
fn require_finite(value: f64, field_name: &str) -> Result<(), OrderError> {
    if !value.is_finite() {
        return Err(OrderError::Validation(format!(
            "{} must be a finite number, got {}",
            field_name, value
        )));
    }
    Ok(())
}

/// Validate a line quantity
pub fn validate_quantity(quantity: u32) -> Result<(), OrderError> {
    if quantity == 0 {
        return Err(OrderError::Validation(
            "quantity must be positive".to_string(),
        ));
    }
    if quantity > MAX_QUANTITY {
        return Err(OrderError::Validation(format!(
            "quantity exceeds maximum allowed ({}), got {}",
            MAX_QUANTITY, quantity
        )));
    }
    Ok(())
}

/// Validate a menu price before it is snapshotted onto a line
pub fn validate_price(price: f64) -> Result<(), OrderError> {
    require_finite(price, "price")?;
    if price < 0.0 {
        return Err(OrderError::Validation(format!(
            "price must be non-negative, got {}",
            price
        )));
    }
    if price > MAX_PRICE {
        return Err(OrderError::Validation(format!(
            "price exceeds maximum allowed ({}), got {}",
            MAX_PRICE, price
        )));
    }
    Ok(())
}

/// Validate a tip amount
pub fn validate_tip(amount: f64) -> Result<(), OrderError> {
    require_finite(amount, "tip")?;
    if amount < 0.0 {
        return Err(OrderError::Validation(format!(
            "tip must not be negative, got {}",
            amount
        )));
    }
    if amount > MAX_TIP {
        return Err(OrderError::Validation(format!(
            "tip exceeds maximum allowed ({}), got {}",
            MAX_TIP, amount
        )));
    }
    Ok(())
}

/// price × quantity of one line
pub fn line_total(item: &LineItem) -> Decimal {
    to_decimal(item.price) * Decimal::from(item.quantity)
}

/// `base × rate%`
fn percent_of(base: Decimal, rate: f64) -> Decimal {
    base * to_decimal(rate) / Decimal::ONE_HUNDRED
}

/// Compute totals from live lines and the snapshotted rates
///
/// `tip` is carried over, it is accumulated by `tip_added` events.
pub fn compute_totals(
    items: &[LineItem],
    tax_rate: f64,
    service_rate: f64,
    tip: f64,
) -> OrderTotals {
    let net: Decimal = items.iter().filter(|i| i.is_live()).map(line_total).sum();
    let net = round_money(net);
    let tax = round_money(percent_of(net, tax_rate));
    let service = round_money(percent_of(net, service_rate));
    let tip = round_money(to_decimal(tip));

    // Sum the rounded components so gross always equals what is shown
    OrderTotals {
        net: to_f64(net),
        tax: to_f64(tax),
        service: to_f64(service),
        tip: to_f64(tip),
        gross: to_f64(net + tax + service + tip),
    }
}

/// Recalculate the aggregate's totals
///
/// Once the bill is requested net, tax and service stay frozen and only the
/// gross follows the tip.
pub fn recalculate_totals(aggregate: &mut OrderAggregate) {
    if aggregate.totals_frozen {
        let totals = &mut aggregate.totals;
        totals.gross = to_f64(
            to_decimal(totals.net)
                + to_decimal(totals.tax)
                + to_decimal(totals.service)
                + to_decimal(totals.tip),
        );
        return;
    }
    aggregate.totals = compute_totals(
        &aggregate.items,
        aggregate.tax_rate,
        aggregate.service_rate,
        aggregate.totals.tip,
    );
}

/// Add a tip to the running totals
pub fn add_tip(aggregate: &mut OrderAggregate, amount: f64) {
    aggregate.totals.tip = to_f64(to_decimal(aggregate.totals.tip) + to_decimal(amount));
    recalculate_totals(aggregate);
}

#[cfg(test)]
mod tests;
