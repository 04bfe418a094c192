//! Money calculation utilities using rust_decimal for precision
//!
//! All calculations are done using `Decimal` internally, then converted to `f64`
//! for storage/serialization.

use rust_decimal::prelude::*;
use shared::order::{OrderItemInput, Payment, PaymentMethod};

use super::manager::ManagerError;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Maximum allowed quantity per line
pub const MAX_QUANTITY: u32 = 9999;
/// Maximum allowed menu price
pub const MAX_PRICE: f64 = 1_000_000.0;
/// Maximum allowed payment amount
const MAX_PAYMENT_AMOUNT: f64 = 1_000_000.0;

/// Validate that a f64 value is finite (not NaN, not Infinity)
#[inline]
fn require_finite(value: f64, field_name: &str) -> Result<(), ManagerError> {
    if !value.is_finite() {
        return Err(ManagerError::InvalidAmount(format!(
            "{} must be a finite number, got {}",
            field_name, value
        )));
    }
    Ok(())
}

/// Validate requested lines before any transaction is opened
pub fn validate_items(items: &[OrderItemInput]) -> Result<(), ManagerError> {
    if items.is_empty() {
        return Err(ManagerError::EmptyOrder);
    }

    for item in items {
        if item.menu_item_id.trim().is_empty() {
            return Err(ManagerError::InvalidOperation(
                "menu_item_id must not be empty".to_string(),
            ));
        }
        if item.quantity == 0 {
            return Err(ManagerError::InvalidQuantity(format!(
                "quantity must be at least 1 for menu item {}",
                item.menu_item_id
            )));
        }
        if item.quantity > MAX_QUANTITY {
            return Err(ManagerError::InvalidQuantity(format!(
                "quantity exceeds maximum allowed ({}), got {}",
                MAX_QUANTITY, item.quantity
            )));
        }
    }

    Ok(())
}

/// Validate payment figures before completion
pub fn validate_payment(payment: &Payment) -> Result<(), ManagerError> {
    require_finite(payment.amount_received, "amount_received")?;
    require_finite(payment.change_returned, "change_returned")?;

    if payment.amount_received < 0.0 || payment.amount_received > MAX_PAYMENT_AMOUNT {
        return Err(ManagerError::InvalidAmount(format!(
            "amount_received out of range: {}",
            payment.amount_received
        )));
    }
    if payment.change_returned < 0.0 {
        return Err(ManagerError::InvalidAmount(format!(
            "change_returned must be non-negative, got {}",
            payment.change_returned
        )));
    }

    // 现金支付必须有实收金额
    if payment.method == PaymentMethod::Cash && payment.amount_received <= 0.0 {
        return Err(ManagerError::InvalidAmount(
            "amount_received is required for cash payments".to_string(),
        ));
    }

    Ok(())
}

/// Validate a catalog price before it is snapshotted into an order
pub fn validate_price(price: f64, menu_item_id: &str) -> Result<(), ManagerError> {
    if !price.is_finite() || !(0.0..=MAX_PRICE).contains(&price) {
        return Err(ManagerError::InvalidPrice(format!(
            "menu item {} has invalid price {}",
            menu_item_id, price
        )));
    }
    Ok(())
}

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    round(value).to_f64().unwrap_or_default()
}

/// Convert a stock quantity back to f64 without monetary rounding
#[inline]
pub fn quantity_to_f64(value: Decimal) -> f64 {
    value.normalize().to_f64().unwrap_or_default()
}

#[inline]
fn round(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// unit_rate × quantity
pub fn line_total(unit_rate: f64, quantity: u32) -> Decimal {
    round(to_decimal(unit_rate) * Decimal::from(quantity))
}

/// Tax on an amount at the given rate, rounded to cents
pub fn tax_on(amount: Decimal, rate: Decimal) -> Decimal {
    round(amount * rate)
}

/// sub_total + tax_amount - discount_amount
pub fn order_total(sub_total: Decimal, tax_amount: Decimal, discount_amount: Decimal) -> Decimal {
    sub_total + tax_amount - discount_amount
}

/// Compare two monetary values for equality (within 0.01 tolerance)
pub fn money_eq(a: f64, b: f64) -> bool {
    let diff = (to_decimal(a) - to_decimal(b)).abs();
    diff < MONEY_TOLERANCE
}

/// Whether an order's stored amounts satisfy `total == sub_total + tax - discount`
pub fn totals_consistent(order: &shared::order::Order) -> bool {
    let expected = order_total(
        to_decimal(order.sub_total),
        to_decimal(order.tax_amount),
        to_decimal(order.discount_amount),
    );
    money_eq(order.total, to_f64(expected))
}
