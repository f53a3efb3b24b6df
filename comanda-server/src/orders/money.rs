//! Money calculation utilities using rust_decimal for precision
//!
//! All totals are computed with `Decimal` internally, then converted to
//! `f64` for storage and serialization.

use rust_decimal::prelude::*;
use shared::models::OrderItem;
use shared::{CoreError, CoreResult};

/// Rounding: 2 decimal places, half-up
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons
pub const MONEY_TOLERANCE: f64 = 0.01;

/// Maximum allowed unit price
pub const MAX_PRICE: f64 = 1_000_000.0;
/// Maximum allowed quantity per item line
pub const MAX_QUANTITY: i32 = 9999;

/// Round a monetary value to 2 decimal places, half-up
pub fn round_money(value: f64) -> f64 {
    Decimal::from_f64(value)
        .map(|d| {
            d.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
                .to_f64()
                .unwrap_or(value)
        })
        .unwrap_or(value)
}

/// Sum of `quantity × unit_price` over items that count toward the total
pub fn order_total(items: &[OrderItem]) -> f64 {
    let total: Decimal = items
        .iter()
        .filter(|item| item.counts_toward_total())
        .filter_map(|item| {
            Decimal::from_f64(item.unit_price).map(|price| price * Decimal::from(item.quantity))
        })
        .sum();
    total
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or(0.0)
}

/// Validate a unit price: finite, non-negative, bounded
pub fn validate_price(price: f64, field: &str) -> CoreResult<()> {
    if !price.is_finite() {
        return Err(CoreError::validation(format!(
            "{field} must be a finite number, got {price}"
        )));
    }
    if price < 0.0 {
        return Err(CoreError::validation(format!(
            "{field} must be non-negative, got {price}"
        )));
    }
    if price > MAX_PRICE {
        return Err(CoreError::validation(format!(
            "{field} exceeds maximum allowed ({MAX_PRICE}), got {price}"
        )));
    }
    Ok(())
}

/// Validate an item quantity: positive, bounded
pub fn validate_quantity(quantity: i32) -> CoreResult<()> {
    if quantity <= 0 {
        return Err(CoreError::validation(format!(
            "quantity must be positive, got {quantity}"
        )));
    }
    if quantity > MAX_QUANTITY {
        return Err(CoreError::validation(format!(
            "quantity exceeds maximum allowed ({MAX_QUANTITY}), got {quantity}"
        )));
    }
    Ok(())
}

/// Whether two monetary amounts are equal within tolerance
pub fn amounts_match(a: f64, b: f64) -> bool {
    (a - b).abs() < MONEY_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{DispatchState, ItemState};

    fn item(price: f64, quantity: i32, state: ItemState) -> OrderItem {
        OrderItem {
            dish_id: "dishes:x".to_string(),
            name: "X".to_string(),
            unit_price: price,
            quantity,
            comments: None,
            original_price: None,
            state,
            dispatch: DispatchState::default(),
        }
    }

    #[test]
    fn test_round_money_half_up() {
        assert_eq!(round_money(1.005), 1.01);
        assert_eq!(round_money(1.004), 1.0);
        assert_eq!(round_money(18.0), 18.0);
    }

    #[test]
    fn test_order_total_excludes_cancelled_items() {
        let items = vec![
            item(5.0, 2, ItemState::Active),
            item(8.0, 1, ItemState::Active),
            item(
                100.0,
                3,
                ItemState::Cancelled {
                    approved_by: "admin".to_string(),
                    approved_at: 0,
                },
            ),
        ];
        assert_eq!(order_total(&items), 18.0);
    }

    #[test]
    fn test_order_total_avoids_float_drift() {
        // 0.1 + 0.2 style accumulation stays exact under Decimal
        let items: Vec<OrderItem> = (0..10).map(|_| item(0.1, 1, ItemState::Active)).collect();
        assert_eq!(order_total(&items), 1.0);
    }

    #[test]
    fn test_price_and_quantity_validation() {
        assert!(validate_price(5.0, "unit_price").is_ok());
        assert!(validate_price(-1.0, "unit_price").is_err());
        assert!(validate_price(f64::INFINITY, "unit_price").is_err());
        assert!(validate_price(2_000_000.0, "unit_price").is_err());

        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-2).is_err());
        assert!(validate_quantity(10_000).is_err());
    }
}
