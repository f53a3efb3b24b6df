//! Inventory documents
//!
//! Stock is never stored as a running total. Every change is one signed,
//! append-only movement; current stock is the fold of all movements for an
//! ingredient. Movements are never updated or deleted, which keeps stock
//! auditable and replay-idempotent, and lets concurrent writers append
//! without conflicting.

use serde::{Deserialize, Serialize};

/// Ingredient master record (partition `ingredients`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ingredient {
    pub id: String,
    pub name: String,
    /// Unit of measure (e.g. "bottle", "liter", "kg", "unit")
    pub unit: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Signed stock movement (partition `inventory`), append-only
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryMovement {
    pub id: String,
    pub ingredient_id: String,
    /// Positive = entry (purchase, cancellation reversal),
    /// negative = exit (consumption on sale)
    pub amount: f64,
    pub reason: String,
    pub recorded_by: String,
    pub recorded_at: i64,
    /// Order/ticket reference for sale and reversal movements
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_ref: Option<String>,
}

impl InventoryMovement {
    pub fn is_entry(&self) -> bool {
        self.amount > 0.0
    }
}

/// Dish-to-ingredient requirement (partition `dish_ingredients`)
///
/// Many-to-many; the set for a dish is recreated wholesale on edit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DishIngredient {
    pub id: String,
    pub dish_id: String,
    pub ingredient_id: String,
    /// Quantity required per one unit of the dish, in `unit`
    pub quantity: f64,
    pub unit: String,
}
