//! Ingredient inventory ledger
//!
//! Append-only signed movements per ingredient; current stock is the sum
//! of all movements. Because every write creates a *new* document,
//! concurrent recordings never conflict - this is why stock is a derived
//! sum rather than a stored running total.
//!
//! Recomputation per query is the correctness baseline. The optional stock
//! cache is an opt-in optimization that is invalidated on every new
//! movement for the affected ingredient.

pub mod consumption;

pub use consumption::{ConsumptionResolver, IngredientConsumption, RequirementInput};

use crate::auth::Actor;
use crate::store::{DocumentStore, DocumentStoreExt, new_doc_id, partitions};
use crate::utils::validation::{MAX_NOTE_LEN, validate_required_text};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use shared::models::{Ingredient, InventoryMovement};
use shared::util::now_millis;
use shared::{CoreError, CoreResult};
use std::collections::HashMap;
use std::sync::Arc;

/// Default minimum stock used when an ingredient has no configured threshold
const DEFAULT_MIN_STOCK: f64 = 10.0;

/// Fraction of the minimum below which a low-stock alert becomes critical
const CRITICAL_RATIO: f64 = 0.3;

/// Low-stock alert severity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertLevel {
    Depleted,
    Critical,
    Low,
}

/// Low-stock alert for one ingredient
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockAlert {
    pub ingredient_id: String,
    pub name: String,
    pub unit: String,
    pub stock: f64,
    pub threshold: f64,
    pub level: AlertLevel,
}

/// Append-only inventory ledger
pub struct InventoryLedger {
    store: Arc<dyn DocumentStore>,
    stock_cache: Option<DashMap<String, f64>>,
}

impl InventoryLedger {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            stock_cache: None,
        }
    }

    /// Enable the per-ingredient stock cache
    pub fn with_stock_cache(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            stock_cache: Some(DashMap::new()),
        }
    }

    /// Append one signed movement for an ingredient.
    ///
    /// Positive amounts are entries (purchases, cancellation reversals),
    /// negative amounts are exits (consumption on sale). Zero amounts are
    /// rejected before any write.
    pub async fn record_movement(
        &self,
        ingredient_id: &str,
        amount: f64,
        reason: &str,
        actor: &Actor,
        order_ref: Option<String>,
    ) -> CoreResult<InventoryMovement> {
        validate_required_text(ingredient_id, "ingredient_id", MAX_NOTE_LEN)?;
        validate_required_text(reason, "reason", MAX_NOTE_LEN)?;
        if !amount.is_finite() {
            return Err(CoreError::validation(format!(
                "amount must be finite, got {}",
                amount
            )));
        }
        if amount == 0.0 {
            return Err(CoreError::validation("amount must not be zero"));
        }

        let movement = InventoryMovement {
            id: new_doc_id(partitions::INVENTORY),
            ingredient_id: ingredient_id.to_string(),
            amount,
            reason: reason.to_string(),
            recorded_by: actor.user_id.clone(),
            recorded_at: now_millis(),
            order_ref,
        };
        self.store
            .save_typed(&movement.id, &movement, None)
            .await
            .map_err(CoreError::from)?;

        if let Some(cache) = &self.stock_cache {
            cache.remove(ingredient_id);
        }

        tracing::info!(
            ingredient_id,
            amount,
            reason,
            recorded_by = %actor.user_id,
            "Inventory movement recorded"
        );
        Ok(movement)
    }

    /// Current stock of an ingredient: the fold of all its movements
    pub async fn current_stock(&self, ingredient_id: &str) -> CoreResult<f64> {
        if let Some(cache) = &self.stock_cache
            && let Some(stock) = cache.get(ingredient_id)
        {
            return Ok(*stock);
        }

        let stock = self
            .movements_for(ingredient_id)
            .await?
            .iter()
            .map(|m| m.amount)
            .sum();

        if let Some(cache) = &self.stock_cache {
            cache.insert(ingredient_id.to_string(), stock);
        }
        Ok(stock)
    }

    /// All movements referencing an ingredient
    pub async fn movements_for(&self, ingredient_id: &str) -> CoreResult<Vec<InventoryMovement>> {
        let movements: Vec<InventoryMovement> = self
            .store
            .query_typed(partitions::INVENTORY)
            .await
            .map_err(CoreError::from)?;
        Ok(movements
            .into_iter()
            .filter(|m| m.ingredient_id == ingredient_id)
            .collect())
    }

    /// Classify active ingredients against their configured minimum stock.
    ///
    /// `thresholds` maps ingredient id to its minimum; ingredients without
    /// an entry use [`DEFAULT_MIN_STOCK`].
    pub async fn stock_alerts(
        &self,
        thresholds: &HashMap<String, f64>,
    ) -> CoreResult<Vec<StockAlert>> {
        let ingredients: Vec<Ingredient> = self
            .store
            .query_typed(partitions::INGREDIENTS)
            .await
            .map_err(CoreError::from)?;

        let mut alerts = Vec::new();
        for ingredient in ingredients.iter().filter(|i| i.active) {
            let stock = self.current_stock(&ingredient.id).await?;
            let threshold = thresholds
                .get(&ingredient.id)
                .copied()
                .unwrap_or(DEFAULT_MIN_STOCK);

            let level = if stock <= 0.0 {
                AlertLevel::Depleted
            } else if stock <= threshold * CRITICAL_RATIO {
                AlertLevel::Critical
            } else if stock <= threshold {
                AlertLevel::Low
            } else {
                continue;
            };

            alerts.push(StockAlert {
                ingredient_id: ingredient.id.clone(),
                name: ingredient.name.clone(),
                unit: ingredient.unit.clone(),
                stock,
                threshold,
                level,
            });
        }
        Ok(alerts)
    }
}
