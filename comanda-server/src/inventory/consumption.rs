//! Ingredient consumption resolution
//!
//! Maps a dish to its ingredient requirements and scales them by the sold
//! quantity. Requirements are stored in the ingredient's native unit; the
//! fixed shot table below only converts *authored* shot counts into native
//! units for the units it knows about. The conversion is one-directional -
//! native quantities are never converted back to shots - and ingredients
//! whose unit is not in the table are consumed and reverted in their
//! native unit unchanged.

use crate::store::{DocumentStore, DocumentStoreExt, new_doc_id, partitions};
use serde::{Deserialize, Serialize};
use shared::models::DishIngredient;
use shared::{CoreError, CoreResult};
use std::sync::Arc;

/// Shots per unit for coarse liquor units
const UNIT_SHOTS: [(&str, f64); 3] = [("bottle", 24.0), ("liter", 36.0), ("half-liter", 18.0)];

/// Shot count for one unit of measure, if the unit is convertible
pub fn shots_per_unit(unit: &str) -> Option<f64> {
    let unit = unit.trim().to_lowercase();
    UNIT_SHOTS
        .iter()
        .find(|(name, _)| *name == unit)
        .map(|(_, shots)| *shots)
}

/// Scaled requirement for one ingredient of a dish
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngredientConsumption {
    pub ingredient_id: String,
    pub amount: f64,
    pub unit: String,
}

/// Authoring input for one dish-ingredient requirement
#[derive(Debug, Clone)]
pub struct RequirementInput {
    pub ingredient_id: String,
    /// Per-unit-of-dish quantity, in `unit` or in shots when `in_shots`
    pub quantity: f64,
    pub unit: String,
    /// Quantity was authored in shots; only valid for convertible units
    pub in_shots: bool,
}

/// Resolves dish ingredient requirements from the relation documents
pub struct ConsumptionResolver {
    store: Arc<dyn DocumentStore>,
}

impl ConsumptionResolver {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Requirements of one dish scaled by the sold quantity
    pub async fn consumed_ingredients(
        &self,
        dish_id: &str,
        quantity: i32,
    ) -> CoreResult<Vec<IngredientConsumption>> {
        if quantity <= 0 {
            return Err(CoreError::validation(format!(
                "quantity must be positive, got {}",
                quantity
            )));
        }

        let relations = self.relations_for_dish(dish_id).await?;
        Ok(relations
            .into_iter()
            .map(|rel| IngredientConsumption {
                ingredient_id: rel.ingredient_id,
                amount: rel.quantity * quantity as f64,
                unit: rel.unit,
            })
            .collect())
    }

    /// All relation documents of one dish
    pub async fn relations_for_dish(&self, dish_id: &str) -> CoreResult<Vec<DishIngredient>> {
        let relations: Vec<DishIngredient> = self
            .store
            .query_typed(partitions::DISH_INGREDIENTS)
            .await
            .map_err(CoreError::from)?;
        Ok(relations
            .into_iter()
            .filter(|rel| rel.dish_id == dish_id)
            .collect())
    }

    /// Replace the full requirement set of a dish.
    ///
    /// Old relations are deleted and the new set inserted - the relation
    /// editor always rewrites the whole set. Shot-authored quantities are
    /// converted to the ingredient's native unit here, at write time.
    pub async fn replace_for_dish(
        &self,
        dish_id: &str,
        requirements: Vec<RequirementInput>,
    ) -> CoreResult<Vec<DishIngredient>> {
        // Validate everything before touching the store
        let mut converted = Vec::with_capacity(requirements.len());
        for req in &requirements {
            if !req.quantity.is_finite() || req.quantity <= 0.0 {
                return Err(CoreError::validation(format!(
                    "requirement quantity must be positive, got {}",
                    req.quantity
                )));
            }
            let quantity = if req.in_shots {
                let shots = shots_per_unit(&req.unit).ok_or_else(|| {
                    CoreError::validation(format!(
                        "unit '{}' has no shot conversion",
                        req.unit
                    ))
                })?;
                req.quantity / shots
            } else {
                req.quantity
            };
            converted.push(DishIngredient {
                id: new_doc_id(partitions::DISH_INGREDIENTS),
                dish_id: dish_id.to_string(),
                ingredient_id: req.ingredient_id.clone(),
                quantity,
                unit: req.unit.clone(),
            });
        }

        let existing: Vec<(DishIngredient, _)> = self
            .store
            .query_typed_with_revisions(partitions::DISH_INGREDIENTS)
            .await
            .map_err(CoreError::from)?;
        for (rel, rev) in existing.iter().filter(|(rel, _)| rel.dish_id == dish_id) {
            self.store
                .delete(&rel.id, rev)
                .await
                .map_err(CoreError::from)?;
        }

        for rel in &converted {
            self.store
                .save_typed(&rel.id, rel, None)
                .await
                .map_err(CoreError::from)?;
        }

        tracing::info!(
            dish_id,
            relations = converted.len(),
            "Dish ingredient relations replaced"
        );
        Ok(converted)
    }
}
