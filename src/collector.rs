//! # Ingredient Collector
//!
//! Walks a meal plan's items in stored order and pulls out raw
//! `{name, quantity}` pairs, from either an external recipe snapshot or a
//! local recipe's free-text ingredient body.

use log::{debug, warn};

use crate::models::{IngredientEntry, IngredientSource, MealItem};

/// Collect raw ingredient entries from `items`, in item order
///
/// A snapshot that cannot be parsed is logged and skipped; it never fails
/// the whole collection.
pub fn collect(items: &[MealItem]) -> Vec<IngredientEntry> {
    let mut entries = Vec::new();

    for item in items {
        match item.ingredient_source() {
            IngredientSource::ExternalSnapshot(snapshot) => {
                match serde_json::from_str::<Vec<IngredientEntry>>(snapshot) {
                    Ok(parsed) => {
                        debug!(
                            "Meal item {} contributes {} snapshot entries",
                            item.id,
                            parsed.len()
                        );
                        entries.extend(parsed);
                    }
                    Err(e) => {
                        warn!(
                            "Skipping meal item {}: malformed ingredient snapshot: {}",
                            item.id, e
                        );
                    }
                }
            }
            IngredientSource::LocalRecipe(text) => {
                let before = entries.len();
                entries.extend(recipe_lines(text));
                debug!(
                    "Meal item {} contributes {} recipe lines",
                    item.id,
                    entries.len() - before
                );
            }
            IngredientSource::None => {
                debug!("Meal item {} has no ingredient source", item.id);
            }
        }
    }

    entries
}

/// Split a recipe's ingredient body into entries with no quantity
pub fn recipe_lines(text: &str) -> impl Iterator<Item = IngredientEntry> + '_ {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| IngredientEntry::new(line, ""))
}
