//! # Shopping List Builder
//!
//! Consolidates every ingredient planned into a meal plan into one
//! deduplicated shopping list, then swaps it in for the plan's previous list.
//!
//! ## Pipeline
//!
//! 1. [`collect`] raw entries from the plan's meal items, in item order
//! 2. clean each name, drop empty and instruction-like lines
//! 3. group by case-insensitive name; the first occurrence seeds the entry
//!    (its casing is the display name), later ones merge their quantities
//! 4. emit entries in first-seen order
//! 5. replace the stored list inside one transaction
//!
//! The list is a derived cache: regeneration overwrites it completely,
//! including any checked flags.

use log::{debug, info, trace};
use std::collections::HashMap;

use crate::classifier::is_instruction_like;
use crate::collector::collect;
use crate::errors::ShoppingError;
use crate::models::{IngredientEntry, MealItem, MealPlan, ShoppingDraft, ShoppingItem};
use crate::normalizer::{aggregation_key, clean_name};
use crate::quantity::{clip_field, filter_serving_quantity, merge_quantities};

/// Storage operations the builder depends on
///
/// `replace_shopping_items` must delete the plan's current shopping items and
/// insert `drafts` as one atomic unit: on failure, the old list stays visible.
#[allow(async_fn_in_trait)]
pub trait MealPlanStore {
    /// Fetch a meal plan owned by `user_id`
    async fn find_meal_plan(&self, user_id: i64, meal_plan_id: i64)
        -> anyhow::Result<Option<MealPlan>>;

    /// Meal items of a plan in insertion order, with local recipe text joined in
    async fn load_meal_items(&self, meal_plan_id: i64) -> anyhow::Result<Vec<MealItem>>;

    /// Atomically replace the plan's shopping items with `drafts`, in order
    async fn replace_shopping_items(
        &self,
        meal_plan_id: i64,
        drafts: &[ShoppingDraft],
    ) -> anyhow::Result<Vec<ShoppingItem>>;
}

/// Consolidate raw entries into shopping lines, in first-seen order
///
/// # Examples
///
/// ```rust
/// use meal_planner::models::IngredientEntry;
/// use meal_planner::shopping_list::consolidate;
///
/// let drafts = consolidate(&[
///     IngredientEntry::new("Tomato", "2"),
///     IngredientEntry::new("Preheat oven to 350 degrees", ""),
///     IngredientEntry::new("tomato", "3"),
/// ]);
///
/// assert_eq!(drafts.len(), 1);
/// assert_eq!(drafts[0].name, "Tomato");
/// assert_eq!(drafts[0].quantity, "2 + 3");
/// ```
pub fn consolidate(entries: &[IngredientEntry]) -> Vec<ShoppingDraft> {
    let mut drafts: Vec<ShoppingDraft> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for entry in entries {
        let name = clean_name(&entry.name);
        if name.is_empty() {
            trace!("Skipping entry with empty name");
            continue;
        }
        if is_instruction_like(&name) {
            debug!("Skipping instruction-like line: '{name}'");
            continue;
        }

        let key = aggregation_key(&name);
        match positions.get(&key).copied() {
            Some(index) => {
                let draft = &mut drafts[index];
                draft.quantity = clip_field(&merge_quantities(&draft.quantity, &entry.quantity));
                trace!("Merged '{name}' into '{}': '{}'", draft.name, draft.quantity);
            }
            None => {
                positions.insert(key, drafts.len());
                drafts.push(ShoppingDraft {
                    name: clip_field(&name),
                    quantity: clip_field(&filter_serving_quantity(&entry.quantity)),
                });
            }
        }
    }

    drafts
}

/// Build the shopping lines for a set of meal items without touching storage
pub fn build_drafts(items: &[MealItem]) -> Vec<ShoppingDraft> {
    let entries = collect(items);
    let drafts = consolidate(&entries);

    info!(
        "Consolidated {} meal items: {} raw entries -> {} shopping lines",
        items.len(),
        entries.len(),
        drafts.len()
    );
    drafts
}

/// Regenerate and store the shopping list of `meal_plan_id` for `user_id`
///
/// Returns the full new list. Malformed snapshots are logged and skipped;
/// any storage failure surfaces as [`ShoppingError::Persistence`] with the
/// previous list left in place.
pub async fn regenerate_shopping_list<S: MealPlanStore>(
    store: &S,
    user_id: i64,
    meal_plan_id: i64,
) -> Result<Vec<ShoppingItem>, ShoppingError> {
    info!("Regenerating shopping list for meal plan {meal_plan_id} (user {user_id})");

    let plan = store
        .find_meal_plan(user_id, meal_plan_id)
        .await?
        .ok_or(ShoppingError::MealPlanNotFound(meal_plan_id))?;

    let items = store.load_meal_items(plan.id).await?;
    let drafts = build_drafts(&items);
    let stored = store.replace_shopping_items(plan.id, &drafts).await?;

    info!(
        "Stored {} shopping items for meal plan {}",
        stored.len(),
        plan.id
    );
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, quantity: &str) -> IngredientEntry {
        IngredientEntry::new(name, quantity)
    }

    fn pairs(drafts: &[ShoppingDraft]) -> Vec<(&str, &str)> {
        drafts
            .iter()
            .map(|d| (d.name.as_str(), d.quantity.as_str()))
            .collect()
    }

    #[test]
    fn test_case_insensitive_merge_keeps_first_casing() {
        let drafts = consolidate(&[entry("Tomato", "2"), entry("tomato", "3")]);
        assert_eq!(pairs(&drafts), vec![("Tomato", "2 + 3")]);
    }

    #[test]
    fn test_first_seen_order() {
        let drafts = consolidate(&[
            entry("onion", "1"),
            entry("garlic", "2 cloves"),
            entry("Onion", "2"),
            entry("basil", ""),
        ]);
        assert_eq!(
            pairs(&drafts),
            vec![("onion", "1 + 2"), ("garlic", "2 cloves"), ("basil", "")]
        );
    }

    #[test]
    fn test_noise_is_dropped() {
        let drafts = consolidate(&[
            entry("", "1"),
            entry("   ", ""),
            entry("Preheat oven to 350 degrees", ""),
            entry("Servings", "4"),
            entry("flour", "2 cups"),
        ]);
        assert_eq!(pairs(&drafts), vec![("flour", "2 cups")]);
    }

    #[test]
    fn test_serving_quantity_on_first_occurrence() {
        let drafts = consolidate(&[entry("rice", "2 servings"), entry("rice", "1 cup")]);
        assert_eq!(pairs(&drafts), vec![("rice", "1 cup")]);
    }

    #[test]
    fn test_serving_quantity_on_later_occurrence() {
        let drafts = consolidate(&[entry("rice", ""), entry("rice", "2 servings")]);
        assert_eq!(pairs(&drafts), vec![("rice", "")]);
    }

    #[test]
    fn test_bullets_and_whitespace_share_a_key() {
        let drafts = consolidate(&[entry("- Olive oil", "1 tbsp"), entry("olive   OIL", "2 tbsp")]);
        assert_eq!(pairs(&drafts), vec![("Olive oil", "1 tbsp + 2 tbsp")]);
    }

    #[test]
    fn test_quantities_are_trimmed() {
        let drafts = consolidate(&[entry("milk", "  1 cup "), entry("milk", " 2 cups")]);
        assert_eq!(pairs(&drafts), vec![("milk", "1 cup + 2 cups")]);
    }

    #[test]
    fn test_long_quantity_is_clipped() {
        let drafts = consolidate(&[entry("salt", &"1".repeat(300))]);
        assert_eq!(drafts[0].quantity.chars().count(), 255);
    }

    #[test]
    fn test_consolidate_is_deterministic() {
        let entries = vec![entry("b", "1"), entry("a", "2"), entry("B", "3")];
        assert_eq!(consolidate(&entries), consolidate(&entries));
    }
}
