//! # Meal Planning Data Model
//!
//! Records stored for a user's week: recipes, meal plans, the meal items
//! planned into them, and the shopping items derived from those meals.
//!
//! ## Core Concepts
//!
//! - **Recipe**: locally authored, with a free-text ingredient body (one
//!   ingredient per line)
//! - **MealItem**: one planned meal; points at a local recipe or carries a
//!   frozen snapshot of an externally sourced recipe
//! - **ShoppingItem**: one consolidated line of the plan's shopping list,
//!   regenerated wholesale from the meal items

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// A locally authored recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Recipe {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    /// Free text, one ingredient per line
    pub ingredients: String,
    pub steps: Option<String>,
}

/// Input for creating a recipe; missing fields take defaults
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewRecipe {
    pub title: Option<String>,
    pub ingredients: Option<String>,
    pub steps: Option<String>,
}

impl NewRecipe {
    pub const DEFAULT_TITLE: &'static str = "Untitled";

    pub fn title_or_default(&self) -> &str {
        self.title.as_deref().unwrap_or(Self::DEFAULT_TITLE)
    }

    pub fn ingredients_or_default(&self) -> &str {
        self.ingredients.as_deref().unwrap_or("")
    }
}

/// Partial update of a recipe; `None` leaves the field untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeUpdate {
    pub title: Option<String>,
    pub ingredients: Option<String>,
    pub steps: Option<String>,
}

/// A week of planned meals owned by one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MealPlan {
    pub id: i64,
    pub user_id: i64,
    pub week_start: NaiveDate,
}

/// One planned meal, as loaded for shopping list generation
///
/// `recipe_ingredients` is the ingredient text of the referenced local recipe
/// (joined in at load time), `ingredients_json` the serialized snapshot of an
/// external recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MealItem {
    pub id: i64,
    pub meal_plan_id: i64,
    pub recipe_id: Option<i64>,
    pub day: String,
    pub meal_type: String,
    pub provider: Option<String>,
    pub external_id: Option<String>,
    pub title: Option<String>,
    pub image: Option<String>,
    pub ingredients_json: Option<String>,
    pub recipe_ingredients: Option<String>,
}

/// Where a meal item's ingredients come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngredientSource<'a> {
    /// Serialized snapshot of an external recipe's ingredient list
    ExternalSnapshot(&'a str),
    /// Free-text ingredient body of a local recipe
    LocalRecipe(&'a str),
    None,
}

impl MealItem {
    /// A snapshot wins whenever one is stored, then the local recipe
    pub fn ingredient_source(&self) -> IngredientSource<'_> {
        match (&self.ingredients_json, &self.recipe_ingredients) {
            (Some(snapshot), _) if !snapshot.trim().is_empty() => {
                IngredientSource::ExternalSnapshot(snapshot)
            }
            (_, Some(text)) if self.recipe_id.is_some() => IngredientSource::LocalRecipe(text),
            _ => IngredientSource::None,
        }
    }
}

/// A single `{name, quantity}` ingredient line
///
/// Snapshot fields are read leniently: numbers are rendered as text, and
/// missing, null or other non-string values become empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientEntry {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub quantity: String,
}

impl IngredientEntry {
    pub fn new(name: &str, quantity: &str) -> Self {
        Self {
            name: name.to_string(),
            quantity: quantity.to_string(),
        }
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => text,
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    })
}

/// Frozen copy of an externally sourced recipe, stored on a meal item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalSnapshot {
    pub provider: String,
    pub external_id: String,
    pub title: String,
    pub image: Option<String>,
    pub ingredients: Vec<IngredientEntry>,
}

impl ExternalSnapshot {
    /// Serialized ingredient list as stored in `meal_items.ingredients_json`
    pub fn ingredients_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.ingredients)
    }
}

/// One consolidated line of a plan's shopping list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ShoppingItem {
    pub id: i64,
    pub meal_plan_id: i64,
    pub name: String,
    pub quantity: String,
    pub checked: bool,
}

/// A consolidated shopping line that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingDraft {
    pub name: String,
    pub quantity: String,
}
