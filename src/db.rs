//! # Database Module
//!
//! PostgreSQL persistence for recipes, meal plans, meal items and shopping
//! items. Every function takes the shared `PgPool`; owner-scoped lookups take
//! the user id so one user can never read or change another user's rows.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::info;
use sqlx::PgPool;

use crate::models::{
    ExternalSnapshot, MealItem, MealPlan, NewRecipe, Recipe, RecipeUpdate, ShoppingDraft,
    ShoppingItem,
};
use crate::shopping_list::MealPlanStore;

const MEAL_ITEM_COLUMNS: &str = "mi.id, mi.meal_plan_id, mi.recipe_id, mi.day, mi.meal_type,
    mi.provider, mi.external_id, mi.title, mi.image, mi.ingredients_json,
    r.ingredients AS recipe_ingredients";

/// Initialize the database schema
pub async fn init_database_schema(pool: &PgPool) -> Result<()> {
    info!("Initializing database schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS recipes (
            id BIGSERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL,
            title VARCHAR(200) NOT NULL,
            ingredients TEXT NOT NULL,
            steps TEXT
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create recipes table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS meal_plans (
            id BIGSERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL,
            week_start DATE NOT NULL
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create meal_plans table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS meal_items (
            id BIGSERIAL PRIMARY KEY,
            meal_plan_id BIGINT NOT NULL REFERENCES meal_plans(id) ON DELETE CASCADE,
            recipe_id BIGINT REFERENCES recipes(id) ON DELETE SET NULL,
            day VARCHAR(10) NOT NULL,
            meal_type VARCHAR(20) NOT NULL,
            provider VARCHAR(50),
            external_id VARCHAR(64),
            title VARCHAR(255),
            image TEXT,
            ingredients_json TEXT
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create meal_items table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS shopping_items (
            id BIGSERIAL PRIMARY KEY,
            meal_plan_id BIGINT NOT NULL REFERENCES meal_plans(id) ON DELETE CASCADE,
            name VARCHAR(255) NOT NULL,
            quantity VARCHAR(255) NOT NULL DEFAULT '',
            checked BOOLEAN NOT NULL DEFAULT FALSE
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create shopping_items table")?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_meal_items_plan ON meal_items(meal_plan_id)",
    )
    .execute(pool)
    .await
    .context("Failed to create meal_items index")?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_shopping_items_plan ON shopping_items(meal_plan_id)",
    )
    .execute(pool)
    .await
    .context("Failed to create shopping_items index")?;

    info!("Database schema initialized successfully");
    Ok(())
}

// ---------------------------------------------------------------------------
// Recipes
// ---------------------------------------------------------------------------

/// Create a recipe owned by `user_id`
pub async fn create_recipe(pool: &PgPool, user_id: i64, recipe: &NewRecipe) -> Result<Recipe> {
    info!("Creating recipe for user_id: {}", user_id);

    let recipe = sqlx::query_as::<_, Recipe>(
        "INSERT INTO recipes (user_id, title, ingredients, steps)
         VALUES ($1, $2, $3, $4)
         RETURNING id, user_id, title, ingredients, steps",
    )
    .bind(user_id)
    .bind(recipe.title_or_default())
    .bind(recipe.ingredients_or_default())
    .bind(recipe.steps.as_deref())
    .fetch_one(pool)
    .await
    .context("Failed to insert recipe")?;

    info!("Recipe created with ID: {}", recipe.id);
    Ok(recipe)
}

/// Read a recipe by id, if it belongs to `user_id`
pub async fn get_recipe(pool: &PgPool, user_id: i64, recipe_id: i64) -> Result<Option<Recipe>> {
    sqlx::query_as::<_, Recipe>(
        "SELECT id, user_id, title, ingredients, steps FROM recipes WHERE id = $1 AND user_id = $2",
    )
    .bind(recipe_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("Failed to read recipe")
}

/// All recipes of a user, newest first
pub async fn list_recipes(pool: &PgPool, user_id: i64) -> Result<Vec<Recipe>> {
    sqlx::query_as::<_, Recipe>(
        "SELECT id, user_id, title, ingredients, steps FROM recipes
         WHERE user_id = $1 ORDER BY id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("Failed to list recipes")
}

/// Apply a partial update; returns `None` if the recipe does not exist for this user
pub async fn update_recipe(
    pool: &PgPool,
    user_id: i64,
    recipe_id: i64,
    update: &RecipeUpdate,
) -> Result<Option<Recipe>> {
    info!("Updating recipe with ID: {}", recipe_id);

    let recipe = sqlx::query_as::<_, Recipe>(
        "UPDATE recipes SET
             title = COALESCE($3, title),
             ingredients = COALESCE($4, ingredients),
             steps = COALESCE($5, steps)
         WHERE id = $1 AND user_id = $2
         RETURNING id, user_id, title, ingredients, steps",
    )
    .bind(recipe_id)
    .bind(user_id)
    .bind(update.title.as_deref())
    .bind(update.ingredients.as_deref())
    .bind(update.steps.as_deref())
    .fetch_optional(pool)
    .await
    .context("Failed to update recipe")?;

    if recipe.is_none() {
        info!("No recipe found with ID: {}", recipe_id);
    }
    Ok(recipe)
}

// ---------------------------------------------------------------------------
// Meal plans
// ---------------------------------------------------------------------------

/// Create an empty meal plan for the week starting at `week_start`
pub async fn create_meal_plan(pool: &PgPool, user_id: i64, week_start: NaiveDate) -> Result<MealPlan> {
    info!("Creating meal plan for user_id: {} (week of {})", user_id, week_start);

    sqlx::query_as::<_, MealPlan>(
        "INSERT INTO meal_plans (user_id, week_start) VALUES ($1, $2)
         RETURNING id, user_id, week_start",
    )
    .bind(user_id)
    .bind(week_start)
    .fetch_one(pool)
    .await
    .context("Failed to insert meal plan")
}

/// Read a meal plan, if it belongs to `user_id`
pub async fn get_meal_plan(pool: &PgPool, user_id: i64, meal_plan_id: i64) -> Result<Option<MealPlan>> {
    sqlx::query_as::<_, MealPlan>(
        "SELECT id, user_id, week_start FROM meal_plans WHERE id = $1 AND user_id = $2",
    )
    .bind(meal_plan_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("Failed to read meal plan")
}

/// All meal plans of a user, most recent week first
pub async fn list_meal_plans(pool: &PgPool, user_id: i64) -> Result<Vec<MealPlan>> {
    sqlx::query_as::<_, MealPlan>(
        "SELECT id, user_id, week_start FROM meal_plans
         WHERE user_id = $1 ORDER BY week_start DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("Failed to list meal plans")
}

/// Delete a meal plan together with its meal items and shopping items
pub async fn delete_meal_plan(pool: &PgPool, user_id: i64, meal_plan_id: i64) -> Result<bool> {
    info!("Deleting meal plan with ID: {}", meal_plan_id);

    let rows_affected = sqlx::query("DELETE FROM meal_plans WHERE id = $1 AND user_id = $2")
        .bind(meal_plan_id)
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to delete meal plan")?
        .rows_affected();

    if rows_affected > 0 {
        info!("Meal plan deleted successfully with ID: {}", meal_plan_id);
        Ok(true)
    } else {
        info!("No meal plan found with ID: {}", meal_plan_id);
        Ok(false)
    }
}

// ---------------------------------------------------------------------------
// Meal items
// ---------------------------------------------------------------------------

/// Plan a local recipe into a meal plan
pub async fn add_recipe_meal_item(
    pool: &PgPool,
    meal_plan_id: i64,
    recipe_id: i64,
    day: &str,
    meal_type: &str,
) -> Result<i64> {
    info!("Adding recipe {} to meal plan {} ({} {})", recipe_id, meal_plan_id, day, meal_type);

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO meal_items (meal_plan_id, recipe_id, day, meal_type)
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(meal_plan_id)
    .bind(recipe_id)
    .bind(day)
    .bind(meal_type)
    .fetch_one(pool)
    .await
    .context("Failed to insert recipe meal item")?;

    Ok(id)
}

/// Plan an external recipe into a meal plan, storing its snapshot
pub async fn add_external_meal_item(
    pool: &PgPool,
    meal_plan_id: i64,
    day: &str,
    meal_type: &str,
    snapshot: &ExternalSnapshot,
) -> Result<i64> {
    info!(
        "Adding {} recipe {} to meal plan {} ({} {})",
        snapshot.provider, snapshot.external_id, meal_plan_id, day, meal_type
    );

    let ingredients_json = snapshot
        .ingredients_json()
        .context("Failed to serialize ingredient snapshot")?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO meal_items
             (meal_plan_id, day, meal_type, provider, external_id, title, image, ingredients_json)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING id",
    )
    .bind(meal_plan_id)
    .bind(day)
    .bind(meal_type)
    .bind(&snapshot.provider)
    .bind(&snapshot.external_id)
    .bind(&snapshot.title)
    .bind(snapshot.image.as_deref())
    .bind(ingredients_json)
    .fetch_one(pool)
    .await
    .context("Failed to insert external meal item")?;

    Ok(id)
}

/// Meal items of a plan in insertion order, with local recipe text joined in
pub async fn list_meal_items(pool: &PgPool, meal_plan_id: i64) -> Result<Vec<MealItem>> {
    let sql = format!(
        "SELECT {MEAL_ITEM_COLUMNS}
         FROM meal_items mi LEFT JOIN recipes r ON r.id = mi.recipe_id
         WHERE mi.meal_plan_id = $1 ORDER BY mi.id"
    );

    sqlx::query_as::<_, MealItem>(&sql)
        .bind(meal_plan_id)
        .fetch_all(pool)
        .await
        .context("Failed to list meal items")
}

// ---------------------------------------------------------------------------
// Shopping items
// ---------------------------------------------------------------------------

/// Current shopping list of a plan, in stored order
pub async fn list_shopping_items(pool: &PgPool, meal_plan_id: i64) -> Result<Vec<ShoppingItem>> {
    sqlx::query_as::<_, ShoppingItem>(
        "SELECT id, meal_plan_id, name, quantity, checked FROM shopping_items
         WHERE meal_plan_id = $1 ORDER BY id",
    )
    .bind(meal_plan_id)
    .fetch_all(pool)
    .await
    .context("Failed to list shopping items")
}

/// Tick or untick a shopping item; returns `None` if the user does not own it
pub async fn set_shopping_item_checked(
    pool: &PgPool,
    user_id: i64,
    shopping_item_id: i64,
    checked: bool,
) -> Result<Option<ShoppingItem>> {
    info!("Setting shopping item {} checked={}", shopping_item_id, checked);

    sqlx::query_as::<_, ShoppingItem>(
        "UPDATE shopping_items si SET checked = $3
         FROM meal_plans mp
         WHERE si.id = $1 AND si.meal_plan_id = mp.id AND mp.user_id = $2
         RETURNING si.id, si.meal_plan_id, si.name, si.quantity, si.checked",
    )
    .bind(shopping_item_id)
    .bind(user_id)
    .bind(checked)
    .fetch_optional(pool)
    .await
    .context("Failed to update shopping item")
}

/// Replace a plan's shopping items inside one transaction
///
/// Dropping the transaction on any error rolls back the delete, so readers
/// never observe a half-replaced list.
pub async fn replace_shopping_items(
    pool: &PgPool,
    meal_plan_id: i64,
    drafts: &[ShoppingDraft],
) -> Result<Vec<ShoppingItem>> {
    info!(
        "Replacing shopping items for meal plan {} with {} items",
        meal_plan_id,
        drafts.len()
    );

    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let removed = sqlx::query("DELETE FROM shopping_items WHERE meal_plan_id = $1")
        .bind(meal_plan_id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete previous shopping items")?
        .rows_affected();

    let mut stored = Vec::with_capacity(drafts.len());
    for draft in drafts {
        let item = sqlx::query_as::<_, ShoppingItem>(
            "INSERT INTO shopping_items (meal_plan_id, name, quantity, checked)
             VALUES ($1, $2, $3, FALSE)
             RETURNING id, meal_plan_id, name, quantity, checked",
        )
        .bind(meal_plan_id)
        .bind(&draft.name)
        .bind(&draft.quantity)
        .fetch_one(&mut *tx)
        .await
        .with_context(|| format!("Failed to insert shopping item '{}'", draft.name))?;
        stored.push(item);
    }

    tx.commit().await.context("Failed to commit shopping list")?;

    info!(
        "Shopping list for meal plan {} replaced ({} removed, {} inserted)",
        meal_plan_id,
        removed,
        stored.len()
    );
    Ok(stored)
}

impl MealPlanStore for PgPool {
    async fn find_meal_plan(&self, user_id: i64, meal_plan_id: i64) -> Result<Option<MealPlan>> {
        get_meal_plan(self, user_id, meal_plan_id).await
    }

    async fn load_meal_items(&self, meal_plan_id: i64) -> Result<Vec<MealItem>> {
        list_meal_items(self, meal_plan_id).await
    }

    async fn replace_shopping_items(
        &self,
        meal_plan_id: i64,
        drafts: &[ShoppingDraft],
    ) -> Result<Vec<ShoppingItem>> {
        replace_shopping_items(self, meal_plan_id, drafts).await
    }
}
