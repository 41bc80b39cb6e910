use anyhow::{bail, Context, Result};
use log::{error, info};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::env;

use meal_planner::config::AppConfig;
use meal_planner::db;
use meal_planner::provider::{add_provider_recipe, RecipeProviderClient};
use meal_planner::shopping_list::regenerate_shopping_list;

const USAGE: &str = "usage:
  meal-planner regenerate <user_id> <meal_plan_id>
  meal-planner search <query>
  meal-planner add-external <user_id> <meal_plan_id> <day> <meal_type> <external_id>";

fn parse_id(value: &str, what: &str) -> Result<i64> {
    value
        .parse()
        .with_context(|| format!("Invalid {what}: '{value}'"))
}

async fn connect(config: &AppConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(config.database_url()?)
        .await
        .context("Failed to connect to database")?;
    db::init_database_schema(&pool).await?;
    Ok(pool)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    info!("Starting meal planner");

    let args: Vec<String> = env::args().skip(1).collect();
    let config = AppConfig::from_env();

    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["regenerate", user_id, meal_plan_id] => {
            let user_id = parse_id(user_id, "user id")?;
            let meal_plan_id = parse_id(meal_plan_id, "meal plan id")?;
            let pool = connect(&config).await?;

            match regenerate_shopping_list(&pool, user_id, meal_plan_id).await {
                Ok(items) => println!("{}", serde_json::to_string_pretty(&items)?),
                Err(e) => {
                    error!("Failed to generate shopping list: {e}");
                    bail!(e);
                }
            }
        }
        ["search", query @ ..] if !query.is_empty() => {
            let client = RecipeProviderClient::new(config.provider)?;
            let page = client.search_recipes(&query.join(" "), 0, 10).await?;
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
        ["add-external", user_id, meal_plan_id, day, meal_type, external_id] => {
            let user_id = parse_id(user_id, "user id")?;
            let meal_plan_id = parse_id(meal_plan_id, "meal plan id")?;
            let pool = connect(&config).await?;
            let client = RecipeProviderClient::new(config.provider)?;

            let item_id = add_provider_recipe(
                &pool,
                &client,
                user_id,
                meal_plan_id,
                day,
                meal_type,
                external_id,
            )
            .await?;
            println!("Added meal item {item_id}");
        }
        _ => bail!(USAGE),
    }

    Ok(())
}
