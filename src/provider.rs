//! # Recipe Provider Module
//!
//! Client for the external recipe search API (Spoonacular). Results are
//! reduced to the fields the planner stores: a search summary per recipe, and
//! for details the title, image, `{name, quantity}` ingredient lines and
//! plain-text instructions.
//!
//! The client is configured explicitly through [`ProviderConfig`]; it never
//! reads the environment. Transient failures are retried with exponential
//! backoff and jitter, behind a [`CircuitBreaker`].

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use log::{debug, error, info, warn};
use rand::Rng;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;
use std::time::Duration;

use crate::circuit_breaker::CircuitBreaker;
use crate::config::{ProviderConfig, RecoveryConfig};
use crate::db;
use crate::errors::ProviderError;
use crate::models::{ExternalSnapshot, IngredientEntry};

pub const PROVIDER_NAME: &str = "spoonacular";

lazy_static! {
    static ref HTML_TAG_REGEX: Regex =
        Regex::new(r"<[^>]+>").expect("HTML tag pattern should be valid");
}

/// One search hit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeSummary {
    pub provider: String,
    pub external_id: String,
    pub title: Option<String>,
    pub image: Option<String>,
}

/// A page of search results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPage {
    pub items: Vec<RecipeSummary>,
    pub total: u64,
}

/// Full recipe as returned by the provider, reduced to what the planner uses
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeDetail {
    pub title: String,
    pub image: Option<String>,
    pub ingredients: Vec<IngredientEntry>,
    pub instructions: String,
    pub source_url: Option<String>,
}

impl RecipeDetail {
    /// Freeze this recipe into the snapshot stored on a meal item
    pub fn into_snapshot(self, external_id: &str) -> ExternalSnapshot {
        ExternalSnapshot {
            provider: PROVIDER_NAME.to_string(),
            external_id: external_id.to_string(),
            title: self.title,
            image: self.image,
            ingredients: self.ingredients,
        }
    }
}

/// Remove HTML tags from provider text
pub fn strip_html(text: &str) -> String {
    HTML_TAG_REGEX.replace_all(text, "").into_owned()
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

/// First of `keys` holding a non-empty string
fn first_non_empty<'a>(value: &'a Value, keys: &[&str]) -> &'a str {
    keys.iter()
        .filter_map(|key| str_field(value, key))
        .find(|text| !text.is_empty())
        .unwrap_or("")
}

/// Parse a `/recipes/complexSearch` response
pub fn parse_search_response(data: &Value) -> SearchPage {
    let items: Vec<RecipeSummary> = data
        .get("results")
        .and_then(Value::as_array)
        .map(|results| {
            results
                .iter()
                .filter_map(|hit| {
                    let external_id = match hit.get("id")? {
                        Value::Number(id) => id.to_string(),
                        Value::String(id) => id.clone(),
                        _ => return None,
                    };
                    Some(RecipeSummary {
                        provider: PROVIDER_NAME.to_string(),
                        external_id,
                        title: str_field(hit, "title").map(String::from),
                        image: str_field(hit, "image").map(String::from),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let total = data
        .get("totalResults")
        .and_then(Value::as_u64)
        .unwrap_or(0);

    SearchPage { items, total }
}

/// Parse a `/recipes/{id}/information` response
///
/// Each extended ingredient becomes `{name: originalName | name, quantity:
/// original}`; lines with neither are dropped and a missing name falls back
/// to the quantity text. Instructions come from the HTML `instructions`
/// field, or else from the analyzed step list.
pub fn parse_recipe_detail(data: &Value) -> RecipeDetail {
    let ingredients: Vec<IngredientEntry> = data
        .get("extendedIngredients")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(|ingredient| {
                    let name = first_non_empty(ingredient, &["originalName", "name"]).trim();
                    let quantity = str_field(ingredient, "original").unwrap_or("").trim();
                    if name.is_empty() && quantity.is_empty() {
                        return None;
                    }
                    let name = if name.is_empty() { quantity } else { name };
                    Some(IngredientEntry::new(name, quantity))
                })
                .collect()
        })
        .unwrap_or_default();

    let mut instructions = strip_html(str_field(data, "instructions").unwrap_or(""));
    if instructions.is_empty() {
        if let Some(blocks) = data.get("analyzedInstructions").and_then(Value::as_array) {
            let steps: Vec<&str> = blocks
                .iter()
                .filter_map(|block| block.get("steps").and_then(Value::as_array))
                .flatten()
                .filter_map(|step| str_field(step, "step"))
                .filter(|step| !step.is_empty())
                .collect();
            instructions = steps.join("\n\n");
        }
    }

    RecipeDetail {
        title: str_field(data, "title").unwrap_or("").to_string(),
        image: str_field(data, "image").map(String::from),
        ingredients,
        instructions,
        source_url: str_field(data, "sourceUrl").map(String::from),
    }
}

/// Delay before retry number `attempt` (starting at 1)
///
/// Exponential in the attempt number, capped at `max_retry_delay_ms`, plus up
/// to 50% random jitter.
pub fn retry_delay(recovery: &RecoveryConfig, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16);
    let base = recovery
        .base_retry_delay_ms
        .saturating_mul(1u64 << exponent)
        .min(recovery.max_retry_delay_ms);
    let jitter = if base > 0 {
        rand::thread_rng().gen_range(0..=base / 2)
    } else {
        0
    };
    Duration::from_millis(base.saturating_add(jitter))
}

/// HTTP client for the recipe provider
pub struct RecipeProviderClient {
    http: reqwest::Client,
    config: ProviderConfig,
    breaker: CircuitBreaker,
}

impl RecipeProviderClient {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        let breaker = CircuitBreaker::new(config.recovery.clone());

        Ok(Self {
            http,
            config,
            breaker,
        })
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.config
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingApiKey)
    }

    /// Search recipes by free-text query
    pub async fn search_recipes(
        &self,
        query: &str,
        offset: u32,
        number: u32,
    ) -> Result<SearchPage, ProviderError> {
        let api_key = self.api_key()?;
        info!("Searching provider recipes for '{query}' (offset {offset}, number {number})");

        let params = [
            ("apiKey", api_key.to_string()),
            ("query", query.to_string()),
            ("offset", offset.to_string()),
            ("number", number.to_string()),
            ("addRecipeInformation", "true".to_string()),
        ];
        let data = self
            .get_json(
                "/recipes/complexSearch",
                &params,
                Duration::from_secs(self.config.search_timeout_secs),
            )
            .await?;

        let page = parse_search_response(&data);
        debug!("Search returned {} of {} results", page.items.len(), page.total);
        Ok(page)
    }

    /// Fetch one recipe's details
    pub async fn get_recipe_detail(&self, external_id: &str) -> Result<RecipeDetail, ProviderError> {
        let api_key = self.api_key()?;
        info!("Fetching provider recipe {external_id}");

        let params = [
            ("apiKey", api_key.to_string()),
            ("includeNutrition", "false".to_string()),
        ];
        let data = self
            .get_json(
                &format!("/recipes/{external_id}/information"),
                &params,
                Duration::from_secs(self.config.detail_timeout_secs),
            )
            .await?;

        let detail = parse_recipe_detail(&data);
        debug!(
            "Recipe {} '{}' has {} ingredients",
            external_id,
            detail.title,
            detail.ingredients.len()
        );
        Ok(detail)
    }

    async fn get_json(
        &self,
        path: &str,
        params: &[(&str, String)],
        timeout: Duration,
    ) -> Result<Value, ProviderError> {
        if self.breaker.is_open() {
            error!("Circuit open, refusing provider call to {path}");
            return Err(ProviderError::CircuitOpen);
        }

        let recovery = &self.config.recovery;
        let mut attempt = 0;
        loop {
            match self.send_once(path, params, timeout).await {
                Ok(data) => {
                    self.breaker.record_success();
                    return Ok(data);
                }
                Err(e) if e.is_retryable() => {
                    self.breaker.record_failure();
                    if attempt >= recovery.max_retries || self.breaker.is_open() {
                        error!("Provider call to {path} failed after {} attempts: {e}", attempt + 1);
                        return Err(e);
                    }
                    attempt += 1;
                    let delay = retry_delay(recovery, attempt);
                    warn!(
                        "Provider call to {path} failed ({e}), retry {attempt}/{} in {:?}",
                        recovery.max_retries, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_once(
        &self,
        path: &str,
        params: &[(&str, String)],
        timeout: Duration,
    ) -> Result<Value, ProviderError> {
        let url = format!("{}{}", self.config.base_url, path);
        let response = self
            .http
            .get(&url)
            .query(params)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::upstream(status.as_u16(), &body));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

/// Fetch an external recipe and plan it into a meal plan as a snapshot
pub async fn add_provider_recipe(
    pool: &PgPool,
    client: &RecipeProviderClient,
    user_id: i64,
    meal_plan_id: i64,
    day: &str,
    meal_type: &str,
    external_id: &str,
) -> Result<i64> {
    db::get_meal_plan(pool, user_id, meal_plan_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Meal plan {meal_plan_id} not found"))?;

    let detail = client
        .get_recipe_detail(external_id)
        .await
        .with_context(|| format!("Failed to fetch provider recipe {external_id}"))?;

    let snapshot = detail.into_snapshot(external_id);
    db::add_external_meal_item(pool, meal_plan_id, day, meal_type, &snapshot).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_html() {
        assert_eq!(strip_html("<ol><li>Boil water</li></ol>"), "Boil water");
        assert_eq!(strip_html("no tags"), "no tags");
    }

    #[test]
    fn test_retry_delay_grows_and_caps() {
        let recovery = RecoveryConfig {
            base_retry_delay_ms: 100,
            max_retry_delay_ms: 300,
            ..RecoveryConfig::default()
        };

        let first = retry_delay(&recovery, 1);
        assert!(first >= Duration::from_millis(100) && first <= Duration::from_millis(150));

        let capped = retry_delay(&recovery, 10);
        assert!(capped >= Duration::from_millis(300) && capped <= Duration::from_millis(450));
    }

    #[test]
    fn test_zero_delay_config() {
        let recovery = RecoveryConfig {
            base_retry_delay_ms: 0,
            ..RecoveryConfig::default()
        };
        assert_eq!(retry_delay(&recovery, 3), Duration::ZERO);
    }

    #[test]
    fn test_retry_delay_saturates_on_huge_config() {
        let recovery = RecoveryConfig {
            base_retry_delay_ms: u64::MAX,
            max_retry_delay_ms: u64::MAX,
            ..RecoveryConfig::default()
        };
        assert_eq!(retry_delay(&recovery, 1), Duration::from_millis(u64::MAX));
        assert_eq!(retry_delay(&recovery, 20), Duration::from_millis(u64::MAX));
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_io() {
        let client = RecipeProviderClient::new(ProviderConfig::new(None)).unwrap();

        assert_eq!(
            client.get_recipe_detail("1").await,
            Err(ProviderError::MissingApiKey)
        );
        assert_eq!(
            client.search_recipes("soup", 0, 10).await,
            Err(ProviderError::MissingApiKey)
        );
    }

    #[test]
    fn test_detail_into_snapshot() {
        let detail = parse_recipe_detail(&json!({
            "title": "Pesto",
            "extendedIngredients": [{"originalName": "basil", "original": "2 cups basil"}]
        }));
        let snapshot = detail.into_snapshot("99");

        assert_eq!(snapshot.provider, "spoonacular");
        assert_eq!(snapshot.external_id, "99");
        assert_eq!(snapshot.title, "Pesto");
        assert_eq!(
            snapshot.ingredients,
            vec![IngredientEntry::new("basil", "2 cups basil")]
        );
    }
}
