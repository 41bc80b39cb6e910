//! # Error Types Module
//!
//! Domain error types for shopping list generation and the external
//! recipe provider. Infrastructure code returns `anyhow::Result`; these
//! types are what callers match on.

/// Failures of a shopping list regeneration
#[derive(Debug, Clone, PartialEq)]
pub enum ShoppingError {
    /// No meal plan with this id belongs to the requesting user
    MealPlanNotFound(i64),
    /// Loading the plan or replacing its shopping items failed; the
    /// previously stored list is left untouched
    Persistence(String),
}

impl std::fmt::Display for ShoppingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShoppingError::MealPlanNotFound(id) => write!(f, "Meal plan {id} not found"),
            ShoppingError::Persistence(msg) => write!(f, "Persistence error: {msg}"),
        }
    }
}

impl std::error::Error for ShoppingError {}

impl From<anyhow::Error> for ShoppingError {
    fn from(err: anyhow::Error) -> Self {
        ShoppingError::Persistence(format!("{err:#}"))
    }
}

/// Maximum number of characters of an upstream response body kept in errors
pub const UPSTREAM_BODY_LIMIT: usize = 300;

/// Failures of the recipe provider client
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// No API key configured
    MissingApiKey,
    /// Upstream answered with a non-success status
    Upstream { status: u16, body: String },
    /// Request could not be sent or the response not read
    Transport(String),
    /// Response body was not the expected JSON
    Decode(String),
    /// Too many recent failures; calls fail fast until the breaker resets
    CircuitOpen,
}

impl ProviderError {
    /// Build an upstream error, keeping only the start of the body
    pub fn upstream(status: u16, body: &str) -> Self {
        ProviderError::Upstream {
            status,
            body: body.chars().take(UPSTREAM_BODY_LIMIT).collect(),
        }
    }

    /// Whether retrying the same request may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Transport(_) => true,
            ProviderError::Upstream { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderError::MissingApiKey => write!(
                f,
                "Spoonacular API key not set. Define SPOONACULAR_KEY or SPOONACULAR_API_KEY in the server environment."
            ),
            ProviderError::Upstream { status, body } => write!(f, "Upstream {status}: {body}"),
            ProviderError::Transport(msg) => write!(f, "Transport error: {msg}"),
            ProviderError::Decode(msg) => write!(f, "Decode error: {msg}"),
            ProviderError::CircuitOpen => {
                write!(f, "Recipe provider temporarily unavailable (circuit open)")
            }
        }
    }
}

impl std::error::Error for ProviderError {}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::Decode(err.to_string())
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_body_is_truncated() {
        let err = ProviderError::upstream(502, &"x".repeat(1000));
        match err {
            ProviderError::Upstream { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body.len(), UPSTREAM_BODY_LIMIT);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_retryable_errors() {
        assert!(ProviderError::Transport("reset".into()).is_retryable());
        assert!(ProviderError::upstream(503, "").is_retryable());
        assert!(ProviderError::upstream(429, "").is_retryable());
        assert!(!ProviderError::upstream(404, "").is_retryable());
        assert!(!ProviderError::MissingApiKey.is_retryable());
        assert!(!ProviderError::CircuitOpen.is_retryable());
    }

    #[test]
    fn test_shopping_error_from_anyhow() {
        let err: ShoppingError = anyhow::anyhow!("connection refused").into();
        assert_eq!(
            err,
            ShoppingError::Persistence("connection refused".to_string())
        );
        assert_eq!(err.to_string(), "Persistence error: connection refused");
    }
}
