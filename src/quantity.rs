//! # Quantity Merger
//!
//! Quantities are opaque display strings. When the same ingredient shows up
//! more than once, quantities are joined with `" + "` in encounter order.
//! No unit conversion happens here: "2 cups" and "3 tbsp" become
//! "2 cups + 3 tbsp".

use log::trace;

/// Maximum length (in characters) of a stored shopping item name or quantity
pub const MAX_FIELD_CHARS: usize = 255;

const QUANTITY_SEPARATOR: &str = " + ";

/// Truncate `value` to at most [`MAX_FIELD_CHARS`] characters
pub fn clip_field(value: &str) -> String {
    value.chars().take(MAX_FIELD_CHARS).collect()
}

/// Trim an incoming quantity, dropping it entirely if it is a serving count
///
/// "2 servings" says nothing about how much to buy, so it becomes "".
pub fn filter_serving_quantity(quantity: &str) -> String {
    let trimmed = quantity.trim();
    if trimmed.to_lowercase().contains("serving") {
        trace!("Dropping serving quantity '{trimmed}'");
        return String::new();
    }
    trimmed.to_string()
}

/// Merge `incoming` into `existing`
///
/// An empty (or serving-only) incoming quantity leaves `existing` unchanged.
/// Otherwise the result is `existing + " + " + incoming` with any leading or
/// trailing spaces and plus signs removed, clipped to [`MAX_FIELD_CHARS`].
///
/// # Examples
///
/// ```rust
/// use meal_planner::quantity::merge_quantities;
///
/// assert_eq!(merge_quantities("2", "3"), "2 + 3");
/// assert_eq!(merge_quantities("", "1 cup"), "1 cup");
/// assert_eq!(merge_quantities("", "2 servings"), "");
/// ```
pub fn merge_quantities(existing: &str, incoming: &str) -> String {
    let incoming = filter_serving_quantity(incoming);
    if incoming.is_empty() {
        return existing.to_string();
    }

    let joined = format!("{existing}{QUANTITY_SEPARATOR}{incoming}");
    let merged = joined.trim_matches(|c: char| c == ' ' || c == '+');
    clip_field(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_merge() {
        assert_eq!(merge_quantities("2", "3"), "2 + 3");
        assert_eq!(merge_quantities("2 + 3", "1"), "2 + 3 + 1");
    }

    #[test]
    fn test_merge_into_empty_existing() {
        assert_eq!(merge_quantities("", "1 cup"), "1 cup");
    }

    #[test]
    fn test_empty_incoming_keeps_existing() {
        assert_eq!(merge_quantities("2 cups", ""), "2 cups");
        assert_eq!(merge_quantities("2 cups", "   "), "2 cups");
        assert_eq!(merge_quantities("", ""), "");
    }

    #[test]
    fn test_serving_suppression() {
        assert_eq!(merge_quantities("", "2 servings"), "");
        assert_eq!(merge_quantities("1 lb", "4 Servings"), "1 lb");
        assert_eq!(filter_serving_quantity(" 1 serving "), "");
        assert_eq!(filter_serving_quantity(" 1 cup "), "1 cup");
    }

    #[test]
    fn test_units_are_not_converted() {
        assert_eq!(merge_quantities("2 cups", "3 tbsp"), "2 cups + 3 tbsp");
    }

    #[test]
    fn test_plus_signs_at_edges_are_stripped() {
        assert_eq!(merge_quantities("+", "2"), "2");
        assert_eq!(merge_quantities("1", "+2+"), "1 + +2");
    }

    #[test]
    fn test_merge_is_clipped() {
        let existing = "9".repeat(250);
        let merged = merge_quantities(&existing, "12345");
        assert_eq!(merged.chars().count(), MAX_FIELD_CHARS);
        assert!(merged.ends_with(" + 12"));
    }

    #[test]
    fn test_clip_field() {
        let long = "x".repeat(300);
        assert_eq!(clip_field(&long).chars().count(), 255);
        assert_eq!(clip_field("short"), "short");
        assert_eq!(clip_field(&"ß".repeat(300)).chars().count(), 255);
    }
}
