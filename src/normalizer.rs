//! # Name Normalizer
//!
//! Turns raw ingredient text into the display name shown on a shopping list
//! and the key used to decide whether two lines are the same ingredient.

use lazy_static::lazy_static;
use regex::Regex;

// A single leading list marker: hyphen, asterisk or bullet glyph
const BULLET_PATTERN: &str = r"^[-*•]\s*";
const WHITESPACE_RUN_PATTERN: &str = r"\s+";

lazy_static! {
    static ref BULLET_REGEX: Regex =
        Regex::new(BULLET_PATTERN).expect("Bullet pattern should be valid");
    static ref WHITESPACE_RUN_REGEX: Regex =
        Regex::new(WHITESPACE_RUN_PATTERN).expect("Whitespace pattern should be valid");
}

/// Clean a raw ingredient line into its display form
///
/// Trims the text, strips one leading bullet marker (`-`, `*` or `•`, with
/// any whitespace after it), then collapses whitespace runs to single spaces.
///
/// # Examples
///
/// ```rust
/// use meal_planner::normalizer::clean_name;
///
/// assert_eq!(clean_name("  - Olive   oil "), "Olive oil");
/// assert_eq!(clean_name("* salt"), "salt");
/// ```
pub fn clean_name(raw: &str) -> String {
    let trimmed = raw.trim();
    let unbulleted = BULLET_REGEX.replace(trimmed, "");
    WHITESPACE_RUN_REGEX.replace_all(&unbulleted, " ").into_owned()
}

/// Aggregation key for a raw ingredient line
///
/// Two lines consolidate into one shopping entry exactly when their keys are
/// equal. There is no fuzzy matching and no plural folding.
pub fn aggregation_key(raw: &str) -> String {
    clean_name(raw).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bullet_stripping() {
        assert_eq!(clean_name("- Olive oil"), "Olive oil");
        assert_eq!(aggregation_key("- Olive oil"), "olive oil");
        assert_eq!(clean_name("* Butter"), "Butter");
        assert_eq!(clean_name("• Garlic"), "Garlic");
        assert_eq!(clean_name("-Lemons"), "Lemons");
    }

    #[test]
    fn test_only_one_leading_bullet_is_stripped() {
        assert_eq!(clean_name("- - capers"), "- capers");
        assert_eq!(clean_name("salt - coarse"), "salt - coarse");
    }

    #[test]
    fn test_whitespace_collapse() {
        assert_eq!(clean_name("  red \t bell\npepper  "), "red bell pepper");
        assert_eq!(clean_name("-\t  chili   flakes"), "chili flakes");
    }

    #[test]
    fn test_blank_input() {
        assert_eq!(clean_name(""), "");
        assert_eq!(clean_name("   "), "");
        assert_eq!(clean_name(" - "), "");
    }

    #[test]
    fn test_display_keeps_case_key_does_not() {
        assert_eq!(clean_name("Tomato"), "Tomato");
        assert_eq!(aggregation_key("Tomato"), aggregation_key("  tomato"));
        assert_ne!(aggregation_key("tomato"), aggregation_key("tomatoes"));
    }
}
