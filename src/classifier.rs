//! # Ingredient Classifier
//!
//! Decides whether a candidate line is a real ingredient name or a cooking
//! step that slipped into an ingredient list. This is a heuristic filter:
//! it rejects anything that looks like a sentence or mentions cooking
//! actions, equipment, or timing.

use log::trace;

/// Names longer than this (in characters) are treated as sentences
pub const MAX_INGREDIENT_NAME_CHARS: usize = 120;

/// Substrings that mark a line as an instruction rather than an ingredient.
///
/// Matching is case-insensitive containment, so "Preheat" and "PREHEATED"
/// both hit `preheat`.
pub const INSTRUCTION_VOCABULARY: &[&str] = &[
    "preheat",
    "bake",
    "mix",
    "stir",
    "combine",
    "roll",
    "cut",
    "arrange",
    "place",
    "serve",
    "cool",
    "heat",
    "cook",
    "simmer",
    "bring",
    "whisk",
    "beat",
    "drain",
    "transfer",
    "cover",
    "uncover",
    "reduce",
    "increase",
    "fold",
    "sprinkle",
    "spoon",
    "pour",
    "garnish",
    "press",
    "set aside",
    "until",
    "degree",
    "oven",
    "minutes",
    "pan",
    "skillet",
    "bowl",
    "sheet",
    "line",
    "grease",
    "divide",
];

/// Serving labels that are never shopping items on their own
const SERVING_LABELS: &[&str] = &["serving", "servings"];

/// Returns the first vocabulary entry contained in `text`, if any
pub fn matching_instruction_term(text: &str) -> Option<&'static str> {
    let lowered = text.to_lowercase();
    INSTRUCTION_VOCABULARY
        .iter()
        .copied()
        .find(|term| lowered.contains(term))
}

/// Check whether `text` reads like a cooking instruction (or is otherwise noise)
///
/// `text` is expected to be whitespace-normalized already, e.g. the output of
/// [`crate::normalizer::clean_name`]. Returns `true` when the line must be
/// dropped from a shopping list:
///
/// - empty text
/// - longer than [`MAX_INGREDIENT_NAME_CHARS`] characters
/// - contains a period
/// - contains any term of [`INSTRUCTION_VOCABULARY`]
/// - is exactly "serving" or "servings"
///
/// # Examples
///
/// ```rust
/// use meal_planner::classifier::is_instruction_like;
///
/// assert!(is_instruction_like("Preheat oven to 350 degrees"));
/// assert!(!is_instruction_like("Olive oil"));
/// ```
pub fn is_instruction_like(text: &str) -> bool {
    if text.is_empty() {
        trace!("Rejecting empty candidate");
        return true;
    }

    if text.chars().count() > MAX_INGREDIENT_NAME_CHARS {
        trace!("Rejecting candidate longer than {MAX_INGREDIENT_NAME_CHARS} chars: '{text}'");
        return true;
    }

    if text.contains('.') {
        trace!("Rejecting candidate with sentence punctuation: '{text}'");
        return true;
    }

    if let Some(term) = matching_instruction_term(text) {
        trace!("Rejecting candidate '{text}' (matched '{term}')");
        return true;
    }

    let normalized = text.trim().to_lowercase();
    if SERVING_LABELS.contains(&normalized.as_str()) {
        trace!("Rejecting serving label: '{text}'");
        return true;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_ingredients_are_kept() {
        for name in ["flour", "Olive oil", "2 eggs", "brown sugar", "fresh basil"] {
            assert!(!is_instruction_like(name), "'{name}' should be kept");
        }
    }

    #[test]
    fn test_empty_is_rejected() {
        assert!(is_instruction_like(""));
    }

    #[test]
    fn test_length_limit() {
        let at_limit = "a".repeat(MAX_INGREDIENT_NAME_CHARS);
        let over_limit = "a".repeat(MAX_INGREDIENT_NAME_CHARS + 1);

        assert!(!is_instruction_like(&at_limit));
        assert!(is_instruction_like(&over_limit));
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // 100 two-byte characters stay under the limit
        let accented = "é".repeat(100);
        assert!(!is_instruction_like(&accented));
    }

    #[test]
    fn test_period_is_rejected() {
        assert!(is_instruction_like("Salt to taste."));
        assert!(is_instruction_like("1.5 kg potatoes"));
    }

    #[test]
    fn test_vocabulary_is_case_insensitive() {
        assert!(is_instruction_like("PREHEAT the grill"));
        assert!(is_instruction_like("Set Aside for later"));
        assert!(is_instruction_like("Whisk eggs"));
    }

    #[test]
    fn test_every_vocabulary_term_rejects() {
        for term in INSTRUCTION_VOCABULARY {
            assert!(is_instruction_like(term), "'{term}' should be rejected");
            assert!(matching_instruction_term(&term.to_uppercase()).is_some());
        }
    }

    #[test]
    fn test_substring_matches_are_heuristic() {
        // Containment, not word matching: these are known false positives
        assert!(is_instruction_like("whole wheat flour")); // "heat"
        assert!(is_instruction_like("panko breadcrumbs")); // "pan"
        assert!(is_instruction_like("rolled oats")); // "roll"
    }

    #[test]
    fn test_serving_labels() {
        assert!(is_instruction_like("serving"));
        assert!(is_instruction_like("Servings"));
        // Only the bare label is rejected
        assert!(!is_instruction_like("servings of rice"));
    }

    #[test]
    fn test_matching_instruction_term() {
        assert_eq!(matching_instruction_term("Bring to a boil"), Some("bring"));
        assert_eq!(matching_instruction_term("tomatoes"), None);
    }
}
