//! Safety terms that must survive enhancement.

/// (term, accepted replacements). Matching is case-insensitive on word boundaries.
const RETAINED_TERMS: &[(&str, &[&str])] = &[
    ("mg", &[]),
    ("mcg", &[]),
    ("ml", &[]),
    ("units", &[]),
    ("daily", &["every day", "each day"]),
    ("twice", &["two times", "2 times"]),
    ("three times", &["3 times"]),
    ("four times", &["4 times"]),
    ("morning", &[]),
    ("evening", &[]),
    ("with food", &["with a meal", "with meals"]),
    ("without food", &["on an empty stomach"]),
    ("before meals", &["before eating"]),
    ("after meals", &["after eating"]),
    ("aspirin", &[]),
    ("warfarin", &[]),
    ("insulin", &[]),
    ("metformin", &[]),
    ("lisinopril", &[]),
    ("immediately", &["right away", "at once"]),
    ("emergency", &["urgent", "serious"]),
    ("911", &[]),
    ("call your doctor", &["call doctor", "contact your doctor", "call your healthcare provider"]),
    ("call doctor", &["call your doctor", "contact your doctor"]),
];

/// True when `phrase` occurs in `haystack` with non-alphanumeric neighbours.
/// Both arguments must already be lowercase.
fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    haystack.match_indices(phrase).any(|(start, _)| {
        let end = start + phrase.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}

/// Retained terms present in `source` that `enhanced` lost without an
/// accepted replacement.
pub fn removed_terms(source: &str, enhanced: &str) -> Vec<&'static str> {
    let source = source.to_lowercase();
    let enhanced = enhanced.to_lowercase();

    RETAINED_TERMS
        .iter()
        .filter(|(term, _)| contains_phrase(&source, term) && !contains_phrase(&enhanced, term))
        .filter(|(_, accepted)| !accepted.iter().any(|alt| contains_phrase(&enhanced, alt)))
        .map(|(term, _)| *term)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kept_terms_pass() {
        let text = "Take 5 mg daily with food.";
        assert!(removed_terms(text, text).is_empty());
    }

    #[test]
    fn accepted_replacements_pass() {
        assert!(removed_terms(
            "Go to the emergency room immediately.",
            "Go to the urgent care room right away."
        )
        .is_empty());
    }

    #[test]
    fn dropped_terms_are_reported() {
        let removed =
            removed_terms("Call 911 immediately. Take insulin at night.", "Get help soon.");
        assert_eq!(removed, vec!["insulin", "immediately", "911"]);
    }

    #[test]
    fn word_boundaries_prevent_false_hits() {
        // "ml" inside "html" and "with food" inside "without food" do not count.
        assert!(removed_terms("See the html page.", "See the page.").is_empty());
        assert_eq!(removed_terms("Take without food.", "Take it."), vec!["without food"]);
    }
}
