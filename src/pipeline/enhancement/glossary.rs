//! Curated medical glossary and plain-language phrase substitutions.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// (medical term, plain-language equivalent). Terms are lowercase.
pub const GLOSSARY: &[(&str, &str)] = &[
    ("acute myocardial infarction", "heart attack"),
    ("myocardial infarction", "heart attack"),
    ("hypertension", "high blood pressure"),
    ("coronary artery", "heart blood vessel"),
    ("arrhythmia", "irregular heartbeat"),
    ("drug-eluting stent", "medicine-coated tube"),
    ("stent", "tiny tube"),
    ("percutaneous coronary intervention", "heart artery opening procedure"),
    ("left anterior descending", "main heart artery"),
    ("dyspnea", "shortness of breath"),
    ("pneumonia", "lung infection"),
    ("chronic obstructive pulmonary disease", "lung disease"),
    ("copd", "lung disease"),
    ("diaphoresis", "sweating"),
    ("syncope", "fainting"),
    ("nausea", "feeling sick"),
    ("fatigue", "extreme tiredness"),
    ("echocardiogram", "heart ultrasound"),
    ("electrocardiogram", "heart rhythm test"),
    ("ekg", "heart rhythm test"),
    ("ecg", "heart rhythm test"),
    ("catheterization", "heart tube procedure"),
    ("anticoagulant", "blood thinner"),
    ("beta blocker", "heart rate medicine"),
    ("ace inhibitor", "blood pressure medicine"),
    ("dual antiplatelet therapy", "two blood thinners"),
    ("hyperlipidemia", "high cholesterol"),
    ("edema", "swelling"),
    ("tachycardia", "fast heartbeat"),
    ("bradycardia", "slow heartbeat"),
];

/// (clinical phrase, plain phrase), applied on word boundaries.
pub const PLAIN_LANGUAGE: &[(&str, &str)] = &[
    ("presents with", "has"),
    ("experiencing", "having"),
    ("acute", "sudden"),
    ("chronic", "long-term"),
    ("significant", "important"),
    ("demonstrate", "show"),
    ("exhibit", "show"),
    ("manifests", "shows"),
    ("indicates", "shows"),
    ("suggests", "may mean"),
    ("administer", "give"),
    ("monitor", "watch"),
    ("assess", "check"),
    ("evaluate", "check"),
    ("implement", "start"),
    ("initiate", "start"),
    ("discontinue", "stop"),
    ("maintain", "keep"),
    ("excessive", "too much"),
    ("insufficient", "not enough"),
    ("subsequent", "next"),
    ("prior to", "before"),
];

fn alternation(terms: impl Iterator<Item = &'static str>) -> Regex {
    let mut terms: Vec<&str> = terms.collect();
    // Longest first so the most specific term wins.
    terms.sort_by_key(|t| std::cmp::Reverse(t.len()));
    let pattern = terms
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{pattern})\b")).expect("valid glossary regex")
}

static GLOSSARY_RE: LazyLock<Regex> =
    LazyLock::new(|| alternation(GLOSSARY.iter().map(|(t, _)| *t)));
static PLAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| alternation(PLAIN_LANGUAGE.iter().map(|(t, _)| *t)));

fn lookup(table: &[(&'static str, &'static str)], matched: &str) -> Option<&'static str> {
    let key = matched.to_lowercase();
    table.iter().find(|(term, _)| *term == key).map(|(_, plain)| *plain)
}

/// Keep a leading capital when the replaced text had one.
fn match_case(original: &str, replacement: &str) -> String {
    let starts_upper = original.chars().next().is_some_and(char::is_uppercase);
    let mut chars = replacement.chars();
    match chars.next() {
        Some(first) if starts_upper => first.to_uppercase().chain(chars).collect(),
        _ => replacement.to_string(),
    }
}

/// Glossary terms present in `text`, lowercase, in order of first appearance.
pub fn find_terms(text: &str) -> Vec<&'static str> {
    let mut seen = Vec::new();
    for m in GLOSSARY_RE.find_iter(text) {
        if let Some((term, _)) = GLOSSARY
            .iter()
            .find(|(term, _)| *term == m.as_str().to_lowercase())
        {
            if !seen.contains(term) {
                seen.push(*term);
            }
        }
    }
    seen
}

/// Replace clinical phrasing with plain phrasing.
pub fn simplify(text: &str) -> String {
    PLAIN_RE
        .replace_all(text, |caps: &Captures<'_>| {
            let matched = &caps[0];
            match lookup(PLAIN_LANGUAGE, matched) {
                Some(plain) => match_case(matched, plain),
                None => matched.to_string(),
            }
        })
        .into_owned()
}

/// Rewrite the first occurrence of each glossary term as
/// "plain (also called term)" and report which terms were explained.
pub fn explain_terms(text: &str) -> (String, BTreeSet<String>) {
    let mut explained = BTreeSet::new();
    let rewritten = GLOSSARY_RE
        .replace_all(text, |caps: &Captures<'_>| {
            let matched = &caps[0];
            let key = matched.to_lowercase();
            match lookup(GLOSSARY, matched) {
                Some(plain) if !explained.contains(&key) => {
                    explained.insert(key);
                    format!("{} (also called {matched})", match_case(matched, plain))
                }
                _ => matched.to_string(),
            }
        })
        .into_owned();
    (rewritten, explained)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_longest_terms_first() {
        let terms = find_terms("History of acute myocardial infarction and hypertension.");
        assert_eq!(terms, vec!["acute myocardial infarction", "hypertension"]);
    }

    #[test]
    fn terms_need_word_boundaries() {
        assert!(find_terms("The stenting was fine, stents too").is_empty());
        assert_eq!(find_terms("A stent was placed."), vec!["stent"]);
    }

    #[test]
    fn simplify_preserves_leading_capital() {
        assert_eq!(
            simplify("Patient presents with chronic cough. Monitor prior to meals."),
            "Patient has long-term cough. Watch before meals."
        );
    }

    #[test]
    fn explain_uses_balanced_form_once_per_term() {
        let (text, terms) = explain_terms("Syncope again; syncope may recur.");
        assert_eq!(text, "Fainting (also called Syncope) again; syncope may recur.");
        assert_eq!(terms, BTreeSet::from(["syncope".to_string()]));
    }

    #[test]
    fn explanation_is_not_rescanned() {
        // "shortness of breath" is not itself a glossary term here; the
        // inserted text must not be expanded a second time.
        let (text, _) = explain_terms("Dyspnea on exertion.");
        assert_eq!(text, "Shortness of breath (also called Dyspnea) on exertion.");
    }

    #[test]
    fn glossary_never_introduces_digits() {
        for (term, plain) in GLOSSARY {
            assert!(!term.chars().any(|c| c.is_ascii_digit()));
            assert!(!plain.chars().any(|c| c.is_ascii_digit()));
        }
    }
}
