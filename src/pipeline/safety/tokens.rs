//! Token extraction for the fabrication check.
//!
//! Deliberately conservative: a paraphrase that spells a number differently
//! ("twice" becoming "2 times") is treated as a new number.

use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::pipeline::parser::{ClinicalBundle, Resource};

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:[.,]\d+)*").expect("valid number regex"));
static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z][A-Za-z\-]*").expect("valid word regex"));

/// Common generic drug names.
const DRUG_LEXICON: &[&str] = &[
    "acetaminophen", "albuterol", "amiodarone", "amlodipine", "amoxicillin", "apixaban",
    "aspirin", "atorvastatin", "clopidogrel", "digoxin", "diltiazem", "furosemide",
    "gabapentin", "heparin", "hydrochlorothiazide", "ibuprofen", "insulin", "levothyroxine",
    "lisinopril", "losartan", "metformin", "metoprolol", "morphine", "naproxen",
    "nitroglycerin", "omeprazole", "oxycodone", "paracetamol", "prednisone", "rivaroxaban",
    "simvastatin", "spironolactone", "tramadol", "warfarin",
];

/// Generic-name stems that mark a word as a likely drug name.
const DRUG_SUFFIXES: &[&str] = &[
    "pril", "sartan", "olol", "statin", "dipine", "formin", "mycin", "cillin", "cycline",
    "floxacin", "prazole", "tidine", "oxetine", "triptan", "parin", "xaban", "gliptin",
    "glitazone", "semide", "thiazide", "azepam", "codone", "profen",
];

const MIN_SUFFIX_WORD_LEN: usize = 6;

/// Numbers as written, e.g. `10`, `0.5`, `1,000`.
pub fn numeric_tokens(text: &str) -> BTreeSet<String> {
    NUMBER_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Drug names known to a bundle: the lexicon plus words from its medication names.
#[derive(Debug, Clone, Default)]
pub struct MedicationLexicon {
    bundle_words: HashSet<String>,
}

impl MedicationLexicon {
    pub fn from_bundle(bundle: &ClinicalBundle) -> Self {
        let mut bundle_words = HashSet::new();
        for entry in &bundle.entries {
            let (Resource::MedicationRequest(m) | Resource::MedicationStatement(m)) =
                &entry.resource
            else {
                continue;
            };
            let names = m
                .medication_codeable_concept
                .iter()
                .flat_map(|c| {
                    c.text
                        .iter()
                        .chain(c.coding.iter().filter_map(|cd| cd.display.as_ref()))
                })
                .chain(m.medication_reference.iter().filter_map(|r| r.display.as_ref()));
            for name in names {
                bundle_words.extend(
                    WORD_RE
                        .find_iter(name)
                        .map(|w| w.as_str().to_lowercase())
                        .filter(|w| w.len() >= 4 && !is_dose_form(w)),
                );
            }
        }
        Self { bundle_words }
    }

    pub fn is_medication(&self, word: &str) -> bool {
        let word = word.to_lowercase();
        DRUG_LEXICON.contains(&word.as_str())
            || self.bundle_words.contains(&word)
            || (word.len() >= MIN_SUFFIX_WORD_LEN
                && DRUG_SUFFIXES.iter().any(|s| word.ends_with(s)))
    }

    /// Lowercase medication-like words in `text`.
    pub fn medication_tokens(&self, text: &str) -> BTreeSet<String> {
        WORD_RE
            .find_iter(text)
            .map(|m| m.as_str())
            .filter(|w| self.is_medication(w))
            .map(str::to_lowercase)
            .collect()
    }
}

/// Words in drug display names that are not drug names themselves.
fn is_dose_form(word: &str) -> bool {
    matches!(
        word,
        "oral" | "tablet" | "tablets" | "capsule" | "capsules" | "solution" | "injection"
            | "extended" | "release" | "delayed" | "chewable" | "topical" | "cream" | "patch"
            | "suspension" | "inhaler" | "spray" | "drops"
    )
}

/// Tokens in `enhanced` that `source` does not contain.
pub fn unsupported_tokens(
    source: &str,
    enhanced: &str,
    lexicon: &MedicationLexicon,
) -> BTreeSet<String> {
    let mut allowed = numeric_tokens(source);
    allowed.extend(lexicon.medication_tokens(source));

    let mut found = numeric_tokens(enhanced);
    found.extend(lexicon.medication_tokens(enhanced));

    found.difference(&allowed).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::parser::parse_bundle;
    use crate::test_fixtures;

    #[test]
    fn numeric_tokens_keep_decimals_and_grouping() {
        let tokens = numeric_tokens("Take 0.5 mg, max 1,000 mg, at 8.");
        assert_eq!(
            tokens,
            BTreeSet::from(["0.5".to_string(), "1,000".to_string(), "8".to_string()])
        );
    }

    #[test]
    fn suffix_and_lexicon_detection() {
        let lexicon = MedicationLexicon::default();
        assert!(lexicon.is_medication("Atorvastatin"));
        assert!(lexicon.is_medication("candesartan"));
        assert!(lexicon.is_medication("aspirin"));
        assert!(!lexicon.is_medication("April"));
        assert!(!lexicon.is_medication("control"));
    }

    #[test]
    fn bundle_medication_names_join_the_lexicon() {
        let bundle = parse_bundle(&test_fixtures::sample_bundle()).unwrap();
        let lexicon = MedicationLexicon::from_bundle(&bundle);
        assert!(lexicon.is_medication("lisinopril"));
        assert!(!lexicon.is_medication("tablet"));
    }

    #[test]
    fn paraphrase_with_same_tokens_is_clean() {
        let lexicon = MedicationLexicon::default();
        let extra = unsupported_tokens(
            "Call 911 if warfarin causes bleeding.",
            "If warfarin makes you bleed, call 911.",
            &lexicon,
        );
        assert!(extra.is_empty());
    }

    #[test]
    fn new_numbers_and_drugs_are_flagged() {
        let lexicon = MedicationLexicon::default();
        let extra = unsupported_tokens(
            "Take your medicine twice a day.",
            "Take 2 tablets of ibuprofen two times a day.",
            &lexicon,
        );
        assert_eq!(extra, BTreeSet::from(["2".to_string(), "ibuprofen".to_string()]));
    }
}
