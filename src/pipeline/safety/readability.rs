//! Reading-level analysis for enhanced narratives.
//!
//! Grade level is the mean of Flesch-Kincaid and Gunning fog, computed from
//! heuristic word, sentence and syllable counts. The result is reported
//! alongside each enhanced narrative and never causes a revert.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9]+(?:[.,'’][A-Za-z0-9]+)*").expect("valid word regex")
});
static SENTENCE_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+(?:\s+|$)").expect("valid sentence regex"));
static VOWEL_GROUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[aeiouy]+").expect("valid vowel regex"));

/// Patient materials aim for a 6th to 8th grade reading level.
pub const TARGET_MIN_GRADE: f64 = 6.0;
pub const TARGET_MAX_GRADE: f64 = 8.0;

/// Words of this many syllables or more count as complex for Gunning fog.
const COMPLEX_WORD_SYLLABLES: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReadabilityMetrics {
    pub grade_level: f64,
    pub flesch_kincaid_grade: f64,
    pub gunning_fog: f64,
    /// Flesch reading ease; higher reads more easily.
    pub reading_ease: f64,
    pub sentence_count: usize,
    pub word_count: usize,
    pub syllable_count: usize,
    pub complex_word_count: usize,
    pub meets_target: bool,
}

/// Source against enhanced reading level for one narrative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadabilityComparison {
    pub original_grade: f64,
    pub enhanced_grade: f64,
    /// Positive when the enhanced text reads at a lower grade.
    pub improvement_delta: f64,
    pub grade_level_improved: bool,
    pub reading_ease_improved: bool,
    pub meets_target: bool,
    /// Within the target band, or at a lower grade than the source.
    pub improved: bool,
}

pub fn meets_target(grade_level: f64) -> bool {
    (TARGET_MIN_GRADE..=TARGET_MAX_GRADE).contains(&grade_level)
}

/// Metrics for one text. Blank text yields all zeros.
pub fn analyze(text: &str) -> ReadabilityMetrics {
    let words: Vec<&str> = WORD_RE.find_iter(text).map(|m| m.as_str()).collect();
    if words.is_empty() {
        return ReadabilityMetrics::default();
    }

    let sentence_count = sentence_count(text);
    let per_word: Vec<usize> = words.iter().map(|w| syllables(w)).collect();
    let syllable_count: usize = per_word.iter().sum();
    let complex_word_count = per_word
        .iter()
        .filter(|&&s| s >= COMPLEX_WORD_SYLLABLES)
        .count();

    let word_count = words.len();
    let words_per_sentence = word_count as f64 / sentence_count as f64;
    let syllables_per_word = syllable_count as f64 / word_count as f64;
    let complex_ratio = complex_word_count as f64 / word_count as f64;

    let flesch_kincaid_grade = 0.39 * words_per_sentence + 11.8 * syllables_per_word - 15.59;
    let reading_ease = 206.835 - 1.015 * words_per_sentence - 84.6 * syllables_per_word;
    let gunning_fog = 0.4 * (words_per_sentence + 100.0 * complex_ratio);
    let grade_level = round1((flesch_kincaid_grade + gunning_fog) / 2.0);

    ReadabilityMetrics {
        grade_level,
        flesch_kincaid_grade: round1(flesch_kincaid_grade),
        gunning_fog: round1(gunning_fog),
        reading_ease: round1(reading_ease),
        sentence_count,
        word_count,
        syllable_count,
        complex_word_count,
        meets_target: meets_target(grade_level),
    }
}

pub fn compare(original: &str, enhanced: &str) -> ReadabilityComparison {
    let before = analyze(original);
    let after = analyze(enhanced);
    let grade_level_improved = after.grade_level < before.grade_level;

    ReadabilityComparison {
        original_grade: before.grade_level,
        enhanced_grade: after.grade_level,
        improvement_delta: round1(before.grade_level - after.grade_level),
        grade_level_improved,
        reading_ease_improved: after.reading_ease > before.reading_ease,
        meets_target: after.meets_target,
        improved: after.meets_target || grade_level_improved,
    }
}

/// Terminated sentences plus any trailing fragment; at least one.
fn sentence_count(text: &str) -> usize {
    SENTENCE_END_RE
        .split(text)
        .filter(|piece| WORD_RE.is_match(piece))
        .count()
        .max(1)
}

/// Vowel groups, less a silent final "e" or "-ed". Digits count as one.
fn syllables(word: &str) -> usize {
    let lower: String = word
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if lower.len() <= 3 {
        return 1;
    }

    let mut count = VOWEL_GROUP_RE.find_iter(&lower).count();
    let silent_e = lower.ends_with('e') && !lower.ends_with("le") && !lower.ends_with("ee");
    let silent_ed = lower.ends_with("ed") && !lower.ends_with("ted") && !lower.ends_with("ded");
    if count > 1 && (silent_e || silent_ed) {
        count -= 1;
    }
    count.max(1)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
