use crate::models::{CriticalCategory, Severity};
use crate::pipeline::critical::{CriticalExtraction, CriticalRecord};
use crate::pipeline::enhancement::{EnhancedNarrative, FallbackReason};
use crate::pipeline::errors::SummaryError;
use crate::pipeline::parser::ClinicalBundle;

use super::preservation::drifted_fields;
use super::readability;
use super::retention::removed_terms;
use super::tokens::{unsupported_tokens, MedicationLexicon};
use super::types::ValidationResult;

/// Runs both safety checks against the original bundle.
///
/// Only validation metadata on records is touched. Narratives that fail a
/// check are reverted to their source text.
pub struct SafetyValidator<'a> {
    bundle: &'a ClinicalBundle,
    lexicon: MedicationLexicon,
}

impl<'a> SafetyValidator<'a> {
    pub fn new(bundle: &'a ClinicalBundle) -> Self {
        Self {
            bundle,
            lexicon: MedicationLexicon::from_bundle(bundle),
        }
    }

    pub fn validate(
        &self,
        extraction: &mut CriticalExtraction,
        narratives: &mut [EnhancedNarrative],
    ) -> ValidationResult {
        let mut result = ValidationResult::new();

        for record in &extraction.records {
            result.categories.insert(record.category(), true);
            result.preserved_fields.insert(record.category(), true);
        }

        for issue in &extraction.issues {
            if issue.severity != Severity::Warning {
                result.categories.insert(issue.category, false);
            }
            result.record(SummaryError::CriticalFieldMissing {
                category: issue.category,
                resource: issue.resource.clone(),
                field: issue.field,
                severity: issue.severity,
            });
        }

        for record in &mut extraction.records {
            self.check_preservation(record, &mut result);
        }

        for narrative in narratives.iter() {
            let (category, order) = (narrative.segment.category, narrative.segment.order);
            if let Some(warning) = narrative
                .fallback
                .and_then(|reason| SummaryError::from_fallback(category, order, reason))
            {
                result.record(warning);
            }
        }

        for narrative in narratives.iter_mut().filter(|n| n.ai_processed) {
            self.check_narrative(narrative, &mut result);
        }

        score_readability(narratives, &mut result);

        log_outcome(&result);
        result
    }

    fn check_preservation(&self, record: &mut CriticalRecord, result: &mut ValidationResult) {
        let drifted = drifted_fields(self.bundle, record);
        if drifted.is_empty() {
            return;
        }

        let category = record.category();
        result.categories.insert(category, false);
        result.preserved_fields.insert(category, false);
        record.metadata.validation_passed = false;

        for field in drifted {
            record
                .metadata
                .validation_errors
                .push(format!("Value differs from source on field '{field}'"));
            result.record(SummaryError::CriticalDataDrift {
                category,
                resource: record.source.clone(),
                field,
            });
        }
    }

    fn check_narrative(&self, narrative: &mut EnhancedNarrative, result: &mut ValidationResult) {
        let category = narrative.segment.category;
        let order = narrative.segment.order;

        let unsupported = unsupported_tokens(
            &narrative.segment.source_text,
            &narrative.enhanced_text,
            &self.lexicon,
        );
        if !unsupported.is_empty() {
            narrative.revert(FallbackReason::Fabrication);
            result.narratives_passed = false;
            result.record(SummaryError::NarrativeFabrication {
                category,
                order,
                count: unsupported.len(),
            });
            return;
        }

        let removed = removed_terms(&narrative.segment.source_text, &narrative.enhanced_text);
        if !removed.is_empty() {
            narrative.revert(FallbackReason::CriticalTermRemoved);
            result.narratives_passed = false;
            result.record(SummaryError::NarrativeTermRemoved {
                category,
                order,
                count: removed.len(),
            });
        }
    }
}

/// Informational only: a kept enhancement is never reverted for its score.
fn score_readability(narratives: &mut [EnhancedNarrative], result: &mut ValidationResult) {
    let mut kept = 0usize;
    let mut improved = 0usize;
    for narrative in narratives.iter_mut().filter(|n| n.ai_processed) {
        let comparison =
            readability::compare(&narrative.segment.source_text, &narrative.enhanced_text);
        kept += 1;
        if comparison.improved {
            improved += 1;
        }
        narrative.readability = Some(comparison);
    }

    result.readability_improved = kept > 0 && improved == kept;
    if kept > 0 {
        tracing::debug!(kept, improved, "Narrative readability scored");
    }
}

fn log_outcome(result: &ValidationResult) {
    let fatal_categories: Vec<CriticalCategory> = result.fatal_categories();
    if result.passed {
        tracing::info!(
            outcome = "passed",
            warnings = result.warnings.len(),
            errors = result.errors.len(),
            narratives_passed = result.narratives_passed,
            "Safety validation complete"
        );
    } else {
        tracing::warn!(
            outcome = "failed",
            fatal_count = result.fatal.len(),
            categories = ?fatal_categories,
            warnings = result.warnings.len(),
            "Safety validation found fatal errors"
        );
    }
}
