//! Final assembly of the patient-facing summary.
//!
//! Refuses outright when validation found any fatal error; there is no
//! partial summary.

use serde::Serialize;

use crate::models::CriticalCategory;
use crate::pipeline::critical::CriticalRecord;
use crate::pipeline::enhancement::EnhancedNarrative;
use crate::pipeline::errors::SummaryError;
use crate::pipeline::processor::ProcessingMetadata;
use crate::pipeline::safety::ValidationResult;

/// Attached verbatim to every summary.
pub const DISCLAIMERS: [&str; 3] = [
    "This summary is for educational purposes only and does not replace professional medical advice.",
    "Always consult your healthcare provider before making any changes to your medications or treatment plan.",
    "In case of emergency, call 911 or go to the nearest emergency room.",
];

/// Records of one category, in document order.
#[derive(Debug, Clone, Serialize)]
pub struct CriticalGroup {
    pub category: CriticalCategory,
    pub records: Vec<CriticalRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatientSummary {
    pub critical: Vec<CriticalGroup>,
    pub narratives: Vec<EnhancedNarrative>,
    pub disclaimers: Vec<String>,
    pub validation: ValidationResult,
    pub metadata: ProcessingMetadata,
}

impl PatientSummary {
    pub fn group(&self, category: CriticalCategory) -> Option<&CriticalGroup> {
        self.critical.iter().find(|g| g.category == category)
    }

    /// Category order as emitted.
    pub fn categories(&self) -> Vec<CriticalCategory> {
        self.critical.iter().map(|g| g.category).collect()
    }
}

/// Merge validated records and narratives into a summary.
///
/// On refusal the fatal errors are returned in the order they were found.
pub fn assemble(
    records: Vec<CriticalRecord>,
    narratives: Vec<EnhancedNarrative>,
    validation: ValidationResult,
    metadata: ProcessingMetadata,
) -> Result<PatientSummary, Vec<SummaryError>> {
    if validation.has_fatal() {
        tracing::warn!(
            outcome = "refused",
            fatal_count = validation.fatal.len(),
            categories = ?validation.fatal_categories(),
            "Summary assembly refused"
        );
        return Err(validation.fatal);
    }

    let critical = group_records(records);
    let mut narratives = narratives;
    narratives.sort_by_key(|n| n.segment.order);

    Ok(PatientSummary {
        critical,
        narratives,
        disclaimers: DISCLAIMERS.iter().map(|d| d.to_string()).collect(),
        validation,
        metadata,
    })
}

fn group_records(records: Vec<CriticalRecord>) -> Vec<CriticalGroup> {
    let mut groups: Vec<CriticalGroup> = CriticalCategory::ALL
        .iter()
        .map(|&category| CriticalGroup {
            category,
            records: Vec::new(),
        })
        .collect();

    for record in records {
        if let Some(group) = groups.iter_mut().find(|g| g.category == record.category()) {
            group.records.push(record);
        }
    }

    groups.retain(|g| !g.records.is_empty());
    groups
}
