//! Per-request audit records.
//!
//! Built from metadata blocks only: ids, counts, stage names and error codes.
//! Critical values, narrative text and raw identifiers never reach an event.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::ProcessingStage;
use crate::pipeline::assembler::PatientSummary;
use crate::pipeline::processor::ProcessingFailure;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Assembled,
    /// Parsed, but assembly was refused.
    Refused,
    /// Structurally invalid input.
    Rejected,
}

impl AuditOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assembled => "assembled",
            Self::Refused => "refused",
            Self::Rejected => "rejected",
        }
    }
}

/// A single audit entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    pub summary_id: Uuid,
    pub patient_ref: Option<Uuid>,
    pub outcome: AuditOutcome,
    pub stage: ProcessingStage,
    pub elapsed_ms: u64,
    pub critical_records: usize,
    pub narrative_segments: usize,
    pub enhanced_narratives: usize,
    pub reverted_narratives: usize,
    pub budget_exhausted: bool,
    pub error_codes: Vec<&'static str>,
    pub warning_count: usize,
}

impl AuditEvent {
    pub fn from_summary(summary: &PatientSummary) -> Self {
        let m = &summary.metadata;
        Self {
            timestamp: Utc::now(),
            summary_id: m.summary_id,
            patient_ref: m.patient_ref,
            outcome: AuditOutcome::Assembled,
            stage: ProcessingStage::Assembled,
            elapsed_ms: m.elapsed_ms,
            critical_records: m.critical_records,
            narrative_segments: m.narrative_segments,
            enhanced_narratives: m.enhanced_narratives,
            reverted_narratives: m.reverted_narratives,
            budget_exhausted: m.budget_exhausted,
            error_codes: Vec::new(),
            warning_count: summary.validation.warnings.len(),
        }
    }

    pub fn from_failure(failure: &ProcessingFailure) -> Self {
        let m = &failure.metadata;
        let outcome = if failure.stage == ProcessingStage::Received {
            AuditOutcome::Rejected
        } else {
            AuditOutcome::Refused
        };
        let mut error_codes: Vec<&'static str> = std::iter::once(&failure.error)
            .chain(failure.others.iter())
            .map(|e| e.code())
            .collect();
        error_codes.dedup();

        Self {
            timestamp: Utc::now(),
            summary_id: m.summary_id,
            patient_ref: m.patient_ref,
            outcome,
            stage: failure.stage,
            elapsed_ms: m.elapsed_ms,
            critical_records: m.critical_records,
            narrative_segments: m.narrative_segments,
            enhanced_narratives: m.enhanced_narratives,
            reverted_narratives: m.reverted_narratives,
            budget_exhausted: m.budget_exhausted,
            error_codes,
            warning_count: 0,
        }
    }

    /// Write the event to the `audit` tracing target.
    pub fn emit(&self) {
        let patient_ref = self.patient_ref.map(|r| r.to_string()).unwrap_or_default();
        match self.outcome {
            AuditOutcome::Assembled => tracing::info!(
                target: "audit",
                summary_id = %self.summary_id,
                patient_ref = %patient_ref,
                outcome = self.outcome.as_str(),
                elapsed_ms = self.elapsed_ms,
                records = self.critical_records,
                segments = self.narrative_segments,
                enhanced = self.enhanced_narratives,
                reverted = self.reverted_narratives,
                budget_exhausted = self.budget_exhausted,
                warnings = self.warning_count,
                "Summary produced"
            ),
            AuditOutcome::Refused | AuditOutcome::Rejected => tracing::warn!(
                target: "audit",
                summary_id = %self.summary_id,
                patient_ref = %patient_ref,
                outcome = self.outcome.as_str(),
                stage = %self.stage,
                elapsed_ms = self.elapsed_ms,
                codes = ?self.error_codes,
                "Summary not produced"
            ),
        }
    }
}
