//! Summarization orchestrator.
//!
//! Drives one bundle through parse → extract → enhance → validate → assemble
//! under a single wall-clock budget. The enhancement service is injected so
//! the orchestrator stays testable with
//! [`MockEnhancer`](crate::pipeline::enhancement::MockEnhancer).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::time::Instant;
use uuid::Uuid;

use crate::config::{SummarizerConfig, APP_NAME, APP_VERSION};
use crate::models::ProcessingStage;
use crate::pipeline::assembler::{assemble, PatientSummary};
use crate::pipeline::audit::AuditEvent;
use crate::pipeline::critical::extract_critical;
use crate::pipeline::enhancement::{
    EnhancedNarrative, EnhancementService, FallbackReason, NarrativeEnhancementBoundary,
};
use crate::pipeline::errors::{ErrorReport, SummaryError};
use crate::pipeline::narrative::extract_narratives;
use crate::pipeline::parser::{parse_bundle, parse_bundle_str, ClinicalBundle, ParseError};
use crate::pipeline::safety::SafetyValidator;

// ---------------------------------------------------------------------------
// Stage tracking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid stage transition {from} -> {to}")]
pub struct StageTransitionError {
    pub from: ProcessingStage,
    pub to: ProcessingStage,
}

/// Forward-only state machine for one request.
#[derive(Debug, Clone)]
pub struct StageTracker {
    path: Vec<ProcessingStage>,
}

impl StageTracker {
    pub fn new() -> Self {
        Self {
            path: vec![ProcessingStage::Received],
        }
    }

    pub fn current(&self) -> ProcessingStage {
        self.path
            .last()
            .copied()
            .unwrap_or(ProcessingStage::Received)
    }

    /// Move to a later stage. Stages may be skipped but never revisited, and
    /// nothing follows a terminal stage.
    pub fn advance(&mut self, next: ProcessingStage) -> Result<(), StageTransitionError> {
        let from = self.current();
        if from.is_terminal() || next <= from {
            return Err(StageTransitionError { from, to: next });
        }
        self.path.push(next);
        Ok(())
    }

    /// Enter `Failed`, returning the stage the request failed in.
    pub fn fail(&mut self) -> ProcessingStage {
        let from = self.current();
        if !from.is_terminal() {
            self.path.push(ProcessingStage::Failed);
        }
        from
    }

    pub fn path(&self) -> &[ProcessingStage] {
        &self.path
    }
}

impl Default for StageTracker {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Processing metadata attached to every summary. Carries no identifiers
/// beyond the opaque patient reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessingMetadata {
    pub summary_id: Uuid,
    pub patient_ref: Option<Uuid>,
    pub processed_at: DateTime<Utc>,
    pub processor_version: String,
    pub enhancer: String,
    pub elapsed_ms: u64,
    pub entry_count: usize,
    pub opaque_entries: usize,
    pub unreadable_entries: usize,
    pub critical_records: usize,
    pub narrative_segments: usize,
    pub enhanced_narratives: usize,
    pub reverted_narratives: usize,
    pub budget_exhausted: bool,
    pub stages: Vec<ProcessingStage>,
}

/// Terminal failure of one request.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Processing failed after stage {stage}: {error}")]
pub struct ProcessingFailure {
    /// Last stage reached before failing.
    pub stage: ProcessingStage,
    pub error: SummaryError,
    /// Further fatal errors found alongside `error`.
    pub others: Vec<SummaryError>,
    pub metadata: ProcessingMetadata,
}

impl ProcessingFailure {
    pub fn report(&self) -> ErrorReport {
        self.error.report()
    }

    /// Reports for every fatal error, primary first.
    pub fn reports(&self) -> Vec<ErrorReport> {
        std::iter::once(&self.error)
            .chain(self.others.iter())
            .map(SummaryError::report)
            .collect()
    }
}

/// Opaque, stable reference for a patient id. The raw id never leaves the core.
pub fn patient_reference(patient_id: &str) -> Uuid {
    Uuid::new_v5(
        &Uuid::NAMESPACE_OID,
        format!("{APP_NAME}:patient:{patient_id}").as_bytes(),
    )
}

// ---------------------------------------------------------------------------
// Processor
// ---------------------------------------------------------------------------

pub struct SummaryProcessor {
    config: SummarizerConfig,
    boundary: NarrativeEnhancementBoundary,
}

impl SummaryProcessor {
    pub fn new(config: SummarizerConfig, service: Arc<dyn EnhancementService>) -> Self {
        let boundary = NarrativeEnhancementBoundary::new(service, &config);
        Self { config, boundary }
    }

    pub fn config(&self) -> &SummarizerConfig {
        &self.config
    }

    /// Summarize an already-decoded bundle.
    pub async fn process(&self, input: &Value) -> Result<PatientSummary, ProcessingFailure> {
        let started = Instant::now();
        self.run(parse_bundle(input), started).await
    }

    /// Summarize a bundle from raw JSON text. Decoding counts against the
    /// time budget.
    pub async fn process_str(&self, raw: &str) -> Result<PatientSummary, ProcessingFailure> {
        let started = Instant::now();
        self.run(parse_bundle_str(raw), started).await
    }

    async fn run(
        &self,
        parsed: Result<ClinicalBundle, ParseError>,
        started: Instant,
    ) -> Result<PatientSummary, ProcessingFailure> {
        let deadline = started + self.config.time_budget;
        let mut tracker = StageTracker::new();
        let mut metadata = ProcessingMetadata {
            summary_id: Uuid::new_v4(),
            processed_at: Utc::now(),
            processor_version: APP_VERSION.to_string(),
            enhancer: self.boundary.service_name().to_string(),
            ..ProcessingMetadata::default()
        };

        // Step 1: Parse
        let bundle = match parsed {
            Ok(bundle) => bundle,
            Err(e) => {
                return Err(self.fail(&mut tracker, metadata, started, vec![e.into()]));
            }
        };
        enter(&mut tracker, ProcessingStage::Parsed);
        metadata.patient_ref = bundle.patient_id().map(patient_reference);
        metadata.entry_count = bundle.entries.len();
        metadata.opaque_entries = bundle.opaque_count();
        metadata.unreadable_entries = bundle.unreadable_count();

        // Step 2: Extract both branches
        let mut extraction = extract_critical(&bundle, metadata.processed_at);
        let segments = extract_narratives(&bundle);
        enter(&mut tracker, ProcessingStage::Extracted);
        metadata.critical_records = extraction.records.len();
        metadata.narrative_segments = segments.len();

        tracing::info!(
            summary_id = %metadata.summary_id,
            entries = metadata.entry_count,
            records = metadata.critical_records,
            segments = metadata.narrative_segments,
            "Processing: extraction complete"
        );

        // Step 3: Enhance (skipped when the request is already doomed)
        let mut narratives: Vec<EnhancedNarrative> = if extraction.has_fatal() {
            tracing::info!(
                summary_id = %metadata.summary_id,
                "Processing: fatal extraction issue, skipping enhancement"
            );
            segments
                .into_iter()
                .map(|segment| EnhancedNarrative::passthrough(segment, None))
                .collect()
        } else {
            let enhanced = self.boundary.enhance_all(segments, deadline).await;
            enter(&mut tracker, ProcessingStage::Enhanced);
            enhanced
        };

        // Step 4: Validate
        let validation = SafetyValidator::new(&bundle).validate(&mut extraction, &mut narratives);
        enter(&mut tracker, ProcessingStage::Validated);

        metadata.enhanced_narratives = narratives.iter().filter(|n| n.ai_processed).count();
        metadata.reverted_narratives = narratives
            .iter()
            .filter(|n| {
                matches!(
                    n.fallback,
                    Some(FallbackReason::Fabrication | FallbackReason::CriticalTermRemoved)
                )
            })
            .count();
        metadata.budget_exhausted = narratives
            .iter()
            .any(|n| n.fallback == Some(FallbackReason::BudgetExhausted));

        // Step 5: Assemble
        let assembled = assemble(extraction.records, narratives, validation, metadata.clone());
        let mut summary = match assembled {
            Ok(summary) => summary,
            Err(errors) => return Err(self.fail(&mut tracker, metadata, started, errors)),
        };
        enter(&mut tracker, ProcessingStage::Assembled);
        summary.metadata.stages = tracker.path().to_vec();
        summary.metadata.elapsed_ms = elapsed_ms(started);

        AuditEvent::from_summary(&summary).emit();
        Ok(summary)
    }

    fn fail(
        &self,
        tracker: &mut StageTracker,
        mut metadata: ProcessingMetadata,
        started: Instant,
        errors: Vec<SummaryError>,
    ) -> ProcessingFailure {
        let stage = tracker.fail();
        metadata.stages = tracker.path().to_vec();
        metadata.elapsed_ms = elapsed_ms(started);

        let mut errors = errors.into_iter();
        // Callers always pass at least one error.
        let error = errors
            .next()
            .unwrap_or(SummaryError::StructuralValidation(ParseError::EmptyEntries));
        let failure = ProcessingFailure {
            stage,
            error,
            others: errors.collect(),
            metadata,
        };

        AuditEvent::from_failure(&failure).emit();
        failure
    }
}

fn enter(tracker: &mut StageTracker, stage: ProcessingStage) {
    if let Err(e) = tracker.advance(stage) {
        tracing::error!(error = %e, "Stage tracker rejected transition");
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CriticalCategory, Severity};
    use crate::pipeline::assembler::DISCLAIMERS;
    use crate::pipeline::critical::CriticalData;
    use crate::pipeline::enhancement::{
        DisabledEnhancer, MockBehavior, MockEnhancer, RuleBasedEnhancer,
    };
    use crate::pipeline::safety::tokens::numeric_tokens;
    use crate::test_fixtures;
    use std::time::Duration;

    fn processor(service: Arc<dyn EnhancementService>) -> SummaryProcessor {
        SummaryProcessor::new(SummarizerConfig::default(), service)
    }

    fn rules() -> SummaryProcessor {
        processor(Arc::new(RuleBasedEnhancer))
    }

    // -- Stage tracker ---------------------------------------------------

    #[test]
    fn tracker_moves_forward_only() {
        let mut tracker = StageTracker::new();
        tracker.advance(ProcessingStage::Parsed).unwrap();
        tracker.advance(ProcessingStage::Validated).unwrap();
        let err = tracker.advance(ProcessingStage::Extracted).unwrap_err();
        assert_eq!(err.from, ProcessingStage::Validated);
        assert_eq!(err.to, ProcessingStage::Extracted);
        assert_eq!(tracker.current(), ProcessingStage::Validated);
    }

    #[test]
    fn tracker_is_closed_after_terminal_stage() {
        let mut tracker = StageTracker::new();
        tracker.advance(ProcessingStage::Parsed).unwrap();
        assert_eq!(tracker.fail(), ProcessingStage::Parsed);
        assert!(tracker.advance(ProcessingStage::Assembled).is_err());
        assert_eq!(
            tracker.path(),
            &[ProcessingStage::Received, ProcessingStage::Parsed, ProcessingStage::Failed]
        );
    }

    #[test]
    fn patient_reference_is_stable_and_opaque() {
        let a = patient_reference("patient-1");
        assert_eq!(a, patient_reference("patient-1"));
        assert_ne!(a, patient_reference("patient-2"));
        assert!(!a.to_string().contains("patient-1"));
    }

    // -- End to end ------------------------------------------------------

    #[tokio::test]
    async fn sample_bundle_assembles() {
        let summary = rules().process(&test_fixtures::sample_bundle()).await.unwrap();

        assert_eq!(summary.categories(), CriticalCategory::ALL.to_vec());
        assert!(summary.validation.passed);
        assert_eq!(summary.disclaimers, DISCLAIMERS.to_vec());
        assert_eq!(summary.metadata.entry_count, 15);
        assert_eq!(summary.metadata.opaque_entries, 1);
        assert_eq!(summary.metadata.enhancer, "rules");
        assert_eq!(
            summary.metadata.stages,
            vec![
                ProcessingStage::Received,
                ProcessingStage::Parsed,
                ProcessingStage::Extracted,
                ProcessingStage::Enhanced,
                ProcessingStage::Validated,
                ProcessingStage::Assembled,
            ]
        );
        assert_eq!(summary.metadata.patient_ref, Some(patient_reference("patient-1")));
    }

    #[tokio::test]
    async fn critical_values_are_identical_across_runs() {
        let p = rules();
        let first = p.process(&test_fixtures::sample_bundle()).await.unwrap();
        let second = p.process(&test_fixtures::sample_bundle()).await.unwrap();

        let values = |s: &PatientSummary| -> Vec<CriticalData> {
            s.critical
                .iter()
                .flat_map(|g| g.records.iter().map(|r| r.data.clone()))
                .collect()
        };
        assert_eq!(values(&first), values(&second));
        let hashes = |s: &PatientSummary| -> Vec<String> {
            s.critical
                .iter()
                .flat_map(|g| g.records.iter().map(|r| r.metadata.preservation_hash.clone()))
                .collect()
        };
        assert_eq!(hashes(&first), hashes(&second));
    }

    #[tokio::test]
    async fn medication_values_are_preserved_exactly() {
        let summary = rules().process(&test_fixtures::sample_bundle()).await.unwrap();

        let meds = summary.group(CriticalCategory::Medication).unwrap();
        let CriticalData::Medication(med) = &meds.records[0].data else {
            panic!("expected a medication record");
        };
        assert_eq!(med.dosage.as_deref(), Some("10 mg"));
        assert_eq!(med.frequency.as_deref(), Some("once daily"));
        assert!(!meds.records[0].metadata.ai_processed);
        assert_eq!(
            summary.validation.preserved_fields.get(&CriticalCategory::Medication),
            Some(&true)
        );

        let json = serde_json::to_value(&summary.validation).unwrap();
        assert_eq!(json["preserved_fields"]["medications"], true);
    }

    #[tokio::test]
    async fn enhanced_narratives_add_no_numbers() {
        let summary = rules().process(&test_fixtures::sample_bundle()).await.unwrap();
        assert!(summary.metadata.enhanced_narratives > 0);
        for narrative in summary.narratives.iter().filter(|n| n.ai_processed) {
            let source = numeric_tokens(&narrative.segment.source_text);
            assert!(numeric_tokens(&narrative.enhanced_text).is_subset(&source));
        }
    }

    #[tokio::test]
    async fn fabricating_service_is_reverted() {
        fn add_dose(text: &str) -> String {
            format!("{text} Take 500 mg.")
        }
        let p = processor(Arc::new(MockEnhancer::new(MockBehavior::Transform(add_dose))));
        let summary = p.process(&test_fixtures::narrative_bundle()).await.unwrap();

        assert!(summary.narratives.iter().all(|n| !n.ai_processed));
        assert!(summary
            .narratives
            .iter()
            .all(|n| n.enhanced_text == n.segment.source_text));
        assert_eq!(summary.metadata.reverted_narratives, summary.narratives.len());
        assert!(!summary.validation.narratives_passed);
        assert!(summary.validation.passed);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_service_falls_back_within_budget() {
        let p = processor(Arc::new(MockEnhancer::new(MockBehavior::Hang)));
        let started = Instant::now();
        let summary = p.process(&test_fixtures::narrative_bundle()).await.unwrap();

        assert!(started.elapsed() <= p.config().time_budget);
        for narrative in &summary.narratives {
            assert!(!narrative.ai_processed);
            assert_eq!(narrative.enhanced_text, narrative.segment.source_text);
            assert!(matches!(
                narrative.fallback,
                Some(FallbackReason::Timeout | FallbackReason::BudgetExhausted)
            ));
        }
        assert!(summary
            .validation
            .warnings
            .iter()
            .all(|w| w.code == "enhancement-timeout"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_service_exhausts_shared_budget() {
        let config = SummarizerConfig {
            time_budget: Duration::from_millis(1_000),
            segment_timeout: Duration::from_millis(900),
            max_in_flight: 1,
            ..SummarizerConfig::default()
        };
        let mock = MockEnhancer::new(MockBehavior::Echo).with_delay(Duration::from_millis(600));
        let p = SummaryProcessor::new(config, Arc::new(mock));

        let summary = p.process(&test_fixtures::narrative_bundle()).await.unwrap();

        assert!(summary.metadata.budget_exhausted);
        assert!(summary.metadata.elapsed_ms <= 1_000);
    }

    #[tokio::test]
    async fn missing_dosage_fails_without_summary() {
        let mock = Arc::new(MockEnhancer::new(MockBehavior::Echo));
        let p = processor(mock.clone());

        let failure = p
            .process(&test_fixtures::missing_dosage_bundle())
            .await
            .unwrap_err();

        assert_eq!(failure.stage, ProcessingStage::Validated);
        assert!(matches!(
            failure.error,
            SummaryError::CriticalFieldMissing {
                category: CriticalCategory::Medication,
                field: "dosage",
                ..
            }
        ));
        let report = failure.report();
        assert_eq!(report.code, "critical-data-missing");
        assert!(!report.message.contains("Warfarin"));
        // Enhancement was skipped entirely.
        assert_eq!(mock.calls(), 0);
        assert!(!failure.metadata.stages.contains(&ProcessingStage::Enhanced));
        assert_eq!(failure.metadata.stages.last(), Some(&ProcessingStage::Failed));
    }

    #[tokio::test]
    async fn ordering_bundle_lists_contact_medication_appointment() {
        let summary = rules().process(&test_fixtures::ordering_bundle()).await.unwrap();
        assert_eq!(
            summary.categories(),
            vec![
                CriticalCategory::EmergencyContact,
                CriticalCategory::Medication,
                CriticalCategory::Appointment,
            ]
        );
    }

    #[tokio::test]
    async fn disclaimers_present_even_without_narratives() {
        let p = processor(Arc::new(DisabledEnhancer));
        let summary = p.process(&test_fixtures::ordering_bundle()).await.unwrap();
        assert_eq!(summary.disclaimers.len(), 3);
        for disclaimer in DISCLAIMERS {
            assert!(summary.disclaimers.iter().any(|d| d == disclaimer));
        }
    }

    #[tokio::test]
    async fn malformed_bundle_fails_at_received() {
        let failure = rules().process_str("{\"resourceType\": \"Bundle\"").await.unwrap_err();
        assert_eq!(failure.stage, ProcessingStage::Received);
        assert_eq!(failure.report().code, "invalid");
        assert_eq!(
            failure.metadata.stages,
            vec![ProcessingStage::Received, ProcessingStage::Failed]
        );

        let failure = rules()
            .process(&serde_json::json!({"resourceType": "Bundle", "entry": []}))
            .await
            .unwrap_err();
        assert!(matches!(
            failure.error,
            SummaryError::StructuralValidation(ParseError::EmptyEntries)
        ));
    }

    #[tokio::test]
    async fn disabled_enhancer_reports_unavailable_warnings() {
        let p = processor(Arc::new(DisabledEnhancer));
        let summary = p.process(&test_fixtures::narrative_bundle()).await.unwrap();
        assert!(summary.validation.passed);
        assert_eq!(summary.metadata.enhanced_narratives, 0);
        assert!(summary
            .validation
            .warnings
            .iter()
            .all(|w| w.code == "enhancement-unavailable"));
    }

    #[tokio::test]
    async fn uncommon_lab_value_shapes_assemble() {
        let summary = rules().process(&test_fixtures::lab_shapes_bundle()).await.unwrap();

        let labs = summary.group(CriticalCategory::LabResult).unwrap();
        let values: Vec<Option<&str>> = labs
            .records
            .iter()
            .map(|r| match &r.data {
                CriticalData::LabResult(lab) => lab.value.as_deref(),
                _ => None,
            })
            .collect();
        assert_eq!(values, vec![Some("3"), Some("false"), Some("1/160")]);
        assert!(summary.validation.passed);
        assert!(summary
            .validation
            .warnings
            .iter()
            .any(|w| w.code == "critical-data-missing" && w.severity == Severity::Warning));
    }

    #[tokio::test(start_paused = true)]
    async fn budget_runs_from_request_start() {
        let p = rules();
        let raw = test_fixtures::narrative_bundle().to_string();
        let started = Instant::now();
        let parsed = parse_bundle_str(&raw);
        // Decoding a large body used up the whole budget.
        tokio::time::advance(p.config().time_budget + Duration::from_millis(1)).await;

        let summary = p.run(parsed, started).await.unwrap();
        assert!(summary.metadata.budget_exhausted);
        assert_eq!(summary.metadata.enhanced_narratives, 0);
        assert!(summary.metadata.elapsed_ms > 5_000);
    }
}
