use std::collections::HashSet;

use crate::models::NarrativeCategory;
use crate::pipeline::critical::extract_resource;
use crate::pipeline::parser::fhir::{non_blank, Annotation, CodeableConcept};
use crate::pipeline::parser::{ClinicalBundle, Resource};

use super::types::NarrativeSegment;

/// Candidate text before numbering and overlap filtering.
struct Candidate<'a> {
    category: NarrativeCategory,
    field: &'static str,
    text: &'a str,
}

/// Critical values of a bundle, used to keep them out of narrative candidacy.
///
/// Built straight from the bundle so narrative extraction does not wait on
/// the critical extractor.
struct CriticalIndex {
    values: HashSet<String>,
    free_text: Vec<String>,
}

impl CriticalIndex {
    fn build(bundle: &ClinicalBundle) -> Self {
        let mut values = HashSet::new();
        let mut free_text = Vec::new();

        for entry in &bundle.entries {
            for data in extract_resource(&entry.resource) {
                values.extend(
                    data.fields()
                        .into_iter()
                        .filter_map(|(_, v)| v)
                        .map(normalize),
                );
                free_text.extend(data.free_text().into_iter().map(normalize));
            }
        }

        Self { values, free_text }
    }

    fn overlaps(&self, candidate: &str) -> bool {
        let candidate = normalize(candidate);
        self.values.contains(&candidate)
            || self
                .free_text
                .iter()
                .any(|f| candidate.contains(f.as_str()) || f.contains(candidate.as_str()))
    }
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Collect narrative segments in document order.
pub fn extract_narratives(bundle: &ClinicalBundle) -> Vec<NarrativeSegment> {
    let index = CriticalIndex::build(bundle);
    let mut segments = Vec::new();
    let mut excluded = 0usize;

    for entry in &bundle.entries {
        for candidate in candidates(&entry.resource) {
            let Some(text) = non_blank(Some(candidate.text)) else {
                continue;
            };
            if index.overlaps(text) {
                excluded += 1;
                continue;
            }
            segments.push(NarrativeSegment {
                order: segments.len(),
                category: candidate.category,
                source_text: text.to_string(),
                source: entry.reference(),
                field: candidate.field,
            });
        }
    }

    tracing::debug!(
        segments = segments.len(),
        excluded,
        "Narrative extraction complete"
    );

    segments
}

fn reason_texts(reasons: &[CodeableConcept]) -> impl Iterator<Item = &str> {
    reasons.iter().filter_map(|r| r.text.as_deref())
}

fn note_texts(notes: &[Annotation]) -> impl Iterator<Item = &str> {
    notes.iter().filter_map(|n| n.text.as_deref())
}

fn tag<'a>(category: NarrativeCategory, field: &'static str) -> impl Fn(&'a str) -> Candidate<'a> {
    move |text| Candidate {
        category,
        field,
        text,
    }
}

/// Fixed field-to-category rules per resource type.
fn candidates(resource: &Resource) -> Vec<Candidate<'_>> {
    use NarrativeCategory::*;

    match resource {
        Resource::Encounter(e) => reason_texts(&e.reason_code)
            .map(tag(ChiefComplaint, "reasonCode.text"))
            .collect(),
        Resource::Condition(c) => note_texts(&c.note)
            .map(tag(DiagnosisExplanation, "note.text"))
            .collect(),
        Resource::ClinicalImpression(ci) => ci
            .summary
            .as_deref()
            .into_iter()
            .map(tag(DiagnosisExplanation, "summary"))
            .collect(),
        Resource::MedicationRequest(m) => reason_texts(&m.reason_code)
            .map(tag(DiagnosisExplanation, "reasonCode.text"))
            .collect(),
        Resource::Procedure(p) => {
            let mut out: Vec<Candidate<'_>> = reason_texts(&p.reason_code)
                .map(tag(DiagnosisExplanation, "reasonCode.text"))
                .collect();
            let notes: Vec<&str> = note_texts(&p.note)
                .filter(|t| non_blank(Some(*t)).is_some())
                .collect();
            if notes.is_empty() {
                out.extend(
                    p.code
                        .as_ref()
                        .and_then(|c| c.text.as_deref())
                        .map(tag(ProcedureDescription, "code.text")),
                );
            } else {
                out.extend(notes.into_iter().map(tag(ProcedureDescription, "note.text")));
            }
            out
        }
        Resource::CarePlan(cp) => cp
            .description
            .as_deref()
            .map(tag(CareInstructions, "description"))
            .into_iter()
            .chain(
                cp.activity
                    .iter()
                    .filter_map(|a| a.detail.as_ref()?.description.as_deref())
                    .map(tag(CareInstructions, "activity.detail.description")),
            )
            .chain(note_texts(&cp.note).map(tag(LifestyleGuidance, "note.text")))
            .collect(),
        Resource::Appointment(a) => a
            .patient_instruction
            .as_deref()
            .into_iter()
            .map(tag(CareInstructions, "patientInstruction"))
            .collect(),
        Resource::Goal(g) => g
            .description
            .as_ref()
            .and_then(|d| d.text.as_deref())
            .into_iter()
            .map(tag(LifestyleGuidance, "description.text"))
            .collect(),
        Resource::Communication(c) => c
            .payload
            .iter()
            .filter_map(|p| p.content_string.as_deref())
            .map(tag(WarningSigns, "payload.contentString"))
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::parser::parse_bundle;
    use crate::test_fixtures;
    use serde_json::{json, Value};

    fn narratives(entries: Vec<Value>) -> Vec<NarrativeSegment> {
        let entries: Vec<Value> = entries.into_iter().map(|r| json!({"resource": r})).collect();
        let bundle = parse_bundle(&json!({"resourceType": "Bundle", "entry": entries})).unwrap();
        extract_narratives(&bundle)
    }

    #[test]
    fn sample_bundle_segments_in_document_order() {
        let bundle = parse_bundle(&test_fixtures::sample_bundle()).unwrap();
        let segments = extract_narratives(&bundle);

        let categories: Vec<NarrativeCategory> = segments.iter().map(|s| s.category).collect();
        assert_eq!(
            categories,
            vec![
                NarrativeCategory::DiagnosisExplanation, // medication reason
                NarrativeCategory::CareInstructions,     // appointment instruction
                NarrativeCategory::ChiefComplaint,
                NarrativeCategory::DiagnosisExplanation, // condition note
                NarrativeCategory::CareInstructions,
                NarrativeCategory::CareInstructions,
                NarrativeCategory::LifestyleGuidance,
                NarrativeCategory::WarningSigns,
            ]
        );
        for (i, segment) in segments.iter().enumerate() {
            assert_eq!(segment.order, i);
        }
    }

    #[test]
    fn procedure_note_wins_over_code_text() {
        let with_note = narratives(vec![json!({
            "resourceType": "Procedure",
            "code": {"text": "Echocardiogram"},
            "reasonCode": [{"text": "Check how well the heart pumps"}],
            "note": [{"text": "An ultrasound of the heart was performed."}]
        })]);
        assert_eq!(with_note.len(), 2);
        assert_eq!(with_note[0].category, NarrativeCategory::DiagnosisExplanation);
        assert_eq!(with_note[1].category, NarrativeCategory::ProcedureDescription);
        assert_eq!(with_note[1].field, "note.text");

        let without_note = narratives(vec![json!({
            "resourceType": "Procedure",
            "code": {"text": "Echocardiogram"}
        })]);
        assert_eq!(without_note.len(), 1);
        assert_eq!(without_note[0].source_text, "Echocardiogram");
        assert_eq!(without_note[0].field, "code.text");
    }

    #[test]
    fn goal_and_clinical_impression_rules() {
        let segments = narratives(vec![
            json!({"resourceType": "Goal", "description": {"text": "Lose five pounds"}}),
            json!({"resourceType": "ClinicalImpression", "summary": "Stable angina."}),
        ]);
        assert_eq!(segments[0].category, NarrativeCategory::LifestyleGuidance);
        assert_eq!(segments[1].category, NarrativeCategory::DiagnosisExplanation);
        assert_eq!(segments[1].source.index, 1);
    }

    #[test]
    fn blank_text_is_skipped_and_trimmed() {
        let segments = narratives(vec![json!({
            "resourceType": "Communication",
            "payload": [{"contentString": "   "}, {"contentString": "  Watch for swelling.  "}]
        })]);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].source_text, "Watch for swelling.");
    }

    #[test]
    fn text_equal_to_critical_value_is_excluded() {
        let segments = narratives(vec![
            test_fixtures::medication(),
            json!({"resourceType": "Communication", "payload": [{"contentString": "Lisinopril"}]}),
        ]);
        assert!(segments.iter().all(|s| s.source_text != "Lisinopril"));
    }

    #[test]
    fn text_overlapping_dosage_instructions_is_excluded() {
        let segments = narratives(vec![
            test_fixtures::medication(),
            json!({"resourceType": "CarePlan", "description": "take 1 tablet by mouth once daily"}),
            json!({"resourceType": "CarePlan", "description": "Reminder: Take in the morning with water every day."}),
        ]);
        assert!(segments
            .iter()
            .all(|s| s.category == NarrativeCategory::DiagnosisExplanation));
    }

    #[test]
    fn medication_statement_reason_is_not_a_rule() {
        let segments = narratives(vec![json!({
            "resourceType": "MedicationStatement",
            "reasonCode": [{"text": "For blood pressure"}]
        })]);
        assert!(segments.is_empty());
    }

    #[test]
    fn opaque_entries_contribute_nothing() {
        let segments = narratives(vec![json!({
            "resourceType": "DiagnosticReport",
            "conclusion": "Normal"
        })]);
        assert!(segments.is_empty());
    }
}
