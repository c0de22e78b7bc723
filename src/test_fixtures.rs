//! Bundles shared by unit tests across the pipeline.

use serde_json::{json, Value};

fn entry(resource: Value) -> Value {
    json!({ "resource": resource })
}

fn bundle(entries: Vec<Value>) -> Value {
    json!({
        "resourceType": "Bundle",
        "id": "bundle-1",
        "type": "document",
        "entry": entries,
    })
}

pub fn patient() -> Value {
    json!({
        "resourceType": "Patient",
        "id": "patient-1",
        "contact": [{
            "relationship": [{"text": "Daughter"}],
            "name": {"given": ["Maria"], "family": "Lopez"},
            "telecom": [{"system": "phone", "value": "555-0101"}]
        }]
    })
}

pub fn related_person() -> Value {
    json!({
        "resourceType": "RelatedPerson",
        "id": "rp-1",
        "relationship": [{"coding": [{"display": "Spouse"}]}],
        "name": [{"text": "Jordan Lopez"}],
        "telecom": [
            {"system": "email", "value": "jordan@example.org"},
            {"system": "phone", "value": "555-0199"}
        ]
    })
}

/// Lisinopril 10 mg once daily, with an explanatory reason.
pub fn medication() -> Value {
    json!({
        "resourceType": "MedicationRequest",
        "id": "med-1",
        "status": "active",
        "subject": {"reference": "Patient/patient-1"},
        "medicationCodeableConcept": {
            "coding": [{"system": "http://www.nlm.nih.gov/research/umls/rxnorm", "code": "314076", "display": "Lisinopril 10 MG Oral Tablet"}],
            "text": "Lisinopril"
        },
        "reasonCode": [{"text": "Treats chronic hypertension to lower the risk of stroke."}],
        "dosageInstruction": [{
            "text": "Take 1 tablet by mouth once daily",
            "patientInstruction": "Take in the morning with water",
            "timing": {"code": {"text": "once daily"}},
            "route": {"coding": [{"display": "Oral"}]},
            "doseAndRate": [{"doseQuantity": {"value": 10, "unit": "mg"}}]
        }]
    })
}

pub fn medication_without_dosage() -> Value {
    json!({
        "resourceType": "MedicationRequest",
        "id": "med-2",
        "medicationCodeableConcept": {"text": "Warfarin"},
        "dosageInstruction": [{"timing": {"code": {"text": "once daily"}}}]
    })
}

pub fn lab_observation() -> Value {
    json!({
        "resourceType": "Observation",
        "id": "obs-lab",
        "status": "final",
        "category": [{"coding": [{"code": "laboratory"}]}],
        "code": {"text": "Hemoglobin A1c"},
        "valueQuantity": {"value": 7.2, "unit": "%"},
        "referenceRange": [{"text": "4.0-5.6 %"}],
        "interpretation": [{"text": "High"}],
        "effectiveDateTime": "2024-03-01T08:30:00Z"
    })
}

pub fn vital_observation() -> Value {
    json!({
        "resourceType": "Observation",
        "id": "obs-bp",
        "category": [{"coding": [{"code": "vital-signs"}]}],
        "code": {"text": "Blood pressure"},
        "component": [
            {"code": {"text": "Systolic"}, "valueQuantity": {"value": 128, "unit": "mmHg"}},
            {"code": {"text": "Diastolic"}, "valueQuantity": {"value": 82, "unit": "mmHg"}}
        ],
        "effectiveDateTime": "2024-03-01T08:35:00Z"
    })
}

pub fn appointment() -> Value {
    json!({
        "resourceType": "Appointment",
        "id": "appt-1",
        "status": "booked",
        "description": "Cardiology follow-up",
        "start": "2024-04-02T09:00:00Z",
        "end": "2024-04-02T09:30:00Z",
        "participant": [
            {"actor": {"reference": "Practitioner/pr-1", "display": "Dr. Ana Rivera"}},
            {"actor": {"reference": "Location/loc-1", "display": "Heart Clinic, Room 4"}}
        ],
        "patientInstruction": "Bring a list of every medicine you take."
    })
}

pub fn practitioner() -> Value {
    json!({
        "resourceType": "Practitioner",
        "id": "pr-1",
        "name": [{"prefix": ["Dr."], "given": ["Ana"], "family": "Rivera"}],
        "telecom": [{"system": "phone", "value": "555-0150"}],
        "qualification": [{"code": {"text": "Cardiology"}}]
    })
}

pub fn pharmacy() -> Value {
    json!({
        "resourceType": "Organization",
        "id": "org-ph",
        "name": "Corner Pharmacy",
        "type": [{"text": "Pharmacy"}],
        "telecom": [
            {"system": "phone", "value": "555-0177"},
            {"system": "fax", "value": "555-0178"}
        ],
        "address": [{"line": ["9 Elm St"], "city": "Springfield"}]
    })
}

pub fn coverage() -> Value {
    json!({
        "resourceType": "Coverage",
        "id": "cov-1",
        "status": "active",
        "subscriberId": "MEM-4471",
        "payor": [{"display": "Acme Health"}],
        "class": [
            {"type": {"coding": [{"code": "group"}]}, "value": "GRP-12"},
            {"type": {"coding": [{"code": "plan"}]}, "value": "PLN-3", "name": "Silver"}
        ]
    })
}

pub fn allergy() -> Value {
    json!({
        "resourceType": "AllergyIntolerance",
        "id": "al-1",
        "criticality": "high",
        "code": {"text": "Penicillin"},
        "reaction": [{"manifestation": [{"text": "Hives"}], "severity": "severe"}]
    })
}

pub fn encounter() -> Value {
    json!({
        "resourceType": "Encounter",
        "id": "enc-1",
        "reasonCode": [{"text": "Patient presents with dyspnea on exertion."}]
    })
}

pub fn condition() -> Value {
    json!({
        "resourceType": "Condition",
        "id": "cond-1",
        "code": {"text": "Hypertension"},
        "note": [{"text": "Chronic hypertension, currently well controlled."}]
    })
}

pub fn care_plan() -> Value {
    json!({
        "resourceType": "CarePlan",
        "id": "cp-1",
        "description": "Monitor blood pressure at home prior to breakfast.",
        "activity": [{"detail": {"description": "Walk for 30 minutes most days."}}],
        "note": [{"text": "Reduce salt in your diet."}]
    })
}

pub fn communication() -> Value {
    json!({
        "resourceType": "Communication",
        "id": "com-1",
        "payload": [{"contentString": "Call 911 immediately if you experience syncope or chest pain."}]
    })
}

/// Every resource kind the pipeline understands plus one opaque entry.
pub fn sample_bundle() -> Value {
    bundle(vec![
        entry(patient()),
        entry(medication()),
        entry(lab_observation()),
        entry(vital_observation()),
        entry(appointment()),
        entry(practitioner()),
        entry(pharmacy()),
        entry(coverage()),
        entry(allergy()),
        entry(related_person()),
        entry(encounter()),
        entry(condition()),
        entry(care_plan()),
        entry(communication()),
        entry(json!({"resourceType": "ImagingStudy", "id": "img-1"})),
    ])
}

/// Appointment first, then medication, then emergency contact in document order.
pub fn ordering_bundle() -> Value {
    bundle(vec![
        entry(appointment()),
        entry(medication()),
        entry(related_person()),
    ])
}

pub fn missing_dosage_bundle() -> Value {
    bundle(vec![entry(medication()), entry(medication_without_dosage())])
}

/// Narratives only, no critical records.
pub fn narrative_bundle() -> Value {
    bundle(vec![entry(encounter()), entry(condition()), entry(communication())])
}

/// Lab results in the less common `value[x]` shapes, a panel, and a result
/// withheld with `dataAbsentReason`.
pub fn lab_shapes_bundle() -> Value {
    let lab = |extra: Value| {
        let mut obs = json!({
            "resourceType": "Observation",
            "status": "final",
            "category": [{"coding": [{"code": "laboratory"}]}]
        });
        if let (Some(obs), Some(extra)) = (obs.as_object_mut(), extra.as_object()) {
            obs.extend(extra.clone());
        }
        obs
    };
    bundle(vec![
        entry(medication()),
        entry(lab(json!({"code": {"text": "WBC casts"}, "valueInteger": 3}))),
        entry(lab(json!({"code": {"text": "Pregnancy test"}, "valueBoolean": false}))),
        entry(lab(json!({
            "code": {"text": "ANA titer"},
            "valueRatio": {"numerator": {"value": 1}, "denominator": {"value": 160}}
        }))),
        entry(lab(json!({
            "code": {"text": "CBC panel"},
            "hasMember": [{"reference": "Observation/wbc"}, {"reference": "Observation/hgb"}]
        }))),
        entry(lab(json!({
            "code": {"text": "Potassium"},
            "dataAbsentReason": {"text": "Specimen hemolyzed"}
        }))),
    ])
}
