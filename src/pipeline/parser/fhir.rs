//! Typed views over the FHIR R4 resources the pipeline understands.
//!
//! Every field is optional and unknown keys are ignored: the parser only
//! rejects a body when a known key carries the wrong JSON type.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

// ═══════════════════════════════════════════════════════════
// Data types
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Coding {
    pub system: Option<String>,
    pub code: Option<String>,
    pub display: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CodeableConcept {
    pub coding: Vec<Coding>,
    pub text: Option<String>,
}

impl CodeableConcept {
    /// Human label: `text`, else the first coding with a display.
    pub fn label(&self) -> Option<&str> {
        non_blank(self.text.as_deref()).or_else(|| {
            self.coding
                .iter()
                .find_map(|c| non_blank(c.display.as_deref()))
        })
    }

    /// True when `text`, any code, or any display equals `needle` (case-insensitive).
    pub fn mentions(&self, needle: &str) -> bool {
        let hit = |s: &Option<String>| {
            s.as_deref()
                .is_some_and(|v| v.trim().eq_ignore_ascii_case(needle))
        };
        hit(&self.text) || self.coding.iter().any(|c| hit(&c.code) || hit(&c.display))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Reference {
    pub reference: Option<String>,
    pub display: Option<String>,
}

/// `value` stays raw so the extractor can coerce numbers and numeric strings
/// without losing the original literal.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Quantity {
    pub value: Option<Value>,
    pub unit: Option<String>,
    pub code: Option<String>,
    pub system: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Annotation {
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactPoint {
    pub system: Option<String>,
    pub value: Option<String>,
    #[serde(rename = "use")]
    pub use_: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HumanName {
    pub text: Option<String>,
    pub family: Option<String>,
    pub given: Vec<String>,
    pub prefix: Vec<String>,
}

impl HumanName {
    /// `text` if present, else prefix + given + family joined by single spaces.
    pub fn display(&self) -> Option<String> {
        if let Some(text) = non_blank(self.text.as_deref()) {
            return Some(text.to_string());
        }
        let parts: Vec<&str> = self
            .prefix
            .iter()
            .chain(self.given.iter())
            .map(|s| s.trim())
            .chain(self.family.as_deref().map(str::trim))
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub text: Option<String>,
    pub line: Vec<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

impl Address {
    pub fn display(&self) -> Option<String> {
        if let Some(text) = non_blank(self.text.as_deref()) {
            return Some(text.to_string());
        }
        let parts: Vec<&str> = self
            .line
            .iter()
            .map(|s| s.trim())
            .chain(
                [&self.city, &self.state, &self.postal_code, &self.country]
                    .into_iter()
                    .filter_map(|s| s.as_deref().map(str::trim)),
            )
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimingRepeat {
    pub frequency: Option<Value>,
    pub period: Option<Value>,
    pub period_unit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Timing {
    pub repeat: Option<TimingRepeat>,
    pub code: Option<CodeableConcept>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DoseAndRate {
    pub dose_quantity: Option<Quantity>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Dosage {
    pub text: Option<String>,
    pub patient_instruction: Option<String>,
    pub timing: Option<Timing>,
    pub route: Option<CodeableConcept>,
    pub dose_and_rate: Vec<DoseAndRate>,
}

// ═══════════════════════════════════════════════════════════
// Resources
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientContact {
    pub relationship: Vec<CodeableConcept>,
    pub name: Option<HumanName>,
    pub telecom: Vec<ContactPoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Patient {
    pub id: Option<String>,
    pub contact: Vec<PatientContact>,
}

/// Shared by MedicationRequest and MedicationStatement (`dosage` is aliased).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MedicationOrder {
    pub id: Option<String>,
    pub status: Option<String>,
    pub medication_codeable_concept: Option<CodeableConcept>,
    pub medication_reference: Option<Reference>,
    #[serde(alias = "dosage")]
    pub dosage_instruction: Vec<Dosage>,
    pub reason_code: Vec<CodeableConcept>,
    pub note: Vec<Annotation>,
    pub subject: Option<Reference>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Range {
    pub low: Option<Quantity>,
    pub high: Option<Quantity>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Ratio {
    pub numerator: Option<Quantity>,
    pub denominator: Option<Quantity>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Period {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// The `value[x]` choice shared by an observation and its components.
/// At most one variant is expected; readers take the first present in
/// declaration order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObservationValue {
    pub value_quantity: Option<Quantity>,
    pub value_codeable_concept: Option<CodeableConcept>,
    pub value_string: Option<String>,
    pub value_boolean: Option<bool>,
    /// Raw so an out-of-range literal is kept rather than rejected.
    pub value_integer: Option<Value>,
    pub value_range: Option<Range>,
    pub value_ratio: Option<Ratio>,
    pub value_time: Option<String>,
    pub value_date_time: Option<String>,
    pub value_period: Option<Period>,
}

impl ObservationValue {
    pub fn is_present(&self) -> bool {
        self.value_quantity.is_some()
            || self.value_codeable_concept.is_some()
            || non_blank(self.value_string.as_deref()).is_some()
            || self.value_boolean.is_some()
            || self.value_integer.is_some()
            || self.value_range.is_some()
            || self.value_ratio.is_some()
            || non_blank(self.value_time.as_deref()).is_some()
            || non_blank(self.value_date_time.as_deref()).is_some()
            || self.value_period.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObservationComponent {
    pub code: Option<CodeableConcept>,
    #[serde(flatten)]
    pub value: ObservationValue,
    pub data_absent_reason: Option<CodeableConcept>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReferenceRange {
    pub low: Option<Quantity>,
    pub high: Option<Quantity>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Observation {
    pub id: Option<String>,
    pub status: Option<String>,
    pub category: Vec<CodeableConcept>,
    pub code: Option<CodeableConcept>,
    #[serde(flatten)]
    pub value: ObservationValue,
    pub data_absent_reason: Option<CodeableConcept>,
    pub has_member: Vec<Reference>,
    pub component: Vec<ObservationComponent>,
    pub reference_range: Vec<ReferenceRange>,
    pub interpretation: Vec<CodeableConcept>,
    pub effective_date_time: Option<String>,
}

impl Observation {
    pub fn is_vital_sign(&self) -> bool {
        self.category.iter().any(|c| c.mentions("vital-signs"))
    }

    /// Laboratory category, or no category at all.
    pub fn is_laboratory(&self) -> bool {
        self.category.is_empty() || self.category.iter().any(|c| c.mentions("laboratory"))
    }

    /// Grouping observation: no value of its own, results live in `hasMember`.
    pub fn is_panel(&self) -> bool {
        !self.value.is_present() && self.component.is_empty() && !self.has_member.is_empty()
    }

    /// The source states why there is no value, and no component has one.
    pub fn is_data_absent(&self) -> bool {
        !self.value.is_present()
            && self.data_absent_reason.is_some()
            && self.component.iter().all(|c| !c.value.is_present())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppointmentParticipant {
    pub actor: Option<Reference>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Appointment {
    pub id: Option<String>,
    pub status: Option<String>,
    pub description: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub appointment_type: Option<CodeableConcept>,
    pub participant: Vec<AppointmentParticipant>,
    pub patient_instruction: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Qualification {
    pub code: Option<CodeableConcept>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Practitioner {
    pub id: Option<String>,
    pub name: Vec<HumanName>,
    pub telecom: Vec<ContactPoint>,
    pub address: Vec<Address>,
    pub qualification: Vec<Qualification>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Organization {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub type_: Vec<CodeableConcept>,
    pub telecom: Vec<ContactPoint>,
    pub address: Vec<Address>,
}

impl Organization {
    pub fn is_pharmacy(&self) -> bool {
        self.type_.iter().any(|t| {
            t.mentions("pharmacy")
                || t.mentions("pharm")
                || t.label()
                    .is_some_and(|l| l.to_ascii_lowercase().contains("pharmacy"))
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoverageClass {
    #[serde(rename = "type")]
    pub type_: Option<CodeableConcept>,
    pub value: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Coverage {
    pub id: Option<String>,
    pub status: Option<String>,
    pub payor: Vec<Reference>,
    pub subscriber_id: Option<String>,
    #[serde(rename = "type")]
    pub type_: Option<CodeableConcept>,
    pub class: Vec<CoverageClass>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelatedPerson {
    pub id: Option<String>,
    pub name: Vec<HumanName>,
    pub telecom: Vec<ContactPoint>,
    pub relationship: Vec<CodeableConcept>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AllergyReaction {
    pub manifestation: Vec<CodeableConcept>,
    pub severity: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AllergyIntolerance {
    pub id: Option<String>,
    pub code: Option<CodeableConcept>,
    pub criticality: Option<String>,
    pub reaction: Vec<AllergyReaction>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Encounter {
    pub id: Option<String>,
    pub reason_code: Vec<CodeableConcept>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Condition {
    pub id: Option<String>,
    pub code: Option<CodeableConcept>,
    pub note: Vec<Annotation>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Procedure {
    pub id: Option<String>,
    pub code: Option<CodeableConcept>,
    pub reason_code: Vec<CodeableConcept>,
    pub note: Vec<Annotation>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CarePlanDetail {
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CarePlanActivity {
    pub detail: Option<CarePlanDetail>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CarePlan {
    pub id: Option<String>,
    pub description: Option<String>,
    pub activity: Vec<CarePlanActivity>,
    pub note: Vec<Annotation>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommunicationPayload {
    pub content_string: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Communication {
    pub id: Option<String>,
    pub payload: Vec<CommunicationPayload>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Goal {
    pub id: Option<String>,
    pub description: Option<CodeableConcept>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClinicalImpression {
    pub id: Option<String>,
    pub summary: Option<String>,
}

/// Closed set of resource variants, dispatched on `resourceType`.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Patient(Patient),
    MedicationRequest(MedicationOrder),
    MedicationStatement(MedicationOrder),
    Observation(Observation),
    Appointment(Appointment),
    Practitioner(Practitioner),
    Organization(Organization),
    Coverage(Coverage),
    RelatedPerson(RelatedPerson),
    AllergyIntolerance(AllergyIntolerance),
    Encounter(Encounter),
    Condition(Condition),
    Procedure(Procedure),
    CarePlan(CarePlan),
    Communication(Communication),
    Goal(Goal),
    ClinicalImpression(ClinicalImpression),
    /// Unrecognized type, carried through and ignored downstream.
    Opaque { resource_type: String },
    /// Recognized type whose body has the wrong shape.
    Unreadable { resource_type: String, reason: String },
}

impl Resource {
    /// Build the typed variant from a raw resource object.
    pub fn from_value(value: &Value) -> Resource {
        let Some(tag) = value.get("resourceType").and_then(Value::as_str) else {
            return Resource::Opaque {
                resource_type: String::new(),
            };
        };

        match tag {
            "Patient" => typed(tag, value, Resource::Patient),
            "MedicationRequest" => typed(tag, value, Resource::MedicationRequest),
            "MedicationStatement" => typed(tag, value, Resource::MedicationStatement),
            "Observation" => typed(tag, value, Resource::Observation),
            "Appointment" => typed(tag, value, Resource::Appointment),
            "Practitioner" => typed(tag, value, Resource::Practitioner),
            "Organization" => typed(tag, value, Resource::Organization),
            "Coverage" => typed(tag, value, Resource::Coverage),
            "RelatedPerson" => typed(tag, value, Resource::RelatedPerson),
            "AllergyIntolerance" => typed(tag, value, Resource::AllergyIntolerance),
            "Encounter" => typed(tag, value, Resource::Encounter),
            "Condition" => typed(tag, value, Resource::Condition),
            "Procedure" => typed(tag, value, Resource::Procedure),
            "CarePlan" => typed(tag, value, Resource::CarePlan),
            "Communication" => typed(tag, value, Resource::Communication),
            "Goal" => typed(tag, value, Resource::Goal),
            "ClinicalImpression" => typed(tag, value, Resource::ClinicalImpression),
            other => Resource::Opaque {
                resource_type: other.to_string(),
            },
        }
    }

    pub fn resource_type(&self) -> &str {
        match self {
            Resource::Patient(_) => "Patient",
            Resource::MedicationRequest(_) => "MedicationRequest",
            Resource::MedicationStatement(_) => "MedicationStatement",
            Resource::Observation(_) => "Observation",
            Resource::Appointment(_) => "Appointment",
            Resource::Practitioner(_) => "Practitioner",
            Resource::Organization(_) => "Organization",
            Resource::Coverage(_) => "Coverage",
            Resource::RelatedPerson(_) => "RelatedPerson",
            Resource::AllergyIntolerance(_) => "AllergyIntolerance",
            Resource::Encounter(_) => "Encounter",
            Resource::Condition(_) => "Condition",
            Resource::Procedure(_) => "Procedure",
            Resource::CarePlan(_) => "CarePlan",
            Resource::Communication(_) => "Communication",
            Resource::Goal(_) => "Goal",
            Resource::ClinicalImpression(_) => "ClinicalImpression",
            Resource::Opaque { resource_type } | Resource::Unreadable { resource_type, .. } => {
                resource_type.as_str()
            }
        }
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self, Resource::Opaque { .. })
    }
}

fn typed<T, F>(tag: &str, value: &Value, wrap: F) -> Resource
where
    T: DeserializeOwned,
    F: FnOnce(T) -> Resource,
{
    match T::deserialize(value) {
        Ok(parsed) => wrap(parsed),
        // serde messages can quote field values; keep only the shape complaint.
        Err(_) => Resource::Unreadable {
            resource_type: tag.to_string(),
            reason: format!("{tag} body does not match the expected shape"),
        },
    }
}

/// Trimmed, non-empty view of an optional string.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn codeable_concept_prefers_text() {
        let cc: CodeableConcept = serde_json::from_value(json!({
            "coding": [{"display": "Lisinopril 10 MG Oral Tablet"}],
            "text": "Lisinopril 10mg"
        }))
        .unwrap();
        assert_eq!(cc.label(), Some("Lisinopril 10mg"));
    }

    #[test]
    fn codeable_concept_falls_back_to_display() {
        let cc: CodeableConcept = serde_json::from_value(json!({
            "coding": [{"code": "x"}, {"display": "  Oral route "}],
            "text": "   "
        }))
        .unwrap();
        assert_eq!(cc.label(), Some("Oral route"));
    }

    #[test]
    fn human_name_joins_parts() {
        let name: HumanName = serde_json::from_value(json!({
            "family": "Rivera",
            "given": ["Ana", "Lucia"],
            "prefix": ["Dr."]
        }))
        .unwrap();
        assert_eq!(name.display().as_deref(), Some("Dr. Ana Lucia Rivera"));
    }

    #[test]
    fn address_joins_lines_and_city() {
        let address: Address = serde_json::from_value(json!({
            "line": ["12 Main St"],
            "city": "Springfield",
            "postalCode": "01101"
        }))
        .unwrap();
        assert_eq!(address.display().as_deref(), Some("12 Main St, Springfield, 01101"));
    }

    #[test]
    fn known_type_dispatches_to_variant() {
        let resource = Resource::from_value(&json!({
            "resourceType": "MedicationRequest",
            "id": "m1",
            "medicationCodeableConcept": {"text": "Metformin"}
        }));
        assert!(matches!(resource, Resource::MedicationRequest(_)));
        assert_eq!(resource.resource_type(), "MedicationRequest");
    }

    #[test]
    fn medication_statement_reads_dosage_alias() {
        let resource = Resource::from_value(&json!({
            "resourceType": "MedicationStatement",
            "dosage": [{"text": "1 tablet daily"}]
        }));
        match resource {
            Resource::MedicationStatement(order) => {
                assert_eq!(order.dosage_instruction.len(), 1);
            }
            other => panic!("expected MedicationStatement, got {other:?}"),
        }
    }

    #[test]
    fn unknown_type_is_opaque() {
        let resource = Resource::from_value(&json!({"resourceType": "ImagingStudy"}));
        assert!(resource.is_opaque());
        assert_eq!(resource.resource_type(), "ImagingStudy");
    }

    #[test]
    fn wrong_shape_is_unreadable_without_echoing_values() {
        let resource = Resource::from_value(&json!({
            "resourceType": "Observation",
            "status": 42,
            "valueString": "secret value"
        }));
        match resource {
            Resource::Unreadable { resource_type, reason } => {
                assert_eq!(resource_type, "Observation");
                assert!(!reason.contains("42"));
                assert!(!reason.contains("secret"));
            }
            other => panic!("expected Unreadable, got {other:?}"),
        }
    }

    #[test]
    fn observation_category_helpers() {
        let vital: Observation = serde_json::from_value(json!({
            "category": [{"coding": [{"code": "vital-signs"}]}]
        }))
        .unwrap();
        assert!(vital.is_vital_sign());
        assert!(!vital.is_laboratory());

        let uncategorized = Observation::default();
        assert!(uncategorized.is_laboratory());
    }

    #[test]
    fn observation_reads_every_value_choice() {
        let choices = [
            json!({"valueInteger": 3}),
            json!({"valueBoolean": false}),
            json!({"valueRange": {"low": {"value": 1}}}),
            json!({"valueRatio": {"numerator": {"value": 1}, "denominator": {"value": 128}}}),
            json!({"valueTime": "08:30:00"}),
            json!({"valueDateTime": "2024-03-01"}),
            json!({"valuePeriod": {"start": "2024-03-01"}}),
        ];
        for choice in choices {
            let obs: Observation = serde_json::from_value(choice.clone()).unwrap();
            assert!(obs.value.is_present(), "{choice} not read");
        }
    }

    #[test]
    fn panel_and_absent_value_are_recognized() {
        let panel: Observation = serde_json::from_value(json!({
            "code": {"text": "CBC panel"},
            "hasMember": [{"reference": "Observation/wbc"}]
        }))
        .unwrap();
        assert!(panel.is_panel());
        assert!(!panel.is_data_absent());

        let absent: Observation = serde_json::from_value(json!({
            "code": {"text": "Potassium"},
            "dataAbsentReason": {"text": "Specimen hemolyzed"}
        }))
        .unwrap();
        assert!(absent.is_data_absent());
        assert!(!absent.is_panel());

        let bp: Observation = serde_json::from_value(json!({
            "dataAbsentReason": {"text": "not applicable"},
            "component": [{"valueQuantity": {"value": 120}}]
        }))
        .unwrap();
        assert!(!bp.is_data_absent());
    }

    #[test]
    fn organization_pharmacy_detection() {
        let org: Organization = serde_json::from_value(json!({
            "name": "Corner Drugs",
            "type": [{"text": "Retail Pharmacy"}]
        }))
        .unwrap();
        assert!(org.is_pharmacy());

        let clinic: Organization = serde_json::from_value(json!({
            "name": "Heart Clinic",
            "type": [{"coding": [{"code": "prov"}]}]
        }))
        .unwrap();
        assert!(!clinic.is_pharmacy());
    }
}
