//! Maps typed resources to exact-preservation records.
//!
//! Extraction trims whitespace and renders numbers; it never paraphrases,
//! rounds or converts units. The same functions re-derive records during
//! validation, so everything here must be a pure function of the resource.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::models::{CriticalCategory, ProcessingType, Severity};
use crate::pipeline::parser::fhir::{
    non_blank, AllergyIntolerance, Appointment, ContactPoint, Coverage, MedicationOrder,
    Observation, ObservationValue, Organization, Patient, Period, Practitioner, Quantity, Range,
    Ratio, RelatedPerson, Timing,
};
use crate::pipeline::parser::{BundleEntry, ClinicalBundle, Resource};

use super::hash::preservation_hash;
use super::types::*;

// ═══════════════════════════════════════════════════════════
// Bundle-level extraction
// ═══════════════════════════════════════════════════════════

/// Extract every critical record in document order.
///
/// A missing required field marks that record invalid and records an issue;
/// the issue is fatal only for life-critical categories.
pub fn extract_critical(
    bundle: &ClinicalBundle,
    processed_at: DateTime<Utc>,
) -> CriticalExtraction {
    let mut extraction = CriticalExtraction::default();

    for entry in &bundle.entries {
        extract_entry_into(entry, processed_at, &mut extraction);
    }

    tracing::debug!(
        records = extraction.records.len(),
        issues = extraction.issues.len(),
        fatal = extraction.has_fatal(),
        "Critical extraction complete"
    );

    extraction
}

fn extract_entry_into(
    entry: &BundleEntry,
    processed_at: DateTime<Utc>,
    extraction: &mut CriticalExtraction,
) {
    let source = entry.reference();

    if let Resource::Unreadable { resource_type, .. } = &entry.resource {
        if let Some(category) = category_for_type(resource_type) {
            extraction.issues.push(FieldIssue {
                category,
                resource: source,
                field: "resource",
                severity: missing_severity(category),
            });
        }
        return;
    }

    if let Resource::Observation(o) = &entry.resource {
        if let Some(category) = absent_value_category(o) {
            extraction.issues.push(FieldIssue {
                category,
                resource: source,
                field: "value",
                severity: Severity::Warning,
            });
            return;
        }
    }

    for (position, data) in extract_resource(&entry.resource).into_iter().enumerate() {
        let category = data.category();
        let missing = data.missing_required();

        for &field in &missing {
            extraction.issues.push(FieldIssue {
                category,
                resource: source.clone(),
                field,
                severity: missing_severity(category),
            });
        }
        for field in data.missing_advisory() {
            extraction.issues.push(FieldIssue {
                category,
                resource: source.clone(),
                field,
                severity: Severity::Warning,
            });
        }

        let metadata = RecordMetadata {
            processed_at,
            safety_level: category.safety_level(),
            processing_type: ProcessingType::Preserved,
            ai_processed: false,
            validation_passed: missing.is_empty(),
            validation_errors: missing
                .iter()
                .map(|field| format!("Missing required field '{field}'"))
                .collect(),
            preservation_hash: preservation_hash(&data.fields()),
        };

        extraction.records.push(CriticalRecord {
            source: source.clone(),
            position,
            data,
            metadata,
        });
    }
}

fn missing_severity(category: CriticalCategory) -> Severity {
    if category.is_life_critical() {
        Severity::Fatal
    } else {
        Severity::Error
    }
}

/// Lab or vital observation whose source explains the missing value.
/// Reported, never treated as a dropped required field.
fn absent_value_category(o: &Observation) -> Option<CriticalCategory> {
    if !o.is_data_absent() {
        None
    } else if o.is_vital_sign() {
        Some(CriticalCategory::VitalSign)
    } else if o.is_laboratory() {
        Some(CriticalCategory::LabResult)
    } else {
        None
    }
}

/// Category an unreadable entry of this type would have produced.
fn category_for_type(resource_type: &str) -> Option<CriticalCategory> {
    match resource_type {
        "AllergyIntolerance" => Some(CriticalCategory::CriticalAlert),
        "Patient" | "RelatedPerson" => Some(CriticalCategory::EmergencyContact),
        "MedicationRequest" | "MedicationStatement" => Some(CriticalCategory::Medication),
        // Category unknown without the body; treat as the stricter of the two.
        "Observation" => Some(CriticalCategory::LabResult),
        "Appointment" => Some(CriticalCategory::Appointment),
        "Practitioner" | "Organization" => Some(CriticalCategory::ProviderContact),
        "Coverage" => Some(CriticalCategory::InsuranceInfo),
        _ => None,
    }
}

/// Critical payloads for one resource. Non-critical variants yield nothing.
pub fn extract_resource(resource: &Resource) -> Vec<CriticalData> {
    match resource {
        Resource::AllergyIntolerance(a) => vec![CriticalData::CriticalAlert(allergy(a))],
        Resource::Patient(p) => patient_contacts(p),
        Resource::RelatedPerson(r) => vec![CriticalData::EmergencyContact(related_person(r))],
        Resource::MedicationRequest(m) | Resource::MedicationStatement(m) => {
            vec![CriticalData::Medication(medication(m))]
        }
        Resource::Observation(o) => observation(o).into_iter().collect(),
        Resource::Appointment(a) => vec![CriticalData::Appointment(appointment(a))],
        Resource::Practitioner(p) => vec![CriticalData::ProviderContact(practitioner(p))],
        Resource::Organization(o) => vec![organization(o)],
        Resource::Coverage(c) => vec![CriticalData::Insurance(coverage(c))],
        _ => Vec::new(),
    }
}

// ═══════════════════════════════════════════════════════════
// Per-resource mappers
// ═══════════════════════════════════════════════════════════

fn owned(value: Option<&str>) -> Option<String> {
    non_blank(value).map(str::to_string)
}

fn allergy(a: &AllergyIntolerance) -> AlertData {
    let manifestations: Vec<&str> = a
        .reaction
        .iter()
        .flat_map(|r| r.manifestation.iter())
        .filter_map(|m| m.label())
        .collect();

    AlertData {
        substance: owned(a.code.as_ref().and_then(|c| c.label())),
        reaction: (!manifestations.is_empty()).then(|| manifestations.join(", ")),
        criticality: owned(a.criticality.as_deref()),
        severity: a
            .reaction
            .iter()
            .find_map(|r| owned(r.severity.as_deref())),
    }
}

fn patient_contacts(p: &Patient) -> Vec<CriticalData> {
    p.contact
        .iter()
        .map(|c| {
            CriticalData::EmergencyContact(EmergencyContactData {
                name: c.name.as_ref().and_then(|n| n.display()),
                phone: telecom(&c.telecom, "phone"),
                relationship: c.relationship.iter().find_map(|r| owned(r.label())),
            })
        })
        .collect()
}

fn related_person(r: &RelatedPerson) -> EmergencyContactData {
    EmergencyContactData {
        name: r.name.iter().find_map(|n| n.display()),
        phone: telecom(&r.telecom, "phone"),
        relationship: r.relationship.iter().find_map(|c| owned(c.label())),
    }
}

/// Only the first dosage instruction is preserved.
fn medication(m: &MedicationOrder) -> MedicationData {
    let name = m
        .medication_codeable_concept
        .as_ref()
        .and_then(|c| c.label())
        .or_else(|| {
            m.medication_reference
                .as_ref()
                .and_then(|r| non_blank(r.display.as_deref()))
        });

    let dosage = m.dosage_instruction.first();

    MedicationData {
        name: owned(name),
        dosage: dosage.and_then(|d| {
            d.dose_and_rate
                .iter()
                .find_map(|dr| dr.dose_quantity.as_ref())
                .and_then(quantity_text)
        }),
        frequency: dosage.and_then(|d| d.timing.as_ref()).and_then(frequency_text),
        route: dosage.and_then(|d| owned(d.route.as_ref().and_then(|r| r.label()))),
        instructions: dosage.and_then(|d| owned(d.text.as_deref())),
        patient_instruction: dosage.and_then(|d| owned(d.patient_instruction.as_deref())),
        status: owned(m.status.as_deref()),
    }
}

/// Panels and observations with a stated absence yield no record: panel
/// results arrive as their own member entries.
fn observation(o: &Observation) -> Option<CriticalData> {
    if o.is_panel() || o.is_data_absent() {
        return None;
    }

    let name = owned(o.code.as_ref().and_then(|c| c.label()));
    let effective = owned(o.effective_date_time.as_deref());

    if o.is_vital_sign() {
        let (value, unit) = match observation_value(o) {
            Some(found) => found,
            None => component_value(o),
        };
        return Some(CriticalData::VitalSign(VitalSignData {
            measurement: name,
            value,
            unit,
            effective,
        }));
    }

    if !o.is_laboratory() {
        return None;
    }

    let (value, unit) = observation_value(o).unwrap_or_default();
    Some(CriticalData::LabResult(LabResultData {
        test_name: name,
        value,
        unit,
        reference_range: o.reference_range.first().and_then(|r| {
            owned(r.text.as_deref()).or_else(|| {
                let low = r.low.as_ref().and_then(|q| q.value.as_ref()).and_then(number_text)?;
                let high = r.high.as_ref().and_then(|q| q.value.as_ref()).and_then(number_text)?;
                let unit = r
                    .low
                    .as_ref()
                    .and_then(|q| owned(q.unit.as_deref()))
                    .map(|u| format!(" {u}"))
                    .unwrap_or_default();
                Some(format!("{low}-{high}{unit}"))
            })
        }),
        interpretation: o.interpretation.iter().find_map(|i| owned(i.label())),
        effective,
        status: owned(o.status.as_deref()),
    }))
}

/// Top-level value and its unit, if the observation has one.
fn observation_value(o: &Observation) -> Option<(Option<String>, Option<String>)> {
    value_text(&o.value)
}

/// Rendered `value[x]` and its unit. `Some` whenever a choice is present,
/// even if it could not be rendered, so a malformed value still counts as
/// missing rather than falling through to components.
fn value_text(v: &ObservationValue) -> Option<(Option<String>, Option<String>)> {
    if let Some(q) = &v.value_quantity {
        let value = q.value.as_ref().and_then(number_text);
        return Some((value, quantity_unit(q)));
    }
    if let Some(c) = &v.value_codeable_concept {
        return Some((owned(c.label()), None));
    }
    if let Some(s) = owned(v.value_string.as_deref()) {
        return Some((Some(s), None));
    }
    if let Some(b) = v.value_boolean {
        return Some((Some(b.to_string()), None));
    }
    if let Some(n) = &v.value_integer {
        return Some((number_text(n), None));
    }
    if let Some(r) = &v.value_range {
        return Some(range_text(r));
    }
    if let Some(r) = &v.value_ratio {
        return Some((ratio_text(r), None));
    }
    if let Some(t) = owned(v.value_time.as_deref()) {
        return Some((Some(t), None));
    }
    if let Some(t) = owned(v.value_date_time.as_deref()) {
        return Some((Some(t), None));
    }
    v.value_period.as_ref().map(|p| (period_text(p), None))
}

/// Components joined with "/" (blood pressure style) when they share a unit.
fn component_value(o: &Observation) -> (Option<String>, Option<String>) {
    let parts: Vec<(String, Option<String>)> = o
        .component
        .iter()
        .filter_map(|c| match value_text(&c.value)? {
            (Some(value), unit) => Some((value, unit)),
            (None, _) => None,
        })
        .collect();

    if parts.is_empty() || parts.len() != o.component.len() {
        return (None, None);
    }

    let first_unit = parts[0].1.clone();
    if parts.iter().all(|(_, unit)| *unit == first_unit) {
        let joined: Vec<&str> = parts.iter().map(|(v, _)| v.as_str()).collect();
        (Some(joined.join("/")), first_unit)
    } else {
        let joined: Vec<String> = parts
            .into_iter()
            .map(|(v, unit)| match unit {
                Some(u) => format!("{v} {u}"),
                None => v,
            })
            .collect();
        (Some(joined.join("/")), None)
    }
}

fn appointment(a: &Appointment) -> AppointmentData {
    let actor_display = |prefix: &str| {
        a.participant.iter().find_map(|p| {
            let actor = p.actor.as_ref()?;
            let is_kind = actor
                .reference
                .as_deref()
                .is_some_and(|r| r.starts_with(prefix));
            if is_kind {
                owned(actor.display.as_deref())
            } else {
                None
            }
        })
    };

    AppointmentData {
        start: owned(a.start.as_deref()),
        end: owned(a.end.as_deref()),
        description: owned(a.description.as_deref()),
        status: owned(a.status.as_deref()),
        appointment_type: owned(a.appointment_type.as_ref().and_then(|t| t.label())),
        practitioner: actor_display("Practitioner/"),
        location: actor_display("Location/"),
    }
}

fn practitioner(p: &Practitioner) -> ProviderContactData {
    ProviderContactData {
        name: p.name.iter().find_map(|n| n.display()),
        specialty: p
            .qualification
            .iter()
            .find_map(|q| owned(q.code.as_ref().and_then(|c| c.label()))),
        phone: telecom(&p.telecom, "phone"),
        email: telecom(&p.telecom, "email"),
        address: p.address.iter().find_map(|a| a.display()),
    }
}

fn organization(o: &Organization) -> CriticalData {
    let address = o.address.iter().find_map(|a| a.display());
    if o.is_pharmacy() {
        CriticalData::Pharmacy(PharmacyData {
            name: owned(o.name.as_deref()),
            phone: telecom(&o.telecom, "phone"),
            fax: telecom(&o.telecom, "fax"),
            address,
        })
    } else {
        CriticalData::ProviderContact(ProviderContactData {
            name: owned(o.name.as_deref()),
            specialty: o.type_.iter().find_map(|t| owned(t.label())),
            phone: telecom(&o.telecom, "phone"),
            email: telecom(&o.telecom, "email"),
            address,
        })
    }
}

fn coverage(c: &Coverage) -> InsuranceData {
    let class_value = |kind: &str| {
        c.class
            .iter()
            .filter(|cl| cl.type_.as_ref().is_some_and(|t| t.mentions(kind)))
            .find_map(|cl| owned(cl.value.as_deref()))
    };

    InsuranceData {
        payor: c.payor.iter().find_map(|p| owned(p.display.as_deref())),
        member_id: owned(c.subscriber_id.as_deref()),
        plan: class_value("plan"),
        group: class_value("group"),
        status: owned(c.status.as_deref()),
    }
}

// ═══════════════════════════════════════════════════════════
// Value rendering
// ═══════════════════════════════════════════════════════════

fn telecom(points: &[ContactPoint], system: &str) -> Option<String> {
    points
        .iter()
        .filter(|p| p.system.as_deref().is_some_and(|s| s.eq_ignore_ascii_case(system)))
        .find_map(|p| owned(p.value.as_deref()))
}

fn quantity_unit(q: &Quantity) -> Option<String> {
    owned(q.unit.as_deref()).or_else(|| owned(q.code.as_deref()))
}

/// "{value} {unit}", or just the value when no unit is given.
fn quantity_text(q: &Quantity) -> Option<String> {
    let value = q.value.as_ref().and_then(number_text)?;
    Some(match quantity_unit(q) {
        Some(unit) => format!("{value} {unit}"),
        None => value,
    })
}

/// JSON numbers render canonically (`2.50` as `2.5`); numeric strings are
/// kept as written after trimming. Anything else is treated as absent.
pub fn number_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed.parse::<f64>().ok().filter(|n| n.is_finite())?;
            Some(trimmed.to_string())
        }
        _ => None,
    }
}

/// "low-high" with the shared unit. An open side renders as ">=low" or "<=high".
fn range_text(r: &Range) -> (Option<String>, Option<String>) {
    let low = r.low.as_ref().and_then(|q| q.value.as_ref()).and_then(number_text);
    let high = r.high.as_ref().and_then(|q| q.value.as_ref()).and_then(number_text);
    let unit = r
        .low
        .as_ref()
        .and_then(quantity_unit)
        .or_else(|| r.high.as_ref().and_then(quantity_unit));
    let value = match (low, high) {
        (Some(low), Some(high)) => Some(format!("{low}-{high}")),
        (Some(low), None) => Some(format!(">={low}")),
        (None, Some(high)) => Some(format!("<={high}")),
        (None, None) => None,
    };
    (value, unit)
}

/// "numerator/denominator", each side with its own unit when given.
fn ratio_text(r: &Ratio) -> Option<String> {
    let numerator = r.numerator.as_ref().and_then(quantity_text)?;
    let denominator = r.denominator.as_ref().and_then(quantity_text)?;
    Some(format!("{numerator}/{denominator}"))
}

/// ISO 8601 interval; an open end renders as "..".
fn period_text(p: &Period) -> Option<String> {
    match (owned(p.start.as_deref()), owned(p.end.as_deref())) {
        (Some(start), Some(end)) => Some(format!("{start}/{end}")),
        (Some(start), None) => Some(format!("{start}/..")),
        (None, Some(end)) => Some(format!("../{end}")),
        (None, None) => None,
    }
}

/// Integer-valued numbers drop their fractional part ("1.0" renders "1").
fn count_text(value: &Value) -> Option<String> {
    let text = number_text(value)?;
    match text.parse::<f64>() {
        Ok(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some(format!("{}", n as i64)),
        _ => Some(text),
    }
}

/// `timing.code` label, else "N time(s) per P unit" from `timing.repeat`.
fn frequency_text(timing: &Timing) -> Option<String> {
    if let Some(label) = timing.code.as_ref().and_then(|c| owned(c.label())) {
        return Some(label);
    }
    let repeat = timing.repeat.as_ref()?;
    let frequency = repeat.frequency.as_ref().and_then(count_text)?;
    let period = repeat.period.as_ref().and_then(count_text)?;
    let unit = owned(repeat.period_unit.as_deref())?;
    Some(format!("{frequency} time(s) per {period} {unit}"))
}
