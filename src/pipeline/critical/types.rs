use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{CriticalCategory, ProcessingType, SafetyLevel, Severity};
use crate::pipeline::parser::ResourceRef;

/// Field-level view shared by every critical data struct.
pub trait CriticalFields {
    const CATEGORY: CriticalCategory;
    const REQUIRED: &'static [&'static str];

    /// Every field in declaration order, required ones first.
    fn fields(&self) -> Vec<(&'static str, Option<&str>)>;
}

/// Declares a critical data struct whose fields are all verbatim strings.
///
/// Required fields always serialize (as `null` when absent); optional ones
/// are skipped when absent.
macro_rules! critical_data {
    (
        $(#[$meta:meta])*
        $name:ident => $category:ident,
        required: [$($req:ident),+],
        optional: [$($opt:ident),*] $(,)?
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
        pub struct $name {
            $(pub $req: Option<String>,)+
            $(
                #[serde(skip_serializing_if = "Option::is_none")]
                pub $opt: Option<String>,
            )*
        }

        impl CriticalFields for $name {
            const CATEGORY: CriticalCategory = CriticalCategory::$category;
            const REQUIRED: &'static [&'static str] = &[$(stringify!($req)),+];

            fn fields(&self) -> Vec<(&'static str, Option<&str>)> {
                vec![
                    $((stringify!($req), self.$req.as_deref()),)+
                    $((stringify!($opt), self.$opt.as_deref()),)*
                ]
            }
        }
    };
}

critical_data!(
    /// Allergy or intolerance the patient must never be exposed to.
    AlertData => CriticalAlert,
    required: [substance],
    optional: [reaction, criticality, severity],
);

critical_data!(
    EmergencyContactData => EmergencyContact,
    required: [name, phone],
    optional: [relationship],
);

critical_data!(
    /// `dosage` is the dose value exactly as written plus its unit.
    MedicationData => Medication,
    required: [name, dosage],
    optional: [frequency, route, instructions, patient_instruction, status],
);

critical_data!(
    LabResultData => LabResult,
    required: [test_name, value],
    optional: [unit, reference_range, interpretation, effective, status],
);

critical_data!(
    VitalSignData => VitalSign,
    required: [measurement, value],
    optional: [unit, effective],
);

critical_data!(
    AppointmentData => Appointment,
    required: [start],
    optional: [end, description, status, appointment_type, practitioner, location],
);

critical_data!(
    ProviderContactData => ProviderContact,
    required: [name],
    optional: [specialty, phone, email, address],
);

critical_data!(
    PharmacyData => PharmacyInfo,
    required: [name],
    optional: [phone, fax, address],
);

critical_data!(
    InsuranceData => InsuranceInfo,
    required: [payor],
    optional: [member_id, plan, group, status],
);

macro_rules! dispatch {
    ($value:expr, $data:ident => $body:expr) => {
        match $value {
            CriticalData::CriticalAlert($data) => $body,
            CriticalData::EmergencyContact($data) => $body,
            CriticalData::Medication($data) => $body,
            CriticalData::LabResult($data) => $body,
            CriticalData::VitalSign($data) => $body,
            CriticalData::Appointment($data) => $body,
            CriticalData::ProviderContact($data) => $body,
            CriticalData::Pharmacy($data) => $body,
            CriticalData::Insurance($data) => $body,
        }
    };
}

/// The verbatim payload of a critical record, one variant per category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CriticalData {
    CriticalAlert(AlertData),
    EmergencyContact(EmergencyContactData),
    Medication(MedicationData),
    LabResult(LabResultData),
    VitalSign(VitalSignData),
    Appointment(AppointmentData),
    ProviderContact(ProviderContactData),
    Pharmacy(PharmacyData),
    Insurance(InsuranceData),
}

impl CriticalData {
    pub fn category(&self) -> CriticalCategory {
        fn category_of<T: CriticalFields>(_: &T) -> CriticalCategory {
            T::CATEGORY
        }
        dispatch!(self, d => category_of(d))
    }

    pub fn fields(&self) -> Vec<(&'static str, Option<&str>)> {
        dispatch!(self, d => d.fields())
    }

    pub fn missing_required(&self) -> Vec<&'static str> {
        fn required_of<T: CriticalFields>(_: &T) -> &'static [&'static str] {
            T::REQUIRED
        }
        let required = dispatch!(self, d => required_of(d));
        self.fields()
            .into_iter()
            .filter(|(name, value)| required.contains(name) && value.is_none())
            .map(|(name, _)| name)
            .collect()
    }

    /// Optional fields whose absence is worth a warning.
    pub fn missing_advisory(&self) -> Vec<&'static str> {
        match self {
            CriticalData::Pharmacy(p) if p.fax.is_none() => vec!["fax"],
            _ => Vec::new(),
        }
    }

    /// Values longer than a word or two that a narrative might repeat.
    pub fn free_text(&self) -> Vec<&str> {
        match self {
            CriticalData::Medication(m) => [&m.instructions, &m.patient_instruction]
                .into_iter()
                .filter_map(|v| v.as_deref())
                .collect(),
            CriticalData::Appointment(a) => a.description.as_deref().into_iter().collect(),
            _ => Vec::new(),
        }
    }
}

/// Safety and validation block attached to every critical record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordMetadata {
    pub processed_at: DateTime<Utc>,
    pub safety_level: SafetyLevel,
    pub processing_type: ProcessingType,
    /// Always false: critical records never reach the enhancement service.
    pub ai_processed: bool,
    pub validation_passed: bool,
    pub validation_errors: Vec<String>,
    pub preservation_hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriticalRecord {
    pub source: ResourceRef,
    /// Position among the records produced by the same entry.
    #[serde(skip)]
    pub position: usize,
    #[serde(flatten)]
    pub data: CriticalData,
    pub metadata: RecordMetadata,
}

impl CriticalRecord {
    pub fn category(&self) -> CriticalCategory {
        self.data.category()
    }
}

/// A problem found while extracting one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub category: CriticalCategory,
    pub resource: ResourceRef,
    pub field: &'static str,
    pub severity: Severity,
}

impl FieldIssue {
    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

#[derive(Debug, Clone, Default)]
pub struct CriticalExtraction {
    pub records: Vec<CriticalRecord>,
    pub issues: Vec<FieldIssue>,
}

impl CriticalExtraction {
    pub fn has_fatal(&self) -> bool {
        self.issues.iter().any(FieldIssue::is_fatal)
    }
}
