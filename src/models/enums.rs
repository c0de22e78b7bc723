use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned when a string does not name any variant of a `str_enum!` type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid value '{value}' for {field}")]
pub struct InvalidEnum {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnum;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

// Declaration order is output order: the assembler sorts groups by `Ord`.
str_enum!(CriticalCategory {
    CriticalAlert => "critical_alerts",
    EmergencyContact => "emergency_contacts",
    Medication => "medications",
    LabResult => "lab_results",
    VitalSign => "vital_signs",
    Appointment => "appointments",
    ProviderContact => "provider_contacts",
    PharmacyInfo => "pharmacy",
    InsuranceInfo => "insurance",
});

impl CriticalCategory {
    pub const ALL: [CriticalCategory; 9] = [
        Self::CriticalAlert,
        Self::EmergencyContact,
        Self::Medication,
        Self::LabResult,
        Self::VitalSign,
        Self::Appointment,
        Self::ProviderContact,
        Self::PharmacyInfo,
        Self::InsuranceInfo,
    ];

    /// A missing required field in a life-critical category fails the whole request.
    pub fn is_life_critical(&self) -> bool {
        matches!(
            self,
            Self::CriticalAlert | Self::Medication | Self::LabResult | Self::VitalSign
        )
    }

    pub fn safety_level(&self) -> SafetyLevel {
        if self.is_life_critical() || *self == Self::EmergencyContact {
            SafetyLevel::Critical
        } else {
            SafetyLevel::Important
        }
    }
}

str_enum!(NarrativeCategory {
    ChiefComplaint => "chief_complaint",
    DiagnosisExplanation => "diagnosis_explanation",
    ProcedureDescription => "procedure_description",
    CareInstructions => "care_instructions",
    LifestyleGuidance => "lifestyle_guidance",
    WarningSigns => "warning_signs",
});

str_enum!(SafetyLevel {
    Critical => "critical",
    Important => "important",
});

str_enum!(ProcessingType {
    Preserved => "preserved",
});

str_enum!(Severity {
    Fatal => "fatal",
    Error => "error",
    Warning => "warning",
});

str_enum!(ProcessingStage {
    Received => "received",
    Parsed => "parsed",
    Extracted => "extracted",
    Enhanced => "enhanced",
    Validated => "validated",
    Assembled => "assembled",
    Failed => "failed",
});

impl ProcessingStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Assembled | Self::Failed)
    }
}
