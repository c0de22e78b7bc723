//! Pipeline error taxonomy and the structured, PHI-free error report.
//!
//! Messages name categories, field names, resource types and entry indices
//! only. They never carry field values or narrative text.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{CriticalCategory, NarrativeCategory, Severity};
use crate::pipeline::enhancement::FallbackReason;
use crate::pipeline::parser::{ParseError, ResourceRef};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SummaryError {
    #[error("Bundle failed structural validation: {0}")]
    StructuralValidation(#[from] ParseError),

    #[error("{category} record from {resource} is missing required field '{field}'")]
    CriticalFieldMissing {
        category: CriticalCategory,
        resource: ResourceRef,
        field: &'static str,
        severity: Severity,
    },

    #[error("{category} record from {resource} does not match its source on field '{field}'")]
    CriticalDataDrift {
        category: CriticalCategory,
        resource: ResourceRef,
        field: &'static str,
    },

    #[error("Enhanced {category} narrative #{order} introduced {count} unsupported token(s); source text kept")]
    NarrativeFabrication {
        category: NarrativeCategory,
        order: usize,
        count: usize,
    },

    #[error("Enhanced {category} narrative #{order} dropped {count} safety term(s); source text kept")]
    NarrativeTermRemoved {
        category: NarrativeCategory,
        order: usize,
        count: usize,
    },

    #[error("Enhancement of {category} narrative #{order} ran out of time; source text kept")]
    EnhancementTimeout {
        category: NarrativeCategory,
        order: usize,
    },

    #[error("Enhancement of {category} narrative #{order} unavailable ({reason}); source text kept")]
    EnhancementService {
        category: NarrativeCategory,
        order: usize,
        reason: FallbackReason,
    },
}

impl SummaryError {
    pub fn severity(&self) -> Severity {
        match self {
            Self::StructuralValidation(_) | Self::CriticalDataDrift { .. } => Severity::Fatal,
            Self::CriticalFieldMissing { severity, .. } => *severity,
            Self::NarrativeFabrication { .. }
            | Self::NarrativeTermRemoved { .. }
            | Self::EnhancementTimeout { .. }
            | Self::EnhancementService { .. } => Severity::Warning,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }

    /// Machine-readable code carried by [`ErrorReport`].
    pub fn code(&self) -> &'static str {
        match self {
            Self::StructuralValidation(_) => "invalid",
            Self::CriticalFieldMissing { .. } => "critical-data-missing",
            Self::CriticalDataDrift { .. } => "drift-detected",
            Self::NarrativeFabrication { .. } => "narrative-fabrication",
            Self::NarrativeTermRemoved { .. } => "narrative-term-removed",
            Self::EnhancementTimeout { .. } => "enhancement-timeout",
            Self::EnhancementService { .. } => "enhancement-unavailable",
        }
    }

    pub fn critical_category(&self) -> Option<CriticalCategory> {
        match self {
            Self::CriticalFieldMissing { category, .. }
            | Self::CriticalDataDrift { category, .. } => Some(*category),
            _ => None,
        }
    }

    /// Warning for a narrative the boundary could not enhance, if any.
    pub fn from_fallback(
        category: NarrativeCategory,
        order: usize,
        reason: FallbackReason,
    ) -> Option<Self> {
        match reason {
            FallbackReason::Timeout | FallbackReason::BudgetExhausted => {
                Some(Self::EnhancementTimeout { category, order })
            }
            FallbackReason::ServiceError
            | FallbackReason::InvalidOutput
            | FallbackReason::Disabled => {
                Some(Self::EnhancementService {
                    category,
                    order,
                    reason,
                })
            }
            // Raised by the validator with token counts.
            FallbackReason::Fabrication | FallbackReason::CriticalTermRemoved => None,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            severity: self.severity(),
            code: self.code().to_string(),
            message: self.to_string(),
        }
    }
}

/// Structured error object returned to callers and embedded in validation results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub severity: Severity,
    pub code: String,
    pub message: String,
}
