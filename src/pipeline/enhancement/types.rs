use std::collections::BTreeSet;

use futures_util::future::BoxFuture;
use serde::Serialize;

use crate::models::NarrativeCategory;
use crate::pipeline::narrative::NarrativeSegment;
use crate::pipeline::safety::readability::ReadabilityComparison;

use super::EnhancementError;

/// What the service is asked to rewrite.
#[derive(Debug, Clone, Copy)]
pub struct EnhancementRequest<'a> {
    pub text: &'a str,
    pub category: NarrativeCategory,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnhancementReply {
    pub text: String,
    pub explained_terms: BTreeSet<String>,
}

/// External readability service (abstraction allows mocking).
///
/// Implementations may fail or hang; the boundary bounds and absorbs both.
pub trait EnhancementService: Send + Sync {
    fn name(&self) -> &'static str;

    fn enhance<'a>(
        &'a self,
        request: EnhancementRequest<'a>,
    ) -> BoxFuture<'a, Result<EnhancementReply, EnhancementError>>;
}

/// Why a segment kept its source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    Timeout,
    ServiceError,
    InvalidOutput,
    Disabled,
    BudgetExhausted,
    Fabrication,
    CriticalTermRemoved,
}

impl FallbackReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::ServiceError => "service_error",
            Self::InvalidOutput => "invalid_output",
            Self::Disabled => "disabled",
            Self::BudgetExhausted => "budget_exhausted",
            Self::Fabrication => "fabrication",
            Self::CriticalTermRemoved => "critical_term_removed",
        }
    }
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A narrative after the boundary, with or without enhancement.
///
/// When `ai_processed` is false, `enhanced_text` equals the source text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnhancedNarrative {
    #[serde(flatten)]
    pub segment: NarrativeSegment,
    pub enhanced_text: String,
    pub ai_processed: bool,
    pub explained_terms: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackReason>,
    /// Set by the validator on enhancements that were kept.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readability: Option<ReadabilityComparison>,
}

impl EnhancedNarrative {
    /// Source text unchanged, optionally recording why.
    pub fn passthrough(segment: NarrativeSegment, fallback: Option<FallbackReason>) -> Self {
        Self {
            enhanced_text: segment.source_text.clone(),
            segment,
            ai_processed: false,
            explained_terms: BTreeSet::new(),
            fallback,
            readability: None,
        }
    }

    pub fn enhanced(
        segment: NarrativeSegment,
        text: String,
        explained_terms: BTreeSet<String>,
    ) -> Self {
        Self {
            segment,
            enhanced_text: text,
            ai_processed: true,
            explained_terms,
            fallback: None,
            readability: None,
        }
    }

    /// Discard the enhancement and go back to the source text.
    pub fn revert(&mut self, reason: FallbackReason) {
        self.enhanced_text = self.segment.source_text.clone();
        self.ai_processed = false;
        self.explained_terms.clear();
        self.fallback = Some(reason);
        self.readability = None;
    }
}
