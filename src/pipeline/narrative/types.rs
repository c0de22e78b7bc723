use serde::Serialize;

use crate::models::NarrativeCategory;
use crate::pipeline::parser::ResourceRef;

/// A free-text span that may be rewritten for readability.
///
/// The category is fixed at extraction and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NarrativeSegment {
    /// Position in document order, starting at zero.
    pub order: usize,
    pub category: NarrativeCategory,
    pub source_text: String,
    pub source: ResourceRef,
    /// FHIR path the text was read from, e.g. `reasonCode.text`.
    pub field: &'static str,
}
