use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::CriticalCategory;
use crate::pipeline::errors::{ErrorReport, SummaryError};

/// Outcome of the safety validator, consulted by the assembler.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub id: Uuid,
    pub validated_at: DateTime<Utc>,
    /// False when any fatal error was found.
    pub passed: bool,
    /// Pass/fail per critical category present in the bundle.
    pub categories: BTreeMap<CriticalCategory, bool>,
    /// True per category when every record matched its source exactly.
    pub preserved_fields: BTreeMap<CriticalCategory, bool>,
    /// False when any enhanced narrative had to be reverted.
    pub narratives_passed: bool,
    /// True when at least one enhancement was kept and every kept one
    /// reads on target or at a lower grade than its source.
    pub readability_improved: bool,
    pub errors: Vec<ErrorReport>,
    pub warnings: Vec<ErrorReport>,
    #[serde(skip)]
    pub fatal: Vec<SummaryError>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            validated_at: Utc::now(),
            passed: true,
            categories: BTreeMap::new(),
            preserved_fields: BTreeMap::new(),
            narratives_passed: true,
            readability_improved: false,
            errors: Vec::new(),
            warnings: Vec::new(),
            fatal: Vec::new(),
        }
    }

    /// File an error under errors or warnings by its severity.
    pub fn record(&mut self, error: SummaryError) {
        let report = error.report();
        if error.is_fatal() {
            self.passed = false;
            self.errors.push(report);
            self.fatal.push(error);
        } else if report.severity == crate::models::Severity::Error {
            self.errors.push(report);
        } else {
            self.warnings.push(report);
        }
    }

    pub fn has_fatal(&self) -> bool {
        !self.fatal.is_empty()
    }

    /// Categories that carry at least one fatal error.
    pub fn fatal_categories(&self) -> Vec<CriticalCategory> {
        let mut categories: Vec<CriticalCategory> =
            self.fatal.iter().filter_map(SummaryError::critical_category).collect();
        categories.sort();
        categories.dedup();
        categories
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}
