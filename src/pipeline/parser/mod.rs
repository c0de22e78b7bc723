//! Resource parser: raw bundle JSON to a typed [`ClinicalBundle`].

pub mod fhir;
pub mod parse;
pub mod types;

pub use fhir::Resource;
pub use parse::*;
pub use types::*;

use thiserror::Error;

/// Structural problems that stop a bundle from being parsed at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Input is not valid JSON (line {line}, column {column})")]
    InvalidJson { line: usize, column: usize },

    #[error("Top-level value must be a JSON object")]
    NotAnObject,

    #[error("Top-level resourceType is missing")]
    MissingResourceType,

    #[error("Top-level resourceType must be Bundle")]
    NotABundle(String),

    #[error("Bundle has no entry collection")]
    MissingEntries,

    #[error("Bundle entry collection must be an array")]
    EntriesNotArray,

    #[error("Bundle entry collection is empty")]
    EmptyEntries,
}
