//! Narrative extractor: text spans eligible for readability enhancement.

pub mod extract;
pub mod types;

pub use extract::*;
pub use types::*;
