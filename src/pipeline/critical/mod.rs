//! Critical data extractor: exact-preservation records per category.

pub mod extract;
pub mod hash;
pub mod types;

pub use extract::*;
pub use hash::*;
pub use types::*;
