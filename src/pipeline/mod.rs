//! The hybrid summarization pipeline.
//!
//! parse → {critical, narrative} extraction → enhancement (narratives only)
//! → safety validation → assembly.

pub mod assembler;
pub mod audit;
pub mod cache; // Demonstration-only TTL cache, never used by the processor
pub mod critical;
pub mod enhancement;
pub mod errors;
pub mod narrative;
pub mod parser;
pub mod processor;
pub mod safety;
