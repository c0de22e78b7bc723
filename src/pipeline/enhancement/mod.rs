//! Narrative enhancement boundary and the services behind it.

pub mod boundary;
pub mod disabled;
pub mod glossary;
pub mod mock;
pub mod ollama;
pub mod rules;
pub mod sanitize;
pub mod types;

pub use boundary::*;
pub use disabled::*;
pub use mock::*;
pub use ollama::*;
pub use rules::*;
pub use types::*;

use std::time::Duration;

use thiserror::Error;

/// Failures reported by an [`EnhancementService`]. The boundary absorbs all of them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnhancementError {
    #[error("Enhancement is disabled")]
    Disabled,

    #[error("Enhancement timed out after {0:?}")]
    Timeout(Duration),

    #[error("Ollama is not running at {0}")]
    Connection(String),

    #[error("Enhancement service returned status {0}")]
    Service(u16),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Enhancement output rejected: {0}")]
    InvalidOutput(&'static str),
}

impl EnhancementError {
    pub fn fallback_reason(&self) -> FallbackReason {
        match self {
            Self::Disabled => FallbackReason::Disabled,
            Self::Timeout(_) => FallbackReason::Timeout,
            Self::InvalidOutput(_) => FallbackReason::InvalidOutput,
            Self::Connection(_) | Self::Service(_) | Self::HttpClient(_) => {
                FallbackReason::ServiceError
            }
        }
    }
}
