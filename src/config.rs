//! Runtime configuration for the summarization pipeline.
//!
//! Defaults are tuned for the 5-second processing ceiling. Every value can be
//! overridden from the environment via [`SummarizerConfig::from_env`].

use std::time::Duration;

use serde::Serialize;

/// Application-level constants
pub const APP_NAME: &str = "clinical-summarizer";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "info,clinical_summarizer=debug,reqwest=warn,hyper=warn"
}

const DEFAULT_TIME_BUDGET_MS: u64 = 5_000;
const DEFAULT_SEGMENT_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_MAX_IN_FLIGHT: usize = 4;
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const DEFAULT_OLLAMA_MODEL: &str = "medgemma";

/// Which narrative enhancement service the binary wires in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnhancerBackend {
    /// Narratives pass through untouched.
    Disabled,
    /// Local plain-language rules plus the medical glossary.
    Rules,
    /// A local Ollama instance.
    Ollama,
}

impl EnhancerBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "disabled" | "off" | "none" => Some(Self::Disabled),
            "rules" | "rule_based" => Some(Self::Rules),
            "ollama" => Some(Self::Ollama),
            _ => None,
        }
    }
}

/// Pipeline configuration.
#[derive(Debug, Clone, Serialize)]
pub struct SummarizerConfig {
    /// Wall-clock ceiling for one request, parse through assembly.
    pub time_budget: Duration,
    /// Upper bound for a single enhancement call. The effective timeout is
    /// the smaller of this and whatever is left of `time_budget`.
    pub segment_timeout: Duration,
    /// Maximum concurrent enhancement calls within one request.
    pub max_in_flight: usize,
    pub enhancer: EnhancerBackend,
    pub ollama_url: String,
    pub ollama_model: String,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            time_budget: Duration::from_millis(DEFAULT_TIME_BUDGET_MS),
            segment_timeout: Duration::from_millis(DEFAULT_SEGMENT_TIMEOUT_MS),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            enhancer: EnhancerBackend::Rules,
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            ollama_model: DEFAULT_OLLAMA_MODEL.to_string(),
        }
    }
}

impl SummarizerConfig {
    /// Defaults overlaid with `SUMMARIZER_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(ms) = parse_var::<u64>(&lookup, "SUMMARIZER_TIME_BUDGET_MS") {
            config.time_budget = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "SUMMARIZER_SEGMENT_TIMEOUT_MS") {
            config.segment_timeout = Duration::from_millis(ms);
        }
        if let Some(n) = parse_var::<usize>(&lookup, "SUMMARIZER_MAX_IN_FLIGHT") {
            config.max_in_flight = n.max(1);
        }
        if let Some(raw) = lookup("SUMMARIZER_ENHANCER") {
            match EnhancerBackend::parse(&raw) {
                Some(backend) => config.enhancer = backend,
                None => tracing::warn!(
                    key = "SUMMARIZER_ENHANCER",
                    "Unrecognized enhancer backend, keeping default"
                ),
            }
        }
        if let Some(url) = lookup("SUMMARIZER_OLLAMA_URL").filter(|v| !v.trim().is_empty()) {
            config.ollama_url = url.trim().to_string();
        }
        if let Some(model) = lookup("SUMMARIZER_OLLAMA_MODEL").filter(|v| !v.trim().is_empty()) {
            config.ollama_model = model.trim().to_string();
        }

        config
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, "Unparseable configuration value, keeping default");
            None
        }
    }
}
