use std::process::ExitCode;
use std::sync::Arc;

use serde::Serialize;

use clinical_summarizer::config::{self, EnhancerBackend, SummarizerConfig};
use clinical_summarizer::pipeline::enhancement::{
    DisabledEnhancer, EnhancementService, OllamaEnhancer, RuleBasedEnhancer,
};
use clinical_summarizer::pipeline::processor::SummaryProcessor;

/// Summarize one bundle file and print the result as JSON.
///
/// Prints the `PatientSummary` on success. On failure prints every fatal
/// `ErrorReport`, primary first, and exits with status 1. Configuration comes from `SUMMARIZER_*`
/// environment variables.
#[tokio::main]
async fn main() -> ExitCode {
    clinical_summarizer::init_tracing();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: {} <bundle.json>", config::APP_NAME);
        return ExitCode::from(2);
    };

    let config = SummarizerConfig::from_env();
    tracing::info!(
        version = config::APP_VERSION,
        enhancer = ?config.enhancer,
        budget_ms = config.time_budget.as_millis() as u64,
        "{} starting",
        config::APP_NAME
    );

    let raw = match tokio::fs::read_to_string(&path).await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::error!(kind = ?e.kind(), "Cannot read bundle file");
            eprintln!("cannot read {path}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let service = build_enhancer(&config);
    let processor = SummaryProcessor::new(config, service);

    match processor.process_str(&raw).await {
        Ok(summary) => print_json(&summary),
        Err(failure) => {
            print_json(&failure.reports());
            ExitCode::FAILURE
        }
    }
}

fn build_enhancer(config: &SummarizerConfig) -> Arc<dyn EnhancementService> {
    match config.enhancer {
        EnhancerBackend::Disabled => Arc::new(DisabledEnhancer),
        EnhancerBackend::Rules => Arc::new(RuleBasedEnhancer),
        EnhancerBackend::Ollama => {
            let client =
                OllamaEnhancer::new(&config.ollama_url, &config.ollama_model, config.segment_timeout);
            match client {
                Ok(enhancer) => Arc::new(enhancer),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Ollama client unavailable, narratives will pass through"
                    );
                    Arc::new(DisabledEnhancer)
                }
            }
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize output");
            ExitCode::FAILURE
        }
    }
}
