use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};

use crate::models::NarrativeCategory;

use super::glossary::find_terms;
use super::types::{EnhancementReply, EnhancementRequest, EnhancementService};
use super::EnhancementError;

const SYSTEM_PROMPT: &str = "You rewrite short passages from a patient's medical record \
so the patient can understand them. Use plain words at a sixth to eighth grade reading level. \
Keep every number, dose, unit, time and medicine name exactly as written. Do not add advice, \
numbers, medicines or facts that are not in the passage. Reply with the rewritten passage only.";

/// Enhancement via a local Ollama instance (`/api/generate`).
pub struct OllamaEnhancer {
    base_url: String,
    model: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl OllamaEnhancer {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self, EnhancementError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EnhancementError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
            timeout,
        })
    }

    async fn generate(&self, prompt: &str) -> Result<String, EnhancementError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            system: SYSTEM_PROMPT,
            stream: false,
            options: OllamaOptions { temperature: 0.1 },
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    EnhancementError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    EnhancementError::Timeout(self.timeout)
                } else {
                    EnhancementError::HttpClient(e.without_url().to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(EnhancementError::Service(status.as_u16()));
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|_| EnhancementError::InvalidOutput("unparseable response body"))?;

        Ok(parsed.response)
    }
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

fn category_hint(category: NarrativeCategory) -> &'static str {
    match category {
        NarrativeCategory::ChiefComplaint => "why the patient came in",
        NarrativeCategory::DiagnosisExplanation => "what the condition is",
        NarrativeCategory::ProcedureDescription => "what was done",
        NarrativeCategory::CareInstructions => "what the patient should do",
        NarrativeCategory::LifestyleGuidance => "daily habits that help",
        NarrativeCategory::WarningSigns => "when to get help right away",
    }
}

pub fn build_prompt(request: &EnhancementRequest<'_>) -> String {
    format!(
        "This passage explains {}.\n\nPassage:\n{}\n\nRewritten passage:",
        category_hint(request.category),
        request.text
    )
}

impl EnhancementService for OllamaEnhancer {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn enhance<'a>(
        &'a self,
        request: EnhancementRequest<'a>,
    ) -> BoxFuture<'a, Result<EnhancementReply, EnhancementError>> {
        async move {
            let prompt = build_prompt(&request);
            let text = self.generate(&prompt).await?;
            let explained_terms = find_terms(request.text)
                .into_iter()
                .filter(|term| text.to_lowercase().contains(term))
                .map(str::to_string)
                .collect();
            Ok(EnhancementReply {
                text,
                explained_terms,
            })
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_carries_category_hint_and_text() {
        let prompt = build_prompt(&EnhancementRequest {
            text: "Avoid NSAIDs.",
            category: NarrativeCategory::WarningSigns,
        });
        assert!(prompt.contains("when to get help right away"));
        assert!(prompt.contains("Avoid NSAIDs."));
    }

    #[test]
    fn base_url_is_normalized() {
        let enhancer =
            OllamaEnhancer::new("http://localhost:11434/", "medgemma", Duration::from_secs(1))
                .unwrap();
        assert_eq!(enhancer.base_url, "http://localhost:11434");
        assert_eq!(enhancer.name(), "ollama");
    }

    #[tokio::test]
    async fn unreachable_server_is_a_service_failure() {
        // Port 9 (discard) is closed on test hosts.
        let enhancer =
            OllamaEnhancer::new("http://127.0.0.1:9", "medgemma", Duration::from_secs(2)).unwrap();
        let err = enhancer
            .enhance(EnhancementRequest {
                text: "Rest.",
                category: NarrativeCategory::CareInstructions,
            })
            .await
            .unwrap_err();
        assert_eq!(
            err.fallback_reason(),
            crate::pipeline::enhancement::FallbackReason::ServiceError
        );
    }
}
