//! The only path from narrative segments to the enhancement service.
//!
//! Every call is bounded by the smaller of the per-segment timeout and the
//! request deadline. Whatever happens, the caller gets an
//! [`EnhancedNarrative`]; failures degrade to the source text.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use tokio::time::Instant;

use crate::config::SummarizerConfig;
use crate::pipeline::narrative::NarrativeSegment;

use super::sanitize::check_output;
use super::types::{EnhancedNarrative, EnhancementRequest, EnhancementService, FallbackReason};

pub struct NarrativeEnhancementBoundary {
    service: Arc<dyn EnhancementService>,
    segment_timeout: Duration,
    max_in_flight: usize,
}

impl NarrativeEnhancementBoundary {
    pub fn new(service: Arc<dyn EnhancementService>, config: &SummarizerConfig) -> Self {
        Self {
            service,
            segment_timeout: config.segment_timeout,
            max_in_flight: config.max_in_flight.max(1),
        }
    }

    pub fn service_name(&self) -> &'static str {
        self.service.name()
    }

    /// Enhance one segment before `deadline`. Never fails.
    pub async fn enhance(&self, segment: NarrativeSegment, deadline: Instant) -> EnhancedNarrative {
        let now = Instant::now();
        if now >= deadline {
            log_fallback(&segment, FallbackReason::BudgetExhausted);
            return EnhancedNarrative::passthrough(segment, Some(FallbackReason::BudgetExhausted));
        }

        let per_segment = now + self.segment_timeout;
        let (limit, limit_reason) = if deadline <= per_segment {
            (deadline, FallbackReason::BudgetExhausted)
        } else {
            (per_segment, FallbackReason::Timeout)
        };

        let outcome = {
            let request = EnhancementRequest {
                text: &segment.source_text,
                category: segment.category,
            };
            tokio::time::timeout_at(limit, self.service.enhance(request)).await
        };

        let reply = match outcome {
            Err(_elapsed) => {
                log_fallback(&segment, limit_reason);
                return EnhancedNarrative::passthrough(segment, Some(limit_reason));
            }
            Ok(Err(e)) => {
                let reason = e.fallback_reason();
                log_fallback(&segment, reason);
                return EnhancedNarrative::passthrough(segment, Some(reason));
            }
            Ok(Ok(reply)) => reply,
        };

        match check_output(&segment.source_text, &reply.text) {
            Ok(text) if text == segment.source_text => {
                EnhancedNarrative::passthrough(segment, None)
            }
            Ok(text) => {
                tracing::debug!(
                    order = segment.order,
                    category = %segment.category,
                    terms = reply.explained_terms.len(),
                    "Narrative enhanced"
                );
                EnhancedNarrative::enhanced(segment, text, reply.explained_terms)
            }
            Err(problem) => {
                tracing::debug!(order = segment.order, problem, "Enhancement output rejected");
                log_fallback(&segment, FallbackReason::InvalidOutput);
                EnhancedNarrative::passthrough(segment, Some(FallbackReason::InvalidOutput))
            }
        }
    }

    /// Enhance all segments with at most `max_in_flight` calls outstanding.
    /// Results keep segment order.
    pub async fn enhance_all(
        &self,
        segments: Vec<NarrativeSegment>,
        deadline: Instant,
    ) -> Vec<EnhancedNarrative> {
        stream::iter(segments)
            .map(|segment| self.enhance(segment, deadline))
            .buffered(self.max_in_flight)
            .collect()
            .await
    }
}

fn log_fallback(segment: &NarrativeSegment, reason: FallbackReason) {
    tracing::warn!(
        outcome = "fallback",
        order = segment.order,
        category = %segment.category,
        reason = %reason,
        "Narrative kept source text"
    );
}
