//! Local enhancer: plain-language substitutions plus glossary explanations.

use futures_util::future::{self, BoxFuture, FutureExt};

use super::glossary::{explain_terms, simplify};
use super::types::{EnhancementReply, EnhancementRequest, EnhancementService};
use super::EnhancementError;

/// Deterministic, offline enhancer. Never adds numbers or drug names.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedEnhancer;

impl RuleBasedEnhancer {
    pub fn rewrite(text: &str) -> EnhancementReply {
        let simplified = simplify(text);
        let (text, explained_terms) = explain_terms(&simplified);
        EnhancementReply {
            text,
            explained_terms,
        }
    }
}

impl EnhancementService for RuleBasedEnhancer {
    fn name(&self) -> &'static str {
        "rules"
    }

    fn enhance<'a>(
        &'a self,
        request: EnhancementRequest<'a>,
    ) -> BoxFuture<'a, Result<EnhancementReply, EnhancementError>> {
        future::ready(Ok(Self::rewrite(request.text))).boxed()
    }
}
