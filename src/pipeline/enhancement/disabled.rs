use futures_util::future::{self, BoxFuture, FutureExt};

use super::types::{EnhancementReply, EnhancementRequest, EnhancementService};
use super::EnhancementError;

/// Declines every request, so every narrative passes through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledEnhancer;

impl EnhancementService for DisabledEnhancer {
    fn name(&self) -> &'static str {
        "disabled"
    }

    fn enhance<'a>(
        &'a self,
        _request: EnhancementRequest<'a>,
    ) -> BoxFuture<'a, Result<EnhancementReply, EnhancementError>> {
        future::ready(Err(EnhancementError::Disabled)).boxed()
    }
}
