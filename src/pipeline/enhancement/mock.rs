use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};

use super::types::{EnhancementReply, EnhancementRequest, EnhancementService};
use super::EnhancementError;

/// Scripted behaviour for [`MockEnhancer`].
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Return the input unchanged.
    Echo,
    /// Return this text for every request.
    Reply(String),
    /// Return `f(input)`.
    Transform(fn(&str) -> String),
    /// Fail with a service error.
    Fail,
    /// Never complete.
    Hang,
}

/// Mock enhancement service for tests. Counts calls and tracks peak concurrency.
pub struct MockEnhancer {
    behavior: MockBehavior,
    delay: Option<Duration>,
    explained: BTreeSet<String>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockEnhancer {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            delay: None,
            explained: BTreeSet::new(),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Sleep this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_explained_terms(mut self, terms: &[&str]) -> Self {
        self.explained = terms.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

/// Decrements the in-flight counter even when the future is dropped mid-call.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl EnhancementService for MockEnhancer {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn enhance<'a>(
        &'a self,
        request: EnhancementRequest<'a>,
    ) -> BoxFuture<'a, Result<EnhancementReply, EnhancementError>> {
        async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
            let _guard = InFlight(&self.in_flight);

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            let text = match &self.behavior {
                MockBehavior::Echo => request.text.to_string(),
                MockBehavior::Reply(text) => text.clone(),
                MockBehavior::Transform(f) => f(request.text),
                MockBehavior::Fail => return Err(EnhancementError::Service(503)),
                MockBehavior::Hang => std::future::pending().await,
            };

            Ok(EnhancementReply {
                text,
                explained_terms: self.explained.clone(),
            })
        }
        .boxed()
    }
}
