//! Short-lived in-memory summary cache for demonstration retrieval.
//!
//! Entries live for a fixed TTL and exist only in memory. A live key has a
//! single writer: the first insert wins until the entry expires. The
//! processor never reads or writes this cache.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use thiserror::Error;
use uuid::Uuid;

use crate::pipeline::assembler::PatientSummary;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("A live summary is already cached under {0}")]
    Occupied(Uuid),

    #[error("Summary cache lock poisoned")]
    Poisoned,
}

// ═══════════════════════════════════════════════════════════
// CachedSummary
// ═══════════════════════════════════════════════════════════

struct CachedSummary {
    summary: PatientSummary,
    expires_at: Instant,
}

impl CachedSummary {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

// ═══════════════════════════════════════════════════════════
// SummaryCache
// ═══════════════════════════════════════════════════════════

pub struct SummaryCache {
    ttl: Duration,
    entries: Mutex<HashMap<Uuid, CachedSummary>>,
}

impl SummaryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Cache a summary under its summary id.
    pub fn insert(&self, summary: PatientSummary) -> Result<Uuid, CacheError> {
        self.insert_at(summary, Instant::now())
    }

    /// Fetch a live summary. An expired entry is evicted and reported absent.
    pub fn get(&self, id: &Uuid) -> Option<PatientSummary> {
        self.get_at(id, Instant::now())
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_at(Instant::now())
    }

    /// Remove an entry regardless of age.
    pub fn evict(&self, id: &Uuid) -> bool {
        self.entries
            .lock()
            .map(|mut entries| entries.remove(id).is_some())
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert_at(&self, summary: PatientSummary, now: Instant) -> Result<Uuid, CacheError> {
        let id = summary.metadata.summary_id;
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;

        if entries.get(&id).is_some_and(|e| e.is_live(now)) {
            return Err(CacheError::Occupied(id));
        }
        entries.insert(
            id,
            CachedSummary {
                summary,
                expires_at: now + self.ttl,
            },
        );
        tracing::debug!(summary_id = %id, cached = entries.len(), "Summary cached");
        Ok(id)
    }

    fn get_at(&self, id: &Uuid, now: Instant) -> Option<PatientSummary> {
        let mut entries = self.entries.lock().ok()?;
        match entries.get(id) {
            Some(entry) if entry.is_live(now) => Some(entry.summary.clone()),
            Some(_) => {
                entries.remove(id);
                tracing::debug!(summary_id = %id, "Expired summary evicted on access");
                None
            }
            None => None,
        }
    }

    fn purge_at(&self, now: Instant) -> usize {
        let Ok(mut entries) = self.entries.lock() else {
            return 0;
        };
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(removed, remaining = entries.len(), "Expired summaries purged");
        }
        removed
    }
}
