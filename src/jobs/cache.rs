//! Result cache keyed by normalized host.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use crate::models::ScanResult;

struct CachedResult {
    stored_at: Instant,
    result: Arc<ScanResult>,
}

/// Completed results, served until `ttl` elapses.
pub(crate) struct ResultCache {
    entries: RwLock<HashMap<String, CachedResult>>,
    ttl: Duration,
}

impl ResultCache {
    pub(crate) fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Unexpired result for `key`.
    pub(crate) fn get(&self, key: &str) -> Option<Arc<ScanResult>> {
        if self.ttl.is_zero() {
            return None;
        }
        let entries = self
            .entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries
            .get(key)
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| Arc::clone(&entry.result))
    }

    pub(crate) fn insert(&self, key: &str, result: Arc<ScanResult>) {
        if self.ttl.is_zero() {
            return;
        }
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.insert(
            key.to_string(),
            CachedResult {
                stored_at: Instant::now(),
                result,
            },
        );
    }

    /// Removes expired entries; returns how many were removed.
    pub(crate) fn purge_expired(&self) -> usize {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = entries.len();
        entries.retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
        before - entries.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}
