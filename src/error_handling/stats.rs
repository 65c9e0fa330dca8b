//! Processing statistics tracking.
//!
//! Thread-safe counters for job outcomes, shared by the orchestrator and the
//! API's `/metrics` endpoint.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::EventType;

/// Thread-safe processing statistics tracker.
///
/// Every [`EventType`] is initialized to zero on creation, so increments are
/// plain atomic adds on a map that is never mutated afterwards.
pub struct ProcessingStats {
    events: HashMap<EventType, AtomicUsize>,
}

impl ProcessingStats {
    pub fn new() -> Self {
        let mut events = HashMap::new();
        for event in EventType::iter() {
            events.insert(event, AtomicUsize::new(0));
        }
        ProcessingStats { events }
    }

    /// Increment an event counter.
    pub fn increment(&self, event: EventType) {
        if let Some(counter) = self.events.get(&event) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment counter for {:?} which is not in the map. \
                 This indicates a bug in ProcessingStats initialization.",
                event
            );
        }
    }

    /// Get the count for an event type.
    pub fn get(&self, event: EventType) -> usize {
        self.events
            .get(&event)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// All counters in declaration order, keyed by snake_case name.
    pub fn snapshot(&self) -> Vec<(&'static str, usize)> {
        EventType::iter()
            .map(|event| (event.into(), self.get(event)))
            .collect()
    }
}

impl Default for ProcessingStats {
    fn default() -> Self {
        Self::new()
    }
}
