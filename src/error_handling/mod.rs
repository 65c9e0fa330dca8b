//! Error handling and processing statistics.
//!
//! This module provides:
//! - Error type definitions (validation, resolution, fetch, caller-facing taxonomy)
//! - Processing statistics tracking (job outcome counters)

mod stats;
mod types;

// Re-export public API
pub use stats::ProcessingStats;
pub use types::{
    DatabaseError, EventType, FetchError, InitializationError, ResolutionError, ScanError,
    ValidationError,
};
