//! Scan history persistence.
//!
//! This module provides:
//! - SQLite connection pool setup (file-backed with WAL, or in-memory)
//! - Schema migrations
//! - The [`HistoryStore`] seam and its SQLite implementation

mod history;
mod migrations;
mod pool;

pub use history::{HistoryFilter, HistoryStore, SqliteHistory};
pub use migrations::run_migrations;
pub use pool::{init_db_pool_with_path, init_memory_pool};
