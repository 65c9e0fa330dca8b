//! API server HTTP handlers.

mod health;
mod history;
mod metrics;
mod scan;

pub use health::health_handler;
pub use history::history_handler;
pub use metrics::metrics_handler;
pub use scan::{status_handler, submit_handler};
