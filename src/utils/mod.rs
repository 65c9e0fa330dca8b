//! Shared helpers.

mod sanitize;

pub use sanitize::{sanitize_and_truncate_error_message, strip_control_chars};
