//! Outbound request safety.
//!
//! This module decides what a scan is allowed to connect to:
//! - Address classification and the allow-list aware [`AddressGuard`]
//! - Two-stage target validation ([`normalize_input`], [`resolve_target`])
//! - [`PinnedResolver`], which holds reqwest to the validated addresses
//!
//! Rejections carry a [`crate::error_handling::ValidationError`] whose
//! message never reveals which address class matched.

mod address;
mod safe_resolver;
mod target;
mod url_validation;

pub use address::{classify_ip, classify_socket_addr, AddressClass, AddressGuard};
pub use safe_resolver::PinnedResolver;
pub use target::{ScanTarget, Scheme, ValidatedTarget};
pub use url_validation::{normalize_input, resolve_target, validate_url};
