//! Per-hop HTTP client construction.
//!
//! Each hop gets its own client whose resolver is pinned to that hop's
//! validated addresses. Redirects are never followed by reqwest and proxies
//! from the environment are ignored, since a proxy would do its own DNS.

use std::sync::Arc;

use reqwest::ClientBuilder;

use crate::config::FetchLimits;
use crate::error_handling::FetchError;
use crate::security::{AddressGuard, PinnedResolver, ValidatedTarget};

/// Builds the client for one hop.
///
/// # Errors
///
/// Returns `FetchError::Request` if the TLS backend cannot be initialized.
pub(crate) fn build_pinned_client(
    hop: &ValidatedTarget,
    guard: &AddressGuard,
    limits: &FetchLimits,
) -> Result<reqwest::Client, FetchError> {
    ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .dns_resolver(Arc::new(PinnedResolver::new(hop, guard.clone())))
        .connect_timeout(limits.connect_timeout)
        .read_timeout(limits.read_timeout)
        .timeout(limits.total_timeout)
        .pool_max_idle_per_host(0)
        .user_agent(limits.user_agent.clone())
        .build()
        .map_err(|e| FetchError::Request(format!("client build failed: {e}")))
}
