//! DNS resolver initialization.
//!
//! This module builds the hickory resolver behind [`HickoryLookup`]. The
//! answer cache is disabled: every validation must see a fresh answer.

use std::time::Duration;

use hickory_resolver::config::{LookupIpStrategy, ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;

use crate::config::DNS_TIMEOUT_SECS;
use crate::dns::HickoryLookup;
use crate::error_handling::InitializationError;

/// Initializes the DNS lookup used for target validation and mail records.
///
/// Uses the default upstream configuration (Google DNS) rather than the
/// system resolver, so `/etc/hosts` entries and local search domains never
/// take part in validation.
///
/// # Errors
///
/// Returns `InitializationError::DnsResolverError` when `lookup_timeout` is
/// zero.
pub fn init_resolver(lookup_timeout: Duration) -> Result<HickoryLookup, InitializationError> {
    if lookup_timeout.is_zero() {
        return Err(InitializationError::DnsResolverError(
            "lookup timeout must be greater than zero".to_string(),
        ));
    }

    let mut opts = ResolverOpts::default();
    opts.timeout = Duration::from_secs(DNS_TIMEOUT_SECS);
    opts.attempts = 2;
    // No search-domain appending
    opts.ndots = 0;
    opts.ip_strategy = LookupIpStrategy::Ipv4AndIpv6;
    opts.cache_size = 0;
    opts.use_hosts_file = false;

    let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), opts);
    Ok(HickoryLookup::new(resolver, lookup_timeout))
}
