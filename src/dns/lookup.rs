//! Name lookup seam.
//!
//! Everything that resolves names goes through [`HostLookup`], so the guard
//! sees every answer and tests can substitute a fixed table for real DNS.

use std::net::IpAddr;

use futures::future::BoxFuture;

use crate::error_handling::ResolutionError;

/// Boxed lookup future, in the shape of `reqwest::dns::Resolving`.
pub type LookupFuture<'a, T> = BoxFuture<'a, Result<T, ResolutionError>>;

/// Resolves host addresses and TXT records.
///
/// Implementations must not cache answers across calls: the validator relies
/// on a fresh answer for every hop.
pub trait HostLookup: Send + Sync {
    /// All A and AAAA addresses for `host`.
    fn lookup_ip<'a>(&'a self, host: &'a str) -> LookupFuture<'a, Vec<IpAddr>>;

    /// All TXT records for `name`, each record's strings concatenated.
    fn lookup_txt<'a>(&'a self, name: &'a str) -> LookupFuture<'a, Vec<String>>;
}
