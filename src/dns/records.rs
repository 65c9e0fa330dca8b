//! DNS lookups backed by `hickory-resolver`.
//!
//! Address lookups return both A and AAAA answers; TXT lookups join the
//! character-strings of each record. "No records" is reported as
//! [`ResolutionError::NotFound`] so callers can treat it as absence.

use std::net::IpAddr;
use std::time::Duration;

use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::proto::rr::{RData, RecordType};
use hickory_resolver::TokioAsyncResolver;

use super::lookup::{HostLookup, LookupFuture};
use crate::error_handling::ResolutionError;

/// [`HostLookup`] over a hickory resolver.
///
/// The resolver is expected to be built by
/// [`crate::initialization::init_resolver`], which disables its answer cache.
pub struct HickoryLookup {
    resolver: TokioAsyncResolver,
    timeout: Duration,
}

impl HickoryLookup {
    /// Wraps a resolver. `timeout` bounds each lookup end to end, on top of
    /// the resolver's own per-query timeout.
    pub fn new(resolver: TokioAsyncResolver, timeout: Duration) -> Self {
        Self { resolver, timeout }
    }
}

impl HostLookup for HickoryLookup {
    fn lookup_ip<'a>(&'a self, host: &'a str) -> LookupFuture<'a, Vec<IpAddr>> {
        Box::pin(async move {
            let response = tokio::time::timeout(self.timeout, self.resolver.lookup_ip(host))
                .await
                .map_err(|_| ResolutionError::Timeout(host.to_string()))?
                .map_err(|e| classify_resolve_error(host, e))?;

            let mut addrs: Vec<IpAddr> = response.iter().collect();
            addrs.sort();
            addrs.dedup();
            if addrs.is_empty() {
                return Err(ResolutionError::NotFound(host.to_string()));
            }
            Ok(addrs)
        })
    }

    fn lookup_txt<'a>(&'a self, name: &'a str) -> LookupFuture<'a, Vec<String>> {
        Box::pin(async move {
            let lookup =
                tokio::time::timeout(self.timeout, self.resolver.lookup(name, RecordType::TXT))
                    .await
                    .map_err(|_| ResolutionError::Timeout(name.to_string()))?
                    .map_err(|e| classify_resolve_error(name, e))?;

            let txt_records: Vec<String> = lookup
                .iter()
                .filter_map(|rdata| {
                    if let RData::TXT(txt) = rdata {
                        // TXT records can contain multiple strings - join them
                        Some(
                            txt.iter()
                                .map(|bytes| String::from_utf8_lossy(bytes).to_string())
                                .collect::<Vec<String>>()
                                .join(""),
                        )
                    } else {
                        None
                    }
                })
                .collect();
            Ok::<_, ResolutionError>(txt_records)
        })
    }
}

fn classify_resolve_error(name: &str, e: ResolveError) -> ResolutionError {
    match e.kind() {
        ResolveErrorKind::NoRecordsFound { .. } => ResolutionError::NotFound(name.to_string()),
        ResolveErrorKind::Timeout => {
            log::warn!("DNS lookup timed out for {name}");
            ResolutionError::Timeout(name.to_string())
        }
        _ => {
            log::warn!("DNS lookup failed for {name}: {e}");
            ResolutionError::Failed(e.to_string())
        }
    }
}
