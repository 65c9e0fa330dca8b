//! Bounded, SSRF-safe HTTP fetching.
//!
//! [`SafeFetcher::fetch`] performs one GET against a validated target and
//! follows redirects manually. Every hop is re-validated (fresh DNS, full
//! address check) and its connection is pinned to the addresses that passed.
//! Connect, read and total time are bounded, as are body size and headers.

mod body;
mod client;
mod redirects;
mod request;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use reqwest::Url;

use crate::config::FetchLimits;
use crate::dns::HostLookup;
use crate::error_handling::{FetchError, ValidationError};
use crate::security::{validate_url, AddressGuard, ValidatedTarget};

use body::{collect_headers, read_bounded_body};
use client::build_pinned_client;
use redirects::{hop_url, is_followed_redirect, next_location};
use request::RequestHeaders;

pub use types::FetchOutcome;

/// Fetches validated targets under fixed limits.
#[derive(Clone)]
pub struct SafeFetcher {
    lookup: Arc<dyn HostLookup>,
    guard: AddressGuard,
    limits: FetchLimits,
}

impl SafeFetcher {
    pub fn new(lookup: Arc<dyn HostLookup>, guard: AddressGuard, limits: FetchLimits) -> Self {
        Self {
            lookup,
            guard,
            limits,
        }
    }

    pub fn limits(&self) -> &FetchLimits {
        &self.limits
    }

    /// Fetches `target`, following up to `max_redirects` redirects.
    ///
    /// # Errors
    ///
    /// - `Timeout` when the connect, read or total budget runs out
    /// - `BodyTooLarge` when a declared length exceeds the ceiling
    /// - `UnsafeRedirect` / `InvalidRedirect` / `TooManyRedirects` for redirects
    /// - `UnpinnedPeer` if the connection landed outside the validated set
    ///
    /// No partial outcome is returned with an error.
    pub async fn fetch(&self, target: &ValidatedTarget) -> Result<FetchOutcome, FetchError> {
        let total = self.limits.total_timeout;
        match tokio::time::timeout(total, self.fetch_hops(target)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(format!(
                "total budget of {}ms exceeded for {}",
                total.as_millis(),
                target.target
            ))),
        }
    }

    async fn fetch_hops(&self, initial: &ValidatedTarget) -> Result<FetchOutcome, FetchError> {
        let started = Instant::now();
        let mut hop = initial.clone();
        let mut url = initial
            .target
            .request_url()
            .map_err(|e| FetchError::Request(format!("invalid target URL: {e}")))?;
        let mut chain: Vec<String> = Vec::new();
        let mut redirects = 0usize;

        loop {
            chain.push(url.to_string());
            let client = build_pinned_client(&hop, &self.guard, &self.limits)?;
            log::debug!("GET {url} via {:?}", hop.addresses);
            let response = RequestHeaders::apply_to_request_builder(client.get(url.clone()))
                .send()
                .await?;

            self.verify_peer(&response, &hop)?;

            let status = response.status().as_u16();
            if is_followed_redirect(status) {
                if let Some(location) = next_location(&url, response.headers())? {
                    if redirects >= self.limits.max_redirects {
                        return Err(FetchError::TooManyRedirects(self.limits.max_redirects));
                    }
                    redirects += 1;
                    drop(response);
                    hop = self.validate_hop(&location).await?;
                    url = hop_url(&hop, &location)?;
                    continue;
                }
                log::warn!("Redirect status {status} for {url} but no Location header");
            }

            let headers = collect_headers(response.headers());
            let final_url = url.to_string();
            let body = read_bounded_body(
                response,
                self.limits.max_body_bytes,
                self.limits.max_prefix_bytes,
            )
            .await?;

            return Ok(FetchOutcome {
                status_code: status,
                headers,
                body_prefix: body.prefix,
                final_url,
                bytes_read: body.bytes_read,
                truncated: body.truncated,
                redirect_chain: chain,
                elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            });
        }
    }

    /// Re-validates a redirect target from scratch.
    async fn validate_hop(&self, location: &Url) -> Result<ValidatedTarget, FetchError> {
        validate_url(location.as_str(), self.lookup.as_ref(), &self.guard)
            .await
            .map_err(|reason| {
                log::warn!("Redirect to {location} rejected: {reason}");
                match reason {
                    ValidationError::MalformedInput => {
                        FetchError::InvalidRedirect(location.to_string())
                    }
                    ValidationError::UnresolvableHost => {
                        FetchError::Connect(format!("redirect host of {location} did not resolve"))
                    }
                    ValidationError::InvalidScheme | ValidationError::UnsafeAddress => {
                        FetchError::UnsafeRedirect {
                            location: location.to_string(),
                            reason,
                        }
                    }
                }
            })
    }

    fn verify_peer(
        &self,
        response: &reqwest::Response,
        hop: &ValidatedTarget,
    ) -> Result<(), FetchError> {
        check_peer(&self.guard, response.remote_addr(), hop)
    }
}

/// The connected peer must be one of the hop's validated addresses. A
/// connection that reports no peer is refused.
fn check_peer(
    guard: &AddressGuard,
    peer: Option<SocketAddr>,
    hop: &ValidatedTarget,
) -> Result<(), FetchError> {
    let Some(peer) = peer else {
        log::error!("Connection for {} reported no peer address", hop.target);
        return Err(FetchError::UnpinnedPeer("unknown peer".to_string()));
    };
    if guard.check_socket_addr(&peer).is_err() || !hop.addresses.contains(&peer.ip()) {
        log::error!(
            "Connection for {} landed on {peer}, outside {:?}",
            hop.target,
            hop.addresses
        );
        return Err(FetchError::UnpinnedPeer(peer.to_string()));
    }
    Ok(())
}
