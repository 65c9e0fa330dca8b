//! Pinned DNS resolver for reqwest.
//!
//! Implements `reqwest::dns::Resolve` by answering only for the host that was
//! validated, with exactly the addresses that were validated. reqwest never
//! performs a lookup of its own, so an answer that changes between validation
//! and connect (DNS rebinding) cannot reach the socket.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use reqwest::dns::{Addrs, Name, Resolve, Resolving};

use super::address::AddressGuard;
use super::target::ValidatedTarget;

/// A resolver bound to one validated target.
#[derive(Debug, Clone)]
pub struct PinnedResolver {
    host: String,
    addrs: Arc<[IpAddr]>,
    guard: AddressGuard,
}

impl PinnedResolver {
    pub fn new(validated: &ValidatedTarget, guard: AddressGuard) -> Self {
        Self {
            host: validated.target.host.clone(),
            addrs: validated.addresses.iter().copied().collect(),
            guard,
        }
    }

    fn pinned_addrs(&self, requested: &str) -> Result<Vec<SocketAddr>, std::io::Error> {
        let requested = requested.trim_end_matches('.').to_ascii_lowercase();
        if requested != self.host {
            return Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                format!("SSRF blocked: '{requested}' is not the validated host"),
            ));
        }
        // Every pinned address must still pass the guard
        if self.addrs.is_empty() || self.addrs.iter().any(|ip| !self.guard.is_allowed(*ip)) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                format!("SSRF blocked: pinned addresses for '{requested}' are not allowed"),
            ));
        }
        Ok(self.addrs.iter().map(|ip| SocketAddr::new(*ip, 0)).collect())
    }
}

impl Resolve for PinnedResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let resolved = self
            .pinned_addrs(name.as_str())
            .map(|addrs| -> Addrs { Box::new(addrs.into_iter()) })
            .map_err(|e| -> Box<dyn std::error::Error + Send + Sync> { Box::new(e) });
        Box::pin(async move { resolved })
    }
}
