//! Scan target types produced by validation.

use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use url::Url;

/// Request scheme of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    pub fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized, syntactically safe target.
///
/// `host` is lowercase ASCII (IDNA-encoded for international names). IPv6
/// literals are stored without brackets. Path, query, fragment and userinfo
/// of the submitted input are not kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanTarget {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
    /// Display form of the submitted input: `scheme://host[:port]`.
    pub original: String,
}

impl ScanTarget {
    /// Deduplication and cache key. Scheme and port are part of it, since an
    /// http scan says nothing about the https origin of the same host.
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// The host as an address, when the input named one directly.
    pub fn literal_ip(&self) -> Option<IpAddr> {
        self.host.parse().ok()
    }

    pub fn is_https(&self) -> bool {
        self.scheme == Scheme::Https
    }

    /// `scheme://host[:port]/`, the only URL requested for the first hop.
    pub fn request_url(&self) -> Result<Url, url::ParseError> {
        let host = match self.literal_ip() {
            Some(IpAddr::V6(v6)) => format!("[{v6}]"),
            _ => self.host.clone(),
        };
        let authority = if self.port == self.scheme.default_port() {
            host
        } else {
            format!("{host}:{}", self.port)
        };
        Url::parse(&format!("{}://{authority}/", self.scheme))
    }
}

impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.port == self.scheme.default_port() {
            write!(f, "{}://{}", self.scheme, self.host)
        } else {
            write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
        }
    }
}

/// A target whose resolution answer passed the address guard.
///
/// `addresses` is the exact set connections to this target are pinned to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTarget {
    pub target: ScanTarget,
    pub addresses: Vec<IpAddr>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(scheme: Scheme, port: u16) -> ScanTarget {
        let mut target = ScanTarget {
            scheme,
            host: "example.com".to_string(),
            port,
            original: String::new(),
        };
        target.original = target.to_string();
        target
    }

    #[test]
    fn test_key_separates_scheme_and_port() {
        let http = target(Scheme::Http, 80);
        let https = target(Scheme::Https, 443);
        let alt = target(Scheme::Https, 8443);
        assert_eq!(http.key(), "http://example.com");
        assert_eq!(https.key(), "https://example.com");
        assert_eq!(alt.key(), "https://example.com:8443");
        assert_ne!(http.key(), https.key());
    }

    #[test]
    fn test_ipv6_request_url_is_bracketed() {
        let target = ScanTarget {
            scheme: Scheme::Https,
            host: "2606:4700::1111".to_string(),
            port: 443,
            original: String::new(),
        };
        assert_eq!(
            target.request_url().unwrap().as_str(),
            "https://[2606:4700::1111]/"
        );
    }
}
