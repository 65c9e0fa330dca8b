//! Redirect handling.
//!
//! Redirects are followed manually, one validated hop at a time. The next hop
//! keeps the `Location` path and query but its connection target comes from
//! re-validation, never from the raw header.

use reqwest::Url;

use crate::error_handling::FetchError;
use crate::security::ValidatedTarget;

/// Status codes that are followed when a `Location` header is present.
pub(crate) fn is_followed_redirect(status: u16) -> bool {
    matches!(status, 301 | 302 | 303 | 307 | 308)
}

/// Resolves the `Location` header of `response` against `current`.
///
/// Returns `Ok(None)` when there is no `Location` header; the response is then
/// treated as final.
pub(crate) fn next_location(
    current: &Url,
    headers: &reqwest::header::HeaderMap,
) -> Result<Option<Url>, FetchError> {
    let Some(location) = headers.get(reqwest::header::LOCATION) else {
        return Ok(None);
    };
    let location = location
        .to_str()
        .map_err(|_| FetchError::InvalidRedirect("non-ASCII Location header".to_string()))?
        .trim();
    if location.is_empty() {
        return Err(FetchError::InvalidRedirect("empty Location header".to_string()));
    }
    current
        .join(location)
        .map(Some)
        .map_err(|e| FetchError::InvalidRedirect(format!("{location}: {e}")))
}

/// URL actually requested for a validated hop: the validated origin plus the
/// path and query of `location`.
pub(crate) fn hop_url(hop: &ValidatedTarget, location: &Url) -> Result<Url, FetchError> {
    let mut url = hop
        .target
        .request_url()
        .map_err(|e| FetchError::InvalidRedirect(e.to_string()))?;
    url.set_path(location.path());
    url.set_query(location.query());
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::{ScanTarget, Scheme};
    use reqwest::header::{HeaderMap, HeaderValue, LOCATION};

    fn current() -> Url {
        Url::parse("http://site.test/start").unwrap()
    }

    #[test]
    fn test_followed_statuses() {
        for code in [301, 302, 303, 307, 308] {
            assert!(is_followed_redirect(code));
        }
        assert!(!is_followed_redirect(300));
        assert!(!is_followed_redirect(304));
        assert!(!is_followed_redirect(200));
    }

    #[test]
    fn test_relative_location_resolves_against_current() {
        let mut headers = HeaderMap::new();
        headers.insert(LOCATION, HeaderValue::from_static("/next?x=1"));
        let next = next_location(&current(), &headers).unwrap().unwrap();
        assert_eq!(next.as_str(), "http://site.test/next?x=1");
    }

    #[test]
    fn test_missing_location_is_final() {
        assert!(next_location(&current(), &HeaderMap::new()).unwrap().is_none());
    }

    #[test]
    fn test_hop_url_drops_userinfo_and_fragment() {
        let hop = ValidatedTarget {
            target: ScanTarget {
                scheme: Scheme::Https,
                host: "other.test".to_string(),
                port: 443,
                original: "https://other.test".to_string(),
            },
            addresses: vec!["93.184.216.34".parse().unwrap()],
        };
        let location = Url::parse("https://u:p@other.test/a/b?q=1#frag").unwrap();
        let url = hop_url(&hop, &location).unwrap();
        assert_eq!(url.as_str(), "https://other.test/a/b?q=1");
    }
}
