//! Outgoing request headers.
//!
//! Scans identify themselves honestly: a fixed product User-Agent (set on the
//! client) and plain content negotiation. No browser impersonation and no
//! compression, so declared and received body sizes stay comparable.

/// Standard headers for scan requests.
pub(crate) struct RequestHeaders;

impl RequestHeaders {
    /// Applies the standard request headers to a `reqwest::RequestBuilder`.
    pub(crate) fn apply_to_request_builder(
        builder: reqwest::RequestBuilder,
    ) -> reqwest::RequestBuilder {
        builder
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .header(reqwest::header::ACCEPT_ENCODING, "identity")
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .header(reqwest::header::DNT, "1")
    }
}
