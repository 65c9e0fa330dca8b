//! HTTP header name constants.
//!
//! Response headers inspected by the finding extractor. Names are lowercase
//! because lookups against recorded headers are case-insensitive.

// Transport and framing
/// HTTP Strict Transport Security header
pub const HEADER_STRICT_TRANSPORT_SECURITY: &str = "strict-transport-security";
/// Content Security Policy header
pub const HEADER_CONTENT_SECURITY_POLICY: &str = "content-security-policy";
/// X-Frame-Options header
pub const HEADER_X_FRAME_OPTIONS: &str = "x-frame-options";
/// X-Content-Type-Options header
pub const HEADER_X_CONTENT_TYPE_OPTIONS: &str = "x-content-type-options";
/// X-XSS-Protection header (deprecated)
pub const HEADER_X_XSS_PROTECTION: &str = "x-xss-protection";
/// Referrer-Policy header
pub const HEADER_REFERRER_POLICY: &str = "referrer-policy";
/// Permissions-Policy header
pub const HEADER_PERMISSIONS_POLICY: &str = "permissions-policy";
/// Feature-Policy header (legacy name of Permissions-Policy)
pub const HEADER_FEATURE_POLICY: &str = "feature-policy";
/// Cross-Origin-Opener-Policy header
pub const HEADER_CROSS_ORIGIN_OPENER_POLICY: &str = "cross-origin-opener-policy";
/// Cross-Origin-Embedder-Policy header
pub const HEADER_CROSS_ORIGIN_EMBEDDER_POLICY: &str = "cross-origin-embedder-policy";

// Information disclosure
/// Server header (identifies server software)
pub const HEADER_SERVER: &str = "server";
/// X-Powered-By header (identifies server framework)
pub const HEADER_X_POWERED_BY: &str = "x-powered-by";

// Cookies
/// Set-Cookie header (may occur many times)
pub const HEADER_SET_COOKIE: &str = "set-cookie";
