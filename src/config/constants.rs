//! Configuration constants.
//!
//! This module defines the defaults used throughout the scanner: network
//! timeouts, size ceilings, cache and retention windows, and pool sizing.

use std::time::Duration;

// Network operation timeouts
/// DNS query timeout in seconds
/// Most DNS queries complete in <1s, 3s fails fast on unresponsive servers
pub const DNS_TIMEOUT_SECS: u64 = 3;
/// TCP connection establishment timeout in seconds
pub const TCP_CONNECT_TIMEOUT_SECS: u64 = 5;
/// Per-read timeout in seconds (first byte and every later read)
/// A peer that accepts the connection and then trickles bytes is cut off here
pub const READ_TIMEOUT_SECS: u64 = 10;
/// Wall-clock budget for one complete fetch, redirects included
pub const FETCH_TOTAL_TIMEOUT_SECS: u64 = 30;
/// Wall-clock budget for one job (resolution + fetch + DNS records + scoring).
/// A job still running when this elapses is force-failed with `Timeout`.
pub const JOB_TIMEOUT: Duration = Duration::from_secs(45);

/// Scanner User-Agent. The scanner identifies itself instead of mimicking a browser.
pub const DEFAULT_USER_AGENT: &str =
    "site_posture/0.1 (passive security header scanner; +https://github.com/site-posture)";

// Response and body size limits
/// Hard ceiling on response body bytes read from a target (10MB)
/// A `Content-Length` above this aborts before reading; an unbounded stream
/// stops here and is flagged as truncated
pub const MAX_RESPONSE_BODY_SIZE: usize = 10 * 1024 * 1024;
/// Number of body bytes kept in memory for the report (64KB)
/// Bytes beyond this are counted but not buffered
pub const MAX_BODY_PREFIX_SIZE: usize = 64 * 1024;
/// Maximum number of response headers recorded (header bomb defense)
pub const MAX_HEADER_COUNT: usize = 100;
/// Maximum HTTP header value length in bytes
pub const MAX_HEADER_VALUE_LENGTH: usize = 8 * 1024;
/// Maximum accepted length of a user-supplied URL
pub const MAX_INPUT_LENGTH: usize = 2048;
/// Maximum error message length in characters
/// Error messages longer than this are truncated with a note about the original length
pub const MAX_ERROR_MESSAGE_LENGTH: usize = 500;

// Redirect handling
/// Maximum number of redirect hops to follow
/// Every hop is re-validated, so this also bounds DNS lookups per scan
pub const MAX_REDIRECT_HOPS: usize = 5;

// Orchestration
/// Number of scans executed concurrently
pub const WORKER_COUNT: usize = 8;
/// Maximum number of jobs waiting for a worker before submissions are refused
pub const QUEUE_CAPACITY: usize = 256;
/// How long a completed scan result is served from cache
pub const RESULT_CACHE_TTL: Duration = Duration::from_secs(3600);
/// How long finished jobs remain queryable by id
pub const JOB_RETENTION: Duration = Duration::from_secs(3600);

// Rate limiting
/// Scan submissions allowed per client per window
pub const RATE_LIMIT_MAX_SUBMISSIONS: usize = 30;
/// Rate limit window
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(3600);

// History
/// Default database path (SQLite file)
pub const DB_PATH: &str = "./site_posture.db";
/// Stored scan history older than this many days is pruned
pub const HISTORY_RETENTION_DAYS: i64 = 90;
/// Interval between history retention sweeps
pub const HISTORY_PRUNE_INTERVAL: Duration = Duration::from_secs(6 * 3600);
/// Upper bound on rows returned by a history listing
pub const HISTORY_MAX_LIMIT: u32 = 500;

// API server
/// Default API listen address
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
/// Longest a status request may block waiting for a job to finish
pub const STATUS_MAX_WAIT: Duration = Duration::from_secs(30);
/// Header carrying the authenticated user id, set by the upstream auth layer
pub const USER_ID_HEADER: &str = "x-user-id";
