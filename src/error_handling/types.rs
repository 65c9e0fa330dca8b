//! Error type definitions.
//!
//! Internal errors carry full detail for the server log. Anything that crosses
//! the caller boundary goes through [`ScanError::public_message`], which never
//! names addresses, ranges or transport internals.

use log::SetLoggerError;
use strum_macros::{EnumIter, IntoStaticStr};
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the DNS resolver.
    #[error("DNS resolver initialization error: {0}")]
    DnsResolverError(String),
}

/// Error types for history database operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error creating the database file.
    #[error("Database file creation error: {0}")]
    FileCreationError(String),

    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    /// Stored report could not be encoded or decoded.
    #[error("Report serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Rejection reasons from the URL safety validator.
///
/// The `Display` strings are already safe to show to callers: they say what
/// kind of problem the input has, never which internal range matched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Input could not be parsed as a URL or host.
    #[error("malformed input")]
    MalformedInput,
    /// Scheme other than http/https.
    #[error("only http and https URLs can be scanned")]
    InvalidScheme,
    /// Host did not resolve to any address.
    #[error("host could not be resolved")]
    UnresolvableHost,
    /// Host is, or resolves to, a disallowed address.
    #[error("target address is not allowed")]
    UnsafeAddress,
}

/// DNS lookup failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// NXDOMAIN or an empty answer.
    #[error("no records found for {0}")]
    NotFound(String),
    /// Resolver did not answer in time.
    #[error("DNS lookup timed out for {0}")]
    Timeout(String),
    /// Any other resolver failure.
    #[error("DNS lookup failed: {0}")]
    Failed(String),
}

/// Failures of the bounded fetcher. Partial data is never returned alongside these.
#[derive(Error, Debug)]
pub enum FetchError {
    /// TCP/TLS connection could not be established.
    #[error("connection failed: {0}")]
    Connect(String),
    /// Connect, read or total budget exceeded.
    #[error("fetch timed out: {0}")]
    Timeout(String),
    /// Declared `Content-Length` exceeds the ceiling.
    #[error("response too large: declared {declared} bytes, limit {limit}")]
    BodyTooLarge { declared: u64, limit: usize },
    /// More redirects than allowed.
    #[error("too many redirects (limit {0})")]
    TooManyRedirects(usize),
    /// A redirect pointed at a target the validator rejected.
    #[error("redirect to {location} rejected: {reason}")]
    UnsafeRedirect {
        location: String,
        reason: ValidationError,
    },
    /// A redirect `Location` could not be parsed.
    #[error("invalid redirect location: {0}")]
    InvalidRedirect(String),
    /// The transport connected to an address outside the validated set.
    #[error("connected peer {0} is not a validated address")]
    UnpinnedPeer(String),
    /// Any other transport or protocol failure.
    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout(e.to_string())
        } else if e.is_connect() {
            FetchError::Connect(e.to_string())
        } else {
            FetchError::Request(e.to_string())
        }
    }
}

/// Caller-facing error taxonomy.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Malformed URL; not retried.
    #[error("invalid input: {0}")]
    InvalidInput(ValidationError),
    /// Wrong scheme or disallowed address; not retried.
    #[error("unsafe target: {0}")]
    UnsafeTarget(ValidationError),
    /// Host did not resolve.
    #[error("resolution failed: {0}")]
    Resolution(String),
    /// Fetch failed.
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    /// Job or fetch exceeded its wall-clock budget.
    #[error("scan timed out")]
    Timeout,
    /// Caller exceeded the submission rate.
    #[error("rate limit exceeded for client {0}")]
    RateLimited(String),
    /// Unknown job id.
    #[error("job {0} not found")]
    NotFound(String),
    /// Job queue is full.
    #[error("job queue is full")]
    Busy,
    /// Unexpected fault; detail stays in the server log.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ValidationError> for ScanError {
    fn from(e: ValidationError) -> Self {
        match e {
            ValidationError::MalformedInput => ScanError::InvalidInput(e),
            ValidationError::UnresolvableHost => ScanError::Resolution(e.to_string()),
            ValidationError::InvalidScheme | ValidationError::UnsafeAddress => {
                ScanError::UnsafeTarget(e)
            }
        }
    }
}

impl ScanError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            ScanError::InvalidInput(_) => "InvalidInput",
            ScanError::UnsafeTarget(ValidationError::InvalidScheme) => "InvalidScheme",
            ScanError::UnsafeTarget(_) => "UnsafeAddress",
            ScanError::Resolution(_) => "ResolutionError",
            ScanError::Fetch(FetchError::UnsafeRedirect { .. }) => "UnsafeRedirect",
            ScanError::Fetch(FetchError::Timeout(_)) | ScanError::Timeout => "Timeout",
            ScanError::Fetch(_) => "FetchError",
            ScanError::RateLimited(_) => "RateLimited",
            ScanError::NotFound(_) => "NotFound",
            ScanError::Busy => "Busy",
            ScanError::Internal(_) => "InternalError",
        }
    }

    /// Message shown to callers.
    ///
    /// Deliberately vague about addresses and network layout; the `Display`
    /// form with full detail is for the server log only.
    pub fn public_message(&self) -> String {
        match self {
            ScanError::InvalidInput(e) | ScanError::UnsafeTarget(e) => e.to_string(),
            ScanError::Resolution(_) => "host could not be resolved".to_string(),
            ScanError::Fetch(e) => match e {
                FetchError::Connect(_) => "could not connect to the target".to_string(),
                FetchError::Timeout(_) => "the target took too long to respond".to_string(),
                FetchError::BodyTooLarge { .. } => "the target response is too large".to_string(),
                FetchError::TooManyRedirects(_) => "the target redirected too many times".to_string(),
                FetchError::UnsafeRedirect { .. } | FetchError::UnpinnedPeer(_) => {
                    "the target redirected to an address that is not allowed".to_string()
                }
                FetchError::InvalidRedirect(_) => "the target sent an invalid redirect".to_string(),
                FetchError::Request(_) => "the request to the target failed".to_string(),
            },
            ScanError::Timeout => "the scan took too long and was stopped".to_string(),
            ScanError::RateLimited(_) => "too many scan requests, try again later".to_string(),
            ScanError::NotFound(_) => "scan job not found".to_string(),
            ScanError::Busy => "the scanner is busy, try again shortly".to_string(),
            ScanError::Internal(_) => "internal error".to_string(),
        }
    }
}

/// Events counted by [`super::ProcessingStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum EventType {
    JobQueued,
    JobCompleted,
    JobFailed,
    JobTimedOut,
    JobPanicked,
    CacheHit,
    Deduplicated,
    RateLimited,
    QueueFull,
    RejectedInput,
    UnsafeRedirect,
    HistoryWriteFailed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_maps_to_taxonomy() {
        assert!(matches!(
            ScanError::from(ValidationError::MalformedInput),
            ScanError::InvalidInput(_)
        ));
        assert!(matches!(
            ScanError::from(ValidationError::InvalidScheme),
            ScanError::UnsafeTarget(_)
        ));
        assert!(matches!(
            ScanError::from(ValidationError::UnsafeAddress),
            ScanError::UnsafeTarget(_)
        ));
        assert!(matches!(
            ScanError::from(ValidationError::UnresolvableHost),
            ScanError::Resolution(_)
        ));
    }

    #[test]
    fn test_public_message_hides_addresses() {
        let err = ScanError::Fetch(FetchError::UnsafeRedirect {
            location: "http://10.1.2.3/admin".to_string(),
            reason: ValidationError::UnsafeAddress,
        });
        let message = err.public_message();
        assert!(!message.contains("10.1.2.3"));
        assert_eq!(err.code(), "UnsafeRedirect");
        // Full detail remains available for logs.
        assert!(err.to_string().contains("10.1.2.3"));
    }

    #[test]
    fn test_internal_error_is_generic() {
        let err = ScanError::Internal("worker panicked at src/fetch/mod.rs:42".to_string());
        assert_eq!(err.public_message(), "internal error");
        assert_eq!(err.code(), "InternalError");
    }

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(
            ScanError::UnsafeTarget(ValidationError::UnsafeAddress).code(),
            "UnsafeAddress"
        );
        assert_eq!(
            ScanError::UnsafeTarget(ValidationError::InvalidScheme).code(),
            "InvalidScheme"
        );
        assert_eq!(ScanError::Timeout.code(), "Timeout");
        assert_eq!(ScanError::RateLimited("c".into()).code(), "RateLimited");
        assert_eq!(ScanError::NotFound("x".into()).code(), "NotFound");
    }
}
