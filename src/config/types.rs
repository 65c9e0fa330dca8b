//! Configuration types and CLI options.
//!
//! This module defines the enums and structs used for command-line argument
//! parsing, plus the narrower settings views handed to the fetcher and the
//! orchestrator.

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::constants::*;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Service configuration.
///
/// Every option has a long flag and an environment variable, so the binary
/// can be configured from a `.env` file. `Config::default()` matches the
/// constants in [`crate::config`], which makes it usable from tests and
/// library callers without going through clap.
#[derive(Debug, Clone, Parser)]
#[command(name = "site_posture", version, about)]
pub struct Config {
    /// Log level
    #[arg(long, value_enum, default_value = "info", env = "SITE_POSTURE_LOG_LEVEL")]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value = "plain", env = "SITE_POSTURE_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Address the HTTP API listens on
    #[arg(long, default_value = DEFAULT_LISTEN_ADDR, env = "SITE_POSTURE_LISTEN")]
    pub listen: String,

    /// Scan history database path (SQLite file)
    #[arg(long, default_value = DB_PATH, env = "SITE_POSTURE_DB_PATH")]
    pub db_path: PathBuf,

    /// Number of scans executed concurrently
    #[arg(long, default_value_t = WORKER_COUNT, env = "SITE_POSTURE_WORKERS")]
    pub workers: usize,

    /// Maximum number of jobs waiting for a worker
    #[arg(long, default_value_t = QUEUE_CAPACITY, env = "SITE_POSTURE_QUEUE_CAPACITY")]
    pub queue_capacity: usize,

    /// TCP connect timeout in seconds
    #[arg(long, default_value_t = TCP_CONNECT_TIMEOUT_SECS, env = "SITE_POSTURE_CONNECT_TIMEOUT")]
    pub connect_timeout_secs: u64,

    /// Read timeout in seconds
    #[arg(long, default_value_t = READ_TIMEOUT_SECS, env = "SITE_POSTURE_READ_TIMEOUT")]
    pub read_timeout_secs: u64,

    /// Wall-clock budget for one fetch (redirects included) in seconds
    #[arg(long, default_value_t = FETCH_TOTAL_TIMEOUT_SECS, env = "SITE_POSTURE_FETCH_TIMEOUT")]
    pub fetch_timeout_secs: u64,

    /// Wall-clock budget for one job in seconds
    #[arg(long, default_value_t = JOB_TIMEOUT.as_secs(), env = "SITE_POSTURE_JOB_TIMEOUT")]
    pub job_timeout_secs: u64,

    /// Response body ceiling in bytes
    #[arg(long, default_value_t = MAX_RESPONSE_BODY_SIZE, env = "SITE_POSTURE_MAX_BODY")]
    pub max_body_bytes: usize,

    /// Maximum redirect hops followed per scan
    #[arg(long, default_value_t = MAX_REDIRECT_HOPS, env = "SITE_POSTURE_MAX_REDIRECTS")]
    pub max_redirects: usize,

    /// Seconds a completed result is served from cache
    #[arg(long, default_value_t = RESULT_CACHE_TTL.as_secs(), env = "SITE_POSTURE_CACHE_TTL")]
    pub cache_ttl_secs: u64,

    /// Scan submissions allowed per client per window
    #[arg(long, default_value_t = RATE_LIMIT_MAX_SUBMISSIONS, env = "SITE_POSTURE_RATE_LIMIT")]
    pub rate_limit: usize,

    /// Rate limit window in seconds
    #[arg(long, default_value_t = RATE_LIMIT_WINDOW.as_secs(), env = "SITE_POSTURE_RATE_WINDOW")]
    pub rate_limit_window_secs: u64,

    /// Days of scan history kept before pruning
    #[arg(long, default_value_t = HISTORY_RETENTION_DAYS, env = "SITE_POSTURE_HISTORY_DAYS")]
    pub history_retention_days: i64,

    /// Exact addresses exempted from the address guard (repeatable).
    /// Empty by default; only for scanning a known internal staging host.
    #[arg(long = "allow-address", env = "SITE_POSTURE_ALLOW_ADDRESSES", value_delimiter = ',')]
    pub allow_addresses: Vec<IpAddr>,

    /// HTTP User-Agent header value
    #[arg(long, default_value = DEFAULT_USER_AGENT, env = "SITE_POSTURE_USER_AGENT")]
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            listen: DEFAULT_LISTEN_ADDR.to_string(),
            db_path: PathBuf::from(DB_PATH),
            workers: WORKER_COUNT,
            queue_capacity: QUEUE_CAPACITY,
            connect_timeout_secs: TCP_CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
            fetch_timeout_secs: FETCH_TOTAL_TIMEOUT_SECS,
            job_timeout_secs: JOB_TIMEOUT.as_secs(),
            max_body_bytes: MAX_RESPONSE_BODY_SIZE,
            max_redirects: MAX_REDIRECT_HOPS,
            cache_ttl_secs: RESULT_CACHE_TTL.as_secs(),
            rate_limit: RATE_LIMIT_MAX_SUBMISSIONS,
            rate_limit_window_secs: RATE_LIMIT_WINDOW.as_secs(),
            history_retention_days: HISTORY_RETENTION_DAYS,
            allow_addresses: Vec::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Config {
    /// Limits applied by the fetcher.
    pub fn fetch_limits(&self) -> FetchLimits {
        FetchLimits {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            read_timeout: Duration::from_secs(self.read_timeout_secs),
            total_timeout: Duration::from_secs(self.fetch_timeout_secs),
            max_body_bytes: self.max_body_bytes,
            max_prefix_bytes: MAX_BODY_PREFIX_SIZE.min(self.max_body_bytes),
            max_redirects: self.max_redirects,
            user_agent: self.user_agent.clone(),
        }
    }

    /// Pool, cache and rate-limit settings for the orchestrator.
    pub fn orchestrator_settings(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            workers: self.workers.max(1),
            queue_capacity: self.queue_capacity.max(1),
            job_timeout: Duration::from_secs(self.job_timeout_secs),
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            job_retention: JOB_RETENTION,
            rate_limit: self.rate_limit,
            rate_limit_window: Duration::from_secs(self.rate_limit_window_secs),
        }
    }
}

/// Timeouts and size ceilings for one fetch.
#[derive(Debug, Clone)]
pub struct FetchLimits {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub total_timeout: Duration,
    pub max_body_bytes: usize,
    pub max_prefix_bytes: usize,
    pub max_redirects: usize,
    pub user_agent: String,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Config::default().fetch_limits()
    }
}

/// Settings for the job orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub workers: usize,
    pub queue_capacity: usize,
    pub job_timeout: Duration,
    pub cache_ttl: Duration,
    pub job_retention: Duration,
    /// Submissions per client per window; 0 disables rate limiting
    pub rate_limit: usize,
    pub rate_limit_window: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Config::default().orchestrator_settings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Error),
            log::LevelFilter::Error
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Warn),
            log::LevelFilter::Warn
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Info),
            log::LevelFilter::Info
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Debug),
            log::LevelFilter::Debug
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Trace),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn test_config_default_matches_constants() {
        let config = Config::default();
        assert_eq!(config.workers, WORKER_COUNT);
        assert_eq!(config.max_redirects, MAX_REDIRECT_HOPS);
        assert_eq!(config.max_body_bytes, MAX_RESPONSE_BODY_SIZE);
        assert_eq!(config.cache_ttl_secs, 3600);
        assert!(config.allow_addresses.is_empty());
        assert_eq!(config.db_path, PathBuf::from(DB_PATH));
    }

    #[test]
    fn test_config_parses_flags() {
        let config = Config::parse_from([
            "site_posture",
            "--workers",
            "2",
            "--max-redirects",
            "3",
            "--allow-address",
            "127.0.0.1",
            "--log-format",
            "json",
        ]);
        assert_eq!(config.workers, 2);
        assert_eq!(config.max_redirects, 3);
        assert_eq!(config.allow_addresses, vec!["127.0.0.1".parse::<IpAddr>().unwrap()]);
        assert!(matches!(config.log_format, LogFormat::Json));
    }

    #[test]
    fn test_fetch_limits_prefix_never_exceeds_ceiling() {
        let config = Config {
            max_body_bytes: 1024,
            ..Default::default()
        };
        let limits = config.fetch_limits();
        assert_eq!(limits.max_body_bytes, 1024);
        assert_eq!(limits.max_prefix_bytes, 1024);
        assert_eq!(limits.connect_timeout, Duration::from_secs(5));
        assert_eq!(limits.read_timeout, Duration::from_secs(10));
        assert_eq!(limits.total_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_orchestrator_settings_clamp_pool_size() {
        let config = Config {
            workers: 0,
            queue_capacity: 0,
            ..Default::default()
        };
        let settings = config.orchestrator_settings();
        assert_eq!(settings.workers, 1);
        assert_eq!(settings.queue_capacity, 1);
    }
}
