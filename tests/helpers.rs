// Shared test helpers: local target servers and scanner wiring.
//
// Every target runs on 127.0.0.1 and is reached through a FixedLookup, with
// 127.0.0.1 exempted from the address guard. Nothing touches the internet.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;

use site_posture::config::{FetchLimits, OrchestratorSettings};
use site_posture::dns::{FixedLookup, HostLookup};
use site_posture::engine::ScanEngine;
use site_posture::error_handling::ProcessingStats;
use site_posture::fetch::SafeFetcher;
use site_posture::security::AddressGuard;
use site_posture::storage::HistoryStore;
use site_posture::Orchestrator;

pub const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Serves `app` on an ephemeral local port.
pub async fn spawn_target(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test target");
    let addr = listener.local_addr().expect("Failed to read local address");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Guard that lets tests reach their local servers.
pub fn local_guard() -> AddressGuard {
    AddressGuard::with_allowed([LOCALHOST])
}

/// Lookup mapping each of `hosts` to 127.0.0.1.
#[allow(dead_code)]
pub fn local_lookup(hosts: &[&str]) -> FixedLookup {
    hosts
        .iter()
        .fold(FixedLookup::new(), |lookup, host| lookup.with_host(host, &[LOCALHOST]))
}

/// Limits small enough for tests to hit quickly.
pub fn test_limits() -> FetchLimits {
    FetchLimits {
        connect_timeout: Duration::from_secs(2),
        read_timeout: Duration::from_secs(2),
        total_timeout: Duration::from_secs(5),
        max_body_bytes: 64 * 1024,
        max_prefix_bytes: 4 * 1024,
        max_redirects: 5,
        user_agent: "site_posture-tests".to_string(),
    }
}

#[allow(dead_code)]
pub fn fetcher(lookup: Arc<dyn HostLookup>, limits: FetchLimits) -> SafeFetcher {
    SafeFetcher::new(lookup, local_guard(), limits)
}

#[allow(dead_code)]
pub fn engine(lookup: Arc<dyn HostLookup>) -> ScanEngine {
    let fetcher = fetcher(Arc::clone(&lookup), test_limits());
    ScanEngine::new(lookup, local_guard(), fetcher)
}

#[allow(dead_code)]
pub fn test_settings() -> OrchestratorSettings {
    OrchestratorSettings {
        workers: 2,
        queue_capacity: 16,
        job_timeout: Duration::from_secs(10),
        cache_ttl: Duration::from_secs(60),
        job_retention: Duration::from_secs(60),
        rate_limit: 0,
        rate_limit_window: Duration::from_secs(60),
    }
}

#[allow(dead_code)]
pub fn orchestrator(
    lookup: Arc<dyn HostLookup>,
    settings: OrchestratorSettings,
    history: Option<Arc<dyn HistoryStore>>,
) -> Arc<Orchestrator> {
    Arc::new(Orchestrator::new(
        engine(lookup),
        settings,
        Arc::new(ProcessingStats::new()),
        history,
    ))
}
