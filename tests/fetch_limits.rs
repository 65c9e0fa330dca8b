//! Size and time limits of the bounded fetcher against local servers.

mod helpers;

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::{Body, Bytes};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures::StreamExt;

use helpers::{fetcher, local_guard, local_lookup, spawn_target, test_limits};
use site_posture::config::FetchLimits;
use site_posture::fetch::FetchOutcome;
use site_posture::security::validate_url;
use site_posture::FetchError;

async fn fetch(app: Router, limits: FetchLimits) -> Result<FetchOutcome, FetchError> {
    let addr = spawn_target(app).await;
    let lookup = Arc::new(local_lookup(&["site.test"]));
    let target = validate_url(
        &format!("http://site.test:{}/", addr.port()),
        lookup.as_ref(),
        &local_guard(),
    )
    .await
    .expect("local target should validate");
    fetcher(lookup, limits).fetch(&target).await
}

#[tokio::test]
async fn test_declared_length_over_ceiling_is_refused() {
    let app = Router::new().route("/", get(|| async { vec![b'x'; 8 * 1024] }));
    let limits = FetchLimits {
        max_body_bytes: 1024,
        max_prefix_bytes: 512,
        ..test_limits()
    };

    let err = fetch(app, limits).await.unwrap_err();
    assert!(
        matches!(err, FetchError::BodyTooLarge { declared: 8192, limit: 1024 }),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn test_unbounded_stream_is_truncated() {
    // 64 chunks of 1KiB with no Content-Length
    let app = Router::new().route(
        "/",
        get(|| async {
            let chunks = futures::stream::iter(0..64)
                .map(|_| Ok::<_, std::io::Error>(Bytes::from(vec![b'a'; 1024])));
            Body::from_stream(chunks)
        }),
    );
    let limits = FetchLimits {
        max_body_bytes: 8 * 1024,
        max_prefix_bytes: 2 * 1024,
        ..test_limits()
    };

    let outcome = fetch(app, limits).await.expect("truncation is not an error");
    assert!(outcome.truncated);
    assert!(outcome.bytes_read > 8 * 1024);
    assert_eq!(outcome.body_prefix.len(), 2 * 1024);
}

#[tokio::test]
async fn test_body_within_ceiling_is_complete() {
    let app = Router::new().route("/", get(|| async { "<html>hello</html>" }));
    let outcome = fetch(app, test_limits()).await.unwrap();
    assert_eq!(outcome.status_code, 200);
    assert!(!outcome.truncated);
    assert_eq!(outcome.bytes_read, 18);
    assert_eq!(outcome.body_prefix, b"<html>hello</html>");
    assert_eq!(outcome.redirect_chain.len(), 1);
}

#[tokio::test]
async fn test_stalled_body_times_out() {
    // Headers and one chunk, then nothing
    let app = Router::new().route(
        "/",
        get(|| async {
            let first =
                futures::stream::iter([Ok::<_, std::io::Error>(Bytes::from_static(b"start"))]);
            let stall = futures::stream::once(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok::<_, std::io::Error>(Bytes::from_static(b"late"))
            });
            Body::from_stream(first.chain(stall))
        }),
    );
    let limits = FetchLimits {
        read_timeout: Duration::from_millis(300),
        total_timeout: Duration::from_secs(3),
        ..test_limits()
    };

    let started = Instant::now();
    let err = fetch(app, limits).await.unwrap_err();
    assert!(matches!(err, FetchError::Timeout(_)), "unexpected error: {err:?}");
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn test_long_header_values_are_cut() {
    let app = Router::new().route(
        "/",
        get(|| async {
            let mut response = "ok".into_response();
            let headers = response.headers_mut();
            for i in 0..40 {
                let name =
                    header::HeaderName::from_bytes(format!("x-extra-{i}").as_bytes()).unwrap();
                headers.insert(name, header::HeaderValue::from_static("v"));
            }
            headers.insert(
                "x-long",
                header::HeaderValue::from_str(&"y".repeat(20 * 1024)).unwrap(),
            );
            response
        }),
    );

    let outcome = fetch(app, test_limits()).await.unwrap();
    assert!(outcome.headers.len() > 40);
    assert_eq!(
        outcome.header("x-long").map(str::len),
        Some(site_posture::config::MAX_HEADER_VALUE_LENGTH)
    );
    assert!(outcome
        .headers
        .iter()
        .all(|(_, v)| v.len() <= site_posture::config::MAX_HEADER_VALUE_LENGTH));
}
