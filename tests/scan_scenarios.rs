//! End-to-end scan scenarios, from a submitted URL to a graded report.

mod helpers;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::{header, StatusCode};
use axum::routing::get;
use axum::Router;

use helpers::{engine, local_lookup, orchestrator, spawn_target, test_settings};
use site_posture::dns::{FixedLookup, HostLookup};
use site_posture::fetch::FetchOutcome;
use site_posture::findings::{extract_findings, CheckName, DnsRecords, Severity};
use site_posture::scoring::{narrative, score_and_grade, Grade};
use site_posture::security::normalize_input;
use site_posture::{Caller, JobStatus, ScanError, SubmitOutcome};
use strum::IntoEnumIterator;

fn hardened_https_outcome() -> FetchOutcome {
    let headers = [
        ("strict-transport-security", "max-age=63072000; includeSubDomains; preload"),
        ("content-security-policy", "default-src 'self'; frame-ancestors 'none'"),
        ("x-frame-options", "DENY"),
        ("x-content-type-options", "nosniff"),
        ("referrer-policy", "strict-origin-when-cross-origin"),
        ("set-cookie", "sid=abc; Secure; HttpOnly; SameSite=Lax"),
    ];
    FetchOutcome {
        status_code: 200,
        headers: headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        body_prefix: b"<html></html>".to_vec(),
        final_url: "https://example.com/".to_string(),
        bytes_read: 13,
        truncated: false,
        redirect_chain: vec!["https://example.com/".to_string()],
        elapsed_ms: 12,
    }
}

fn published_mail_records() -> DnsRecords {
    DnsRecords {
        domain_txt: vec![
            "google-site-verification=abc".to_string(),
            "v=spf1 include:_spf.example.net -all".to_string(),
        ],
        dmarc_txt: vec!["v=DMARC1; p=reject; rua=mailto:d@example.com".to_string()],
    }
}

#[test]
fn test_hardened_https_site_is_excellent() {
    let findings = extract_findings(&hardened_https_outcome(), &published_mail_records());
    let (score, grade) = score_and_grade(&findings);

    assert!(score >= 80, "score {score}");
    assert_eq!(grade, Grade::Excellent);
    assert_eq!(grade.label(), "excellent");
    for check in [CheckName::Https, CheckName::Hsts, CheckName::Spf, CheckName::Dmarc] {
        assert_eq!(findings.get(check).unwrap().severity, Severity::Pass, "{check:?}");
    }
}

#[test]
fn test_extraction_and_scoring_are_deterministic() {
    let outcome = hardened_https_outcome();
    let records = published_mail_records();
    let first = extract_findings(&outcome, &records);
    let second = extract_findings(&outcome, &records);
    assert_eq!(first, second);

    let (score, grade) = score_and_grade(&first);
    assert_eq!((score, grade), score_and_grade(&second));
    assert_eq!(narrative(&first, score, grade), narrative(&second, score, grade));
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn test_plain_http_site_without_headers_is_critical() {
    let app = Router::new().route("/", get(|| async { "<html>plain</html>" }));
    let addr = spawn_target(app).await;
    let lookup: Arc<dyn HostLookup> = Arc::new(local_lookup(&["plain.test"]));
    let target = normalize_input(
        &format!("http://plain.test:{}", addr.port()),
        &helpers::local_guard(),
    )
    .unwrap();

    let seen = Mutex::new(Vec::new());
    let report = |p: u8| seen.lock().unwrap().push(p);
    let result = engine(lookup).run(&target, &report).await.unwrap();

    assert!(result.score < 40, "score {}", result.score);
    assert_eq!(result.grade, Grade::Critical);
    let https = result.findings.get(CheckName::Https).unwrap();
    assert!(!https.present);
    assert_eq!(https.severity, Severity::Fail);
    assert_eq!(result.findings.len(), CheckName::iter().count());
    assert!(result.narrative.starts_with("Security grade: Critical"));
    assert_eq!(*seen.lock().unwrap(), vec![25, 40, 90]);
}

#[tokio::test]
async fn test_metadata_address_is_rejected_before_any_lookup() {
    let lookup = Arc::new(FixedLookup::new());
    let orchestrator = orchestrator(lookup.clone(), test_settings(), None);

    let err = orchestrator
        .submit("http://169.254.169.254/", &Caller::anonymous("203.0.113.1"))
        .await
        .unwrap_err();
    assert!(matches!(err, ScanError::UnsafeTarget(_)));
    assert_eq!(err.code(), "UnsafeAddress");
    assert!(!err.public_message().contains("169.254"));
    assert_eq!(lookup.ip_lookup_count(), 0);
    assert_eq!(orchestrator.load(), (0, 0, 0));
}

#[tokio::test]
async fn test_redirect_to_private_address_fails_the_job() {
    let app = Router::new().route(
        "/",
        get(|| async {
            (
                StatusCode::MOVED_PERMANENTLY,
                [(header::LOCATION, "http://10.0.0.9/")],
            )
        }),
    );
    let addr = spawn_target(app).await;
    let orchestrator = orchestrator(
        Arc::new(local_lookup(&["redirector.test"])),
        test_settings(),
        None,
    );

    let SubmitOutcome::Queued(job) = orchestrator
        .submit(
            &format!("http://redirector.test:{}/", addr.port()),
            &Caller::anonymous("203.0.113.1"),
        )
        .await
        .unwrap()
    else {
        panic!("expected a queued job");
    };

    let done = orchestrator
        .wait(&job.job_id, Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(done.status, JobStatus::Failed);
    assert!(done.result.is_none());
    let error = done.error.unwrap();
    assert_eq!(error.code, "UnsafeRedirect");
    assert!(!error.message.contains("10.0.0.9"));
}

#[tokio::test]
async fn test_concurrent_submissions_share_one_job() {
    let app = Router::new().route(
        "/",
        get(|| async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            "slow"
        }),
    );
    let addr = spawn_target(app).await;
    let lookup = Arc::new(local_lookup(&["slow-site.test"]));
    let orchestrator = orchestrator(lookup.clone(), test_settings(), None);
    let url = format!("http://slow-site.test:{}/", addr.port());

    let first = orchestrator
        .submit(&url, &Caller::anonymous("198.51.100.1"))
        .await
        .unwrap();
    let second = orchestrator
        .submit(&url, &Caller::anonymous("198.51.100.2"))
        .await
        .unwrap();
    let (SubmitOutcome::Queued(first), SubmitOutcome::Attached(second)) = (first, second) else {
        panic!("expected queued then attached");
    };
    assert_eq!(first.job_id, second.job_id);

    let done = orchestrator
        .wait(&first.job_id, Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(done.status, JobStatus::Complete);
    assert_eq!(done.progress, 100);
    assert_eq!(lookup.ip_lookup_count(), 1);

    // Within the TTL the cached report is returned without another fetch
    let third = orchestrator
        .submit(&url, &Caller::anonymous("198.51.100.3"))
        .await
        .unwrap();
    let SubmitOutcome::Cached(cached) = third else {
        panic!("expected a cached result");
    };
    assert_eq!(Some(&cached), done.result.as_ref());
    assert_eq!(lookup.ip_lookup_count(), 1);
}
