//! Security header checks.
//!
//! Each check reads the first occurrence of its header (lookups are
//! case-insensitive); later occurrences are recorded as duplicates.

use crate::config::{
    HEADER_CONTENT_SECURITY_POLICY, HEADER_CROSS_ORIGIN_EMBEDDER_POLICY,
    HEADER_CROSS_ORIGIN_OPENER_POLICY, HEADER_FEATURE_POLICY, HEADER_PERMISSIONS_POLICY,
    HEADER_REFERRER_POLICY, HEADER_SERVER, HEADER_STRICT_TRANSPORT_SECURITY,
    HEADER_X_CONTENT_TYPE_OPTIONS, HEADER_X_FRAME_OPTIONS, HEADER_X_POWERED_BY,
    HEADER_X_XSS_PROTECTION,
};
use crate::fetch::FetchOutcome;

use super::types::{CheckName, Finding, Severity};

/// HSTS max-age that counts as long-lived (one year).
pub(crate) const HSTS_MIN_MAX_AGE: u64 = 31_536_000;

/// Longest value kept in a finding.
const MAX_DISPLAY_VALUE: usize = 200;

fn display_value(value: &str) -> String {
    let value = value.trim();
    match value.char_indices().nth(MAX_DISPLAY_VALUE) {
        Some((idx, _)) => format!("{}...", &value[..idx]),
        None => value.to_string(),
    }
}

/// First value of `name` plus the values of any repeats.
fn header_with_duplicates<'a>(
    outcome: &'a FetchOutcome,
    name: &str,
) -> Option<(&'a str, Vec<String>)> {
    let mut values = outcome.header_values(name).into_iter();
    let first = values.next()?;
    Some((first, values.map(display_value).collect()))
}

fn finding_for(
    outcome: &FetchOutcome,
    name: &str,
    absent: Severity,
    evaluate: impl FnOnce(&str) -> Finding,
) -> Finding {
    match header_with_duplicates(outcome, name) {
        Some((value, duplicates)) => {
            let finding = evaluate(value);
            if duplicates.is_empty() {
                finding
            } else {
                let count = duplicates.len() + 1;
                finding
                    .with_issue(format!("header sent {count} times; first value evaluated"))
                    .with_duplicates(duplicates)
            }
        }
        None => Finding::absent(absent),
    }
}

pub(crate) fn check_https(outcome: &FetchOutcome) -> Finding {
    if outcome.is_https() {
        Finding::present("https", Severity::Pass)
    } else {
        Finding::absent(Severity::Fail).with_issue("final URL is not served over HTTPS")
    }
}

/// Parsed `Strict-Transport-Security` directives.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct HstsPolicy {
    pub(crate) max_age: Option<u64>,
    pub(crate) include_subdomains: bool,
    pub(crate) preload: bool,
}

pub(crate) fn parse_hsts(value: &str) -> HstsPolicy {
    let mut policy = HstsPolicy::default();
    for directive in value.split(';').map(str::trim).filter(|d| !d.is_empty()) {
        let (name, arg) = match directive.split_once('=') {
            Some((n, a)) => (n.trim(), Some(a.trim().trim_matches('"'))),
            None => (directive, None),
        };
        if name.eq_ignore_ascii_case("max-age") {
            // Repeated max-age makes the header invalid
            if policy.max_age.is_some() {
                policy.max_age = None;
                break;
            }
            policy.max_age = arg.and_then(|a| a.parse::<u64>().ok());
        } else if name.eq_ignore_ascii_case("includesubdomains") {
            policy.include_subdomains = true;
        } else if name.eq_ignore_ascii_case("preload") {
            policy.preload = true;
        }
    }
    policy
}

pub(crate) fn check_hsts(outcome: &FetchOutcome) -> Finding {
    let https = outcome.is_https();
    finding_for(outcome, HEADER_STRICT_TRANSPORT_SECURITY, Severity::Fail, |value| {
        let policy = parse_hsts(value);
        let shown = display_value(value);
        let mut finding = match policy.max_age {
            None => Finding::present(shown, Severity::Fail).with_issue("missing or invalid max-age"),
            Some(0) => Finding::present(shown, Severity::Fail).with_issue("max-age=0 disables HSTS"),
            Some(age) if age >= HSTS_MIN_MAX_AGE && policy.include_subdomains => {
                Finding::present(shown, Severity::Pass)
            }
            Some(age) => {
                let mut f = Finding::present(shown, Severity::Warn);
                if age < HSTS_MIN_MAX_AGE {
                    f = f.with_issue("max-age shorter than one year");
                }
                if !policy.include_subdomains {
                    f = f.with_issue("includeSubDomains not set");
                }
                f
            }
        };
        if !https && finding.severity == Severity::Pass {
            finding = finding.with_issue("ignored by browsers over plain HTTP");
            finding.severity = Severity::Warn;
        }
        finding
    })
}

/// Weak sources found in a CSP value.
pub(crate) fn csp_issues(value: &str) -> Vec<String> {
    let mut issues = Vec::new();
    let lower = value.to_ascii_lowercase();
    if lower.contains("'unsafe-inline'") {
        issues.push("allows 'unsafe-inline'".to_string());
    }
    if lower.contains("'unsafe-eval'") {
        issues.push("allows 'unsafe-eval'".to_string());
    }
    let wildcard = lower
        .split(';')
        .flat_map(|directive| directive.split_whitespace().skip(1))
        .any(|source| source == "*");
    if wildcard {
        issues.push("wildcard source '*'".to_string());
    }
    issues
}

pub(crate) fn check_csp(outcome: &FetchOutcome) -> Finding {
    finding_for(outcome, HEADER_CONTENT_SECURITY_POLICY, Severity::Fail, |value| {
        let issues = csp_issues(value);
        let severity = if issues.is_empty() {
            Severity::Pass
        } else {
            Severity::Warn
        };
        let mut finding = Finding::present(display_value(value), severity);
        finding.issues = issues;
        finding
    })
}

pub(crate) fn check_x_frame_options(outcome: &FetchOutcome) -> Finding {
    finding_for(outcome, HEADER_X_FRAME_OPTIONS, Severity::Fail, |value| {
        let v = value.trim();
        if v.eq_ignore_ascii_case("deny") || v.eq_ignore_ascii_case("sameorigin") {
            Finding::present(display_value(v), Severity::Pass)
        } else {
            Finding::present(display_value(v), Severity::Warn)
                .with_issue("value is not DENY or SAMEORIGIN")
        }
    })
}

pub(crate) fn check_x_content_type_options(outcome: &FetchOutcome) -> Finding {
    finding_for(outcome, HEADER_X_CONTENT_TYPE_OPTIONS, Severity::Fail, |value| {
        if value.trim().eq_ignore_ascii_case("nosniff") {
            Finding::present("nosniff", Severity::Pass)
        } else {
            Finding::present(display_value(value), Severity::Warn).with_issue("value is not nosniff")
        }
    })
}

const STRICT_REFERRER_POLICIES: &[&str] = &[
    "no-referrer",
    "same-origin",
    "strict-origin",
    "strict-origin-when-cross-origin",
];

pub(crate) fn check_referrer_policy(outcome: &FetchOutcome) -> Finding {
    finding_for(outcome, HEADER_REFERRER_POLICY, Severity::Warn, |value| {
        // With a list, browsers apply the last token they understand
        let effective = value
            .split(',')
            .map(|t| t.trim().to_ascii_lowercase())
            .filter(|t| !t.is_empty())
            .last()
            .unwrap_or_default();
        if STRICT_REFERRER_POLICIES.contains(&effective.as_str()) {
            Finding::present(display_value(value), Severity::Pass)
        } else {
            Finding::present(display_value(value), Severity::Warn)
                .with_issue(format!("policy '{effective}' can leak full URLs"))
        }
    })
}

pub(crate) fn check_permissions_policy(outcome: &FetchOutcome) -> Finding {
    if outcome.header(HEADER_PERMISSIONS_POLICY).is_some() {
        return finding_for(outcome, HEADER_PERMISSIONS_POLICY, Severity::Warn, |value| {
            Finding::present(display_value(value), Severity::Pass)
        });
    }
    finding_for(outcome, HEADER_FEATURE_POLICY, Severity::Warn, |value| {
        Finding::present(display_value(value), Severity::Pass)
            .with_issue("legacy Feature-Policy header; use Permissions-Policy")
    })
}

pub(crate) fn check_coop(outcome: &FetchOutcome) -> Finding {
    finding_for(outcome, HEADER_CROSS_ORIGIN_OPENER_POLICY, Severity::Warn, |value| {
        let v = value.trim().to_ascii_lowercase();
        if v == "same-origin" || v == "same-origin-allow-popups" {
            Finding::present(v, Severity::Pass)
        } else {
            Finding::present(display_value(value), Severity::Warn)
                .with_issue("does not isolate the browsing context")
        }
    })
}

pub(crate) fn check_coep(outcome: &FetchOutcome) -> Finding {
    finding_for(outcome, HEADER_CROSS_ORIGIN_EMBEDDER_POLICY, Severity::Warn, |value| {
        let v = value.trim().to_ascii_lowercase();
        if v == "require-corp" || v == "credentialless" {
            Finding::present(v, Severity::Pass)
        } else {
            Finding::present(display_value(value), Severity::Warn)
                .with_issue("cross-origin resources are not restricted")
        }
    })
}

pub(crate) fn check_x_xss_protection(outcome: &FetchOutcome) -> Finding {
    finding_for(outcome, HEADER_X_XSS_PROTECTION, Severity::Pass, |value| {
        if value.trim() == "0" {
            Finding::present("0", Severity::Pass)
        } else {
            Finding::present(display_value(value), Severity::Warn)
                .with_issue("legacy XSS auditor enabled; it can introduce leaks")
        }
    })
}

fn disclosure(outcome: &FetchOutcome, name: &str) -> Finding {
    finding_for(outcome, name, Severity::Pass, |value| {
        let finding = Finding::present(display_value(value), Severity::Warn);
        if value.chars().any(|c| c.is_ascii_digit()) {
            finding.with_issue("discloses software version")
        } else {
            finding.with_issue("discloses software in use")
        }
    })
}

pub(crate) fn check_server(outcome: &FetchOutcome) -> Finding {
    disclosure(outcome, HEADER_SERVER)
}

pub(crate) fn check_x_powered_by(outcome: &FetchOutcome) -> Finding {
    disclosure(outcome, HEADER_X_POWERED_BY)
}

/// All header checks, in check order.
pub(crate) fn header_findings(outcome: &FetchOutcome) -> Vec<(CheckName, Finding)> {
    vec![
        (CheckName::Https, check_https(outcome)),
        (CheckName::Hsts, check_hsts(outcome)),
        (CheckName::ContentSecurityPolicy, check_csp(outcome)),
        (CheckName::XFrameOptions, check_x_frame_options(outcome)),
        (CheckName::XContentTypeOptions, check_x_content_type_options(outcome)),
        (CheckName::ReferrerPolicy, check_referrer_policy(outcome)),
        (CheckName::PermissionsPolicy, check_permissions_policy(outcome)),
        (CheckName::CrossOriginOpenerPolicy, check_coop(outcome)),
        (CheckName::CrossOriginEmbedderPolicy, check_coep(outcome)),
        (CheckName::XXssProtection, check_x_xss_protection(outcome)),
        (CheckName::ServerHeader, check_server(outcome)),
        (CheckName::XPoweredBy, check_x_powered_by(outcome)),
    ]
}
