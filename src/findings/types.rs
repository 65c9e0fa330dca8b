//! Finding types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{EnumIter, IntoStaticStr};

/// Every check a scan reports. The set is closed; a [`FindingSet`] built by
/// the extractor has exactly one entry per variant.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CheckName {
    Https,
    Hsts,
    ContentSecurityPolicy,
    XFrameOptions,
    XContentTypeOptions,
    ReferrerPolicy,
    PermissionsPolicy,
    CrossOriginOpenerPolicy,
    CrossOriginEmbedderPolicy,
    XXssProtection,
    ServerHeader,
    XPoweredBy,
    CookieSecure,
    CookieHttpOnly,
    CookieSameSite,
    Spf,
    Dmarc,
}

impl CheckName {
    /// Human-readable name used in narratives.
    pub fn label(self) -> &'static str {
        match self {
            CheckName::Https => "HTTPS",
            CheckName::Hsts => "Strict-Transport-Security",
            CheckName::ContentSecurityPolicy => "Content-Security-Policy",
            CheckName::XFrameOptions => "X-Frame-Options",
            CheckName::XContentTypeOptions => "X-Content-Type-Options",
            CheckName::ReferrerPolicy => "Referrer-Policy",
            CheckName::PermissionsPolicy => "Permissions-Policy",
            CheckName::CrossOriginOpenerPolicy => "Cross-Origin-Opener-Policy",
            CheckName::CrossOriginEmbedderPolicy => "Cross-Origin-Embedder-Policy",
            CheckName::XXssProtection => "X-XSS-Protection",
            CheckName::ServerHeader => "Server header",
            CheckName::XPoweredBy => "X-Powered-By header",
            CheckName::CookieSecure => "Secure cookies",
            CheckName::CookieHttpOnly => "HttpOnly cookies",
            CheckName::CookieSameSite => "SameSite cookies",
            CheckName::Spf => "SPF",
            CheckName::Dmarc => "DMARC",
        }
    }

    /// Checks where presence is the problem.
    pub fn is_disclosure(self) -> bool {
        matches!(self, CheckName::ServerHeader | CheckName::XPoweredBy)
    }

    pub fn is_cookie_check(self) -> bool {
        matches!(
            self,
            CheckName::CookieSecure | CheckName::CookieHttpOnly | CheckName::CookieSameSite
        )
    }

    /// One-line fix shown for checks that did not pass.
    pub fn remediation(self) -> &'static str {
        match self {
            CheckName::Https => "serve the site over HTTPS",
            CheckName::Hsts => "send Strict-Transport-Security with max-age of at least one year and includeSubDomains",
            CheckName::ContentSecurityPolicy => "define a Content-Security-Policy without unsafe-inline, unsafe-eval or wildcard sources",
            CheckName::XFrameOptions => "send X-Frame-Options: DENY or SAMEORIGIN",
            CheckName::XContentTypeOptions => "send X-Content-Type-Options: nosniff",
            CheckName::ReferrerPolicy => "send a strict Referrer-Policy such as strict-origin-when-cross-origin",
            CheckName::PermissionsPolicy => "restrict browser features with Permissions-Policy",
            CheckName::CrossOriginOpenerPolicy => "send Cross-Origin-Opener-Policy: same-origin",
            CheckName::CrossOriginEmbedderPolicy => "send Cross-Origin-Embedder-Policy: require-corp",
            CheckName::XXssProtection => "set X-XSS-Protection to 0 or remove it",
            CheckName::ServerHeader => "remove or genericize the Server header",
            CheckName::XPoweredBy => "remove the X-Powered-By header",
            CheckName::CookieSecure => "mark every cookie Secure",
            CheckName::CookieHttpOnly => "mark session cookies HttpOnly",
            CheckName::CookieSameSite => "give every cookie a SameSite attribute",
            CheckName::Spf => "publish a single SPF record ending in -all or ~all",
            CheckName::Dmarc => "publish a DMARC record with p=quarantine or p=reject",
        }
    }
}

/// Outcome of a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Pass,
    Warn,
    Fail,
}

/// Result of one check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Whether the thing the check looks for exists (for disclosure checks:
    /// whether the disclosing header was sent).
    pub present: bool,
    /// Observed value, trimmed for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub severity: Severity,
    /// Problems found in the value.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
    /// Values of repeated headers after the first, which is the one evaluated.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub duplicates: Vec<String>,
}

impl Finding {
    pub fn absent(severity: Severity) -> Self {
        Self {
            present: false,
            value: None,
            severity,
            issues: Vec::new(),
            duplicates: Vec::new(),
        }
    }

    pub fn present(value: impl Into<String>, severity: Severity) -> Self {
        Self {
            present: true,
            value: Some(value.into()),
            severity,
            issues: Vec::new(),
            duplicates: Vec::new(),
        }
    }

    pub fn with_issue(mut self, issue: impl Into<String>) -> Self {
        self.issues.push(issue.into());
        self
    }

    pub fn with_duplicates(mut self, duplicates: Vec<String>) -> Self {
        self.duplicates = duplicates;
        self
    }
}

/// Findings of one scan, keyed by check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FindingSet(BTreeMap<CheckName, Finding>);

impl FindingSet {
    /// Builds a set from per-check findings. Any check not supplied is
    /// recorded as absent with `Fail`, so the set is always complete.
    pub fn from_findings(findings: impl IntoIterator<Item = (CheckName, Finding)>) -> Self {
        let mut map: BTreeMap<CheckName, Finding> = findings.into_iter().collect();
        for check in CheckName::iter() {
            map.entry(check)
                .or_insert_with(|| Finding::absent(Severity::Fail));
        }
        Self(map)
    }

    pub fn get(&self, check: CheckName) -> Option<&Finding> {
        self.0.get(&check)
    }

    pub fn iter(&self) -> impl Iterator<Item = (CheckName, &Finding)> {
        self.0.iter().map(|(check, finding)| (*check, finding))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Checks with the given severity, in check order.
    pub fn with_severity(&self, severity: Severity) -> Vec<CheckName> {
        self.iter()
            .filter(|(_, f)| f.severity == severity)
            .map(|(check, _)| check)
            .collect()
    }
}
