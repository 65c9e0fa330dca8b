//! Security findings.
//!
//! [`extract_findings`] turns one fetch outcome plus the mail-domain DNS
//! records into a complete [`FindingSet`]. It is pure: the same inputs always
//! give the same findings.
//!
//! Checks cover:
//! - Transport: HTTPS and HSTS
//! - Content and framing headers (CSP, X-Frame-Options, ...)
//! - Information disclosure (Server, X-Powered-By)
//! - Cookie attributes
//! - Mail authentication (SPF, DMARC)

mod cookies;
mod headers;
mod mail;
mod types;

use crate::fetch::FetchOutcome;

pub use mail::DnsRecords;
pub use types::{CheckName, Finding, FindingSet, Severity};

/// Runs every check.
pub fn extract_findings(outcome: &FetchOutcome, records: &DnsRecords) -> FindingSet {
    let mut findings = headers::header_findings(outcome);
    findings.extend(cookies::cookie_findings(outcome));
    findings.extend(mail::mail_findings(records));
    FindingSet::from_findings(findings)
}
