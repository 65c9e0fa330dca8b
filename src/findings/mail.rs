//! SPF and DMARC checks.
//!
//! Records are gathered once per scan into [`DnsRecords`]; evaluation is pure.
//! A failed lookup is indistinguishable from an empty answer here and yields
//! an absent finding.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::dns::{
    dmarc_name, dmarc_policy, email_domain, extract_dmarc_records, extract_spf_records,
    HostLookup,
};

use super::types::{CheckName, Finding, Severity};

/// TXT answers used by the mail checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DnsRecords {
    /// TXT records at the mail domain.
    pub domain_txt: Vec<String>,
    /// TXT records at `_dmarc.<domain>`.
    pub dmarc_txt: Vec<String>,
}

impl DnsRecords {
    /// Looks up both record sets for `host` concurrently.
    ///
    /// Lookup failures are logged and recorded as empty answers.
    pub async fn gather(host: &str, lookup: &dyn HostLookup) -> Self {
        let domain = email_domain(host);
        let dmarc = dmarc_name(domain);
        let (domain_txt, dmarc_txt) =
            tokio::join!(lookup.lookup_txt(domain), lookup.lookup_txt(&dmarc));
        Self {
            domain_txt: domain_txt.unwrap_or_else(|e| {
                log::debug!("TXT lookup for {domain} failed: {e}");
                Vec::new()
            }),
            dmarc_txt: dmarc_txt.unwrap_or_else(|e| {
                log::debug!("TXT lookup for {dmarc} failed: {e}");
                Vec::new()
            }),
        }
    }
}

/// Mechanisms and modifiers of RFC 7208, loosely.
static SPF_TERM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:[+\-~?]?(?:all|include:\S+|a(?::[^/\s]+)?(?:/\d+)?(?://\d+)?|mx(?::[^/\s]+)?(?:/\d+)?(?://\d+)?|ptr(?::\S+)?|ip4:\S+|ip6:\S+|exists:\S+)|[a-z][a-z0-9_.\-]*=\S*)$",
    )
    .expect("SPF term regex is valid")
});

pub(crate) fn check_spf(records: &DnsRecords) -> Finding {
    let spf = extract_spf_records(&records.domain_txt);
    let Some(record) = spf.first() else {
        return Finding::absent(Severity::Fail).with_issue("no SPF record published");
    };
    if spf.len() > 1 {
        return Finding::present(record.clone(), Severity::Fail)
            .with_issue(format!("{} SPF records published; receivers treat this as an error", spf.len()));
    }

    let terms: Vec<&str> = record.split_whitespace().skip(1).collect();
    let mut issues: Vec<String> = terms
        .iter()
        .filter(|term| !SPF_TERM.is_match(term))
        .map(|term| format!("unrecognized term '{term}'"))
        .collect();

    let all = terms
        .iter()
        .rev()
        .find(|t| t.trim_start_matches(['+', '-', '~', '?']).eq_ignore_ascii_case("all"));
    let has_redirect = terms
        .iter()
        .any(|t| t.to_ascii_lowercase().starts_with("redirect="));

    let strict_all = match all {
        Some(term) if term.starts_with('-') || term.starts_with('~') => true,
        Some(term) => {
            issues.push(format!("'{term}' lets any server send mail"));
            false
        }
        None if has_redirect => true,
        None => {
            issues.push("no terminating all mechanism".to_string());
            false
        }
    };

    let severity = if strict_all && issues.is_empty() {
        Severity::Pass
    } else {
        Severity::Warn
    };
    let mut finding = Finding::present(record.clone(), severity);
    finding.issues = issues;
    finding
}

pub(crate) fn check_dmarc(records: &DnsRecords) -> Finding {
    let dmarc = extract_dmarc_records(&records.dmarc_txt);
    let Some(record) = dmarc.first() else {
        return Finding::absent(Severity::Fail).with_issue("no DMARC record published");
    };
    if dmarc.len() > 1 {
        return Finding::present(record.clone(), Severity::Fail)
            .with_issue("multiple DMARC records published");
    }
    match dmarc_policy(record).as_deref() {
        Some("reject") | Some("quarantine") => Finding::present(record.clone(), Severity::Pass),
        Some("none") => Finding::present(record.clone(), Severity::Warn)
            .with_issue("policy p=none only monitors"),
        Some(other) => Finding::present(record.clone(), Severity::Fail)
            .with_issue(format!("unrecognized policy '{other}'")),
        None => Finding::present(record.clone(), Severity::Fail).with_issue("missing p= policy"),
    }
}

pub(crate) fn mail_findings(records: &DnsRecords) -> Vec<(CheckName, Finding)> {
    vec![
        (CheckName::Spf, check_spf(records)),
        (CheckName::Dmarc, check_dmarc(records)),
    ]
}
