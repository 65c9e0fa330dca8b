//! Cookie attribute checks.
//!
//! Each attribute check is present only when every cookie carries the
//! attribute. A response without cookies passes all three as not applicable.

use crate::config::HEADER_SET_COOKIE;
use crate::fetch::FetchOutcome;

use super::types::{CheckName, Finding, Severity};

/// Attributes of one `Set-Cookie` header. Cookie values are never kept.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct CookieFlags {
    pub(crate) name: String,
    pub(crate) secure: bool,
    pub(crate) http_only: bool,
    pub(crate) same_site: Option<String>,
}

pub(crate) fn parse_set_cookie(header: &str) -> CookieFlags {
    let mut parts = header.split(';');
    let name = parts
        .next()
        .and_then(|pair| pair.split_once('=').map(|(n, _)| n).or(Some(pair)))
        .unwrap_or_default()
        .trim()
        .to_string();

    let mut flags = CookieFlags {
        name,
        ..CookieFlags::default()
    };
    for attribute in parts.map(str::trim) {
        let (key, value) = match attribute.split_once('=') {
            Some((k, v)) => (k.trim(), Some(v.trim())),
            None => (attribute, None),
        };
        if key.eq_ignore_ascii_case("secure") {
            flags.secure = true;
        } else if key.eq_ignore_ascii_case("httponly") {
            flags.http_only = true;
        } else if key.eq_ignore_ascii_case("samesite") {
            let value = value.unwrap_or_default().to_ascii_lowercase();
            if matches!(value.as_str(), "lax" | "strict" | "none") {
                flags.same_site = Some(value);
            }
        }
    }
    flags
}

fn attribute_finding(
    cookies: &[CookieFlags],
    attribute: &str,
    has: impl Fn(&CookieFlags) -> bool,
) -> Finding {
    if cookies.is_empty() {
        return Finding::absent(Severity::Pass);
    }
    let missing: Vec<&str> = cookies
        .iter()
        .filter(|c| !has(c))
        .map(|c| c.name.as_str())
        .collect();
    let summary = format!("{}/{} cookies", cookies.len() - missing.len(), cookies.len());
    if missing.is_empty() {
        Finding::present(summary, Severity::Pass)
    } else {
        let mut finding = Finding::present(summary, Severity::Warn);
        finding.present = false;
        finding.with_issue(format!("missing {attribute}: {}", missing.join(", ")))
    }
}

pub(crate) fn cookie_findings(outcome: &FetchOutcome) -> Vec<(CheckName, Finding)> {
    let cookies: Vec<CookieFlags> = outcome
        .header_values(HEADER_SET_COOKIE)
        .into_iter()
        .map(parse_set_cookie)
        .collect();

    let mut same_site = attribute_finding(&cookies, "SameSite", |c| c.same_site.is_some());
    let insecure_none: Vec<&str> = cookies
        .iter()
        .filter(|c| c.same_site.as_deref() == Some("none") && !c.secure)
        .map(|c| c.name.as_str())
        .collect();
    if !insecure_none.is_empty() {
        same_site.severity = Severity::Warn;
        same_site = same_site.with_issue(format!(
            "SameSite=None without Secure is rejected by browsers: {}",
            insecure_none.join(", ")
        ));
    }

    vec![
        (
            CheckName::CookieSecure,
            attribute_finding(&cookies, "Secure", |c| c.secure),
        ),
        (
            CheckName::CookieHttpOnly,
            attribute_finding(&cookies, "HttpOnly", |c| c.http_only),
        ),
        (CheckName::CookieSameSite, same_site),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(cookies: &[&str]) -> FetchOutcome {
        FetchOutcome {
            status_code: 200,
            headers: cookies
                .iter()
                .map(|c| ("set-cookie".to_string(), c.to_string()))
                .collect(),
            body_prefix: Vec::new(),
            final_url: "https://example.com/".to_string(),
            bytes_read: 0,
            truncated: false,
            redirect_chain: Vec::new(),
            elapsed_ms: 0,
        }
    }

    fn finding(findings: &[(CheckName, Finding)], check: CheckName) -> &Finding {
        &findings.iter().find(|(c, _)| *c == check).unwrap().1
    }

    #[test]
    fn test_parse_set_cookie() {
        let flags = parse_set_cookie("sid=abc123; Path=/; Secure; HttpOnly; SameSite=Lax");
        assert_eq!(flags.name, "sid");
        assert!(flags.secure);
        assert!(flags.http_only);
        assert_eq!(flags.same_site.as_deref(), Some("lax"));

        let bare = parse_set_cookie("theme=dark");
        assert_eq!(bare.name, "theme");
        assert!(!bare.secure);
        assert_eq!(bare.same_site, None);
    }

    #[test]
    fn test_no_cookies_is_not_applicable() {
        let findings = cookie_findings(&outcome(&[]));
        for (_, f) in &findings {
            assert!(!f.present);
            assert_eq!(f.severity, Severity::Pass);
        }
    }

    #[test]
    fn test_attribute_must_be_on_every_cookie() {
        let findings = cookie_findings(&outcome(&[
            "sid=1; Secure; HttpOnly; SameSite=Strict",
            "pref=2; Secure",
        ]));
        let secure = finding(&findings, CheckName::CookieSecure);
        assert!(secure.present);
        assert_eq!(secure.severity, Severity::Pass);

        let http_only = finding(&findings, CheckName::CookieHttpOnly);
        assert!(!http_only.present);
        assert_eq!(http_only.severity, Severity::Warn);
        assert_eq!(http_only.value.as_deref(), Some("1/2 cookies"));
        assert!(http_only.issues[0].contains("pref"));
        // Cookie values never appear in findings
        assert!(!http_only.issues[0].contains('2'));
    }

    #[test]
    fn test_same_site_none_requires_secure() {
        let findings = cookie_findings(&outcome(&["a=1; SameSite=None"]));
        let same_site = finding(&findings, CheckName::CookieSameSite);
        assert!(same_site.present);
        assert_eq!(same_site.severity, Severity::Warn);
        assert_eq!(same_site.issues.len(), 1);
    }
}
