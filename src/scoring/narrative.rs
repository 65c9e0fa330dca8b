//! Plain-text summary of a scan.
//!
//! The narrative is a fixed template filled from the findings: grade and
//! score, what passed, what needs attention, what failed, and a short list of
//! fixes. No external service is involved.

use crate::findings::{CheckName, FindingSet, Severity};

use super::Grade;

/// Checks that carry no signal worth listing as passed when absent.
fn listed_as_passed(check: CheckName, set: &FindingSet) -> bool {
    let Some(finding) = set.get(check) else {
        return false;
    };
    if check.is_disclosure() || check == CheckName::XXssProtection {
        return false;
    }
    // Cookie checks pass trivially when no cookies were set
    !(check.is_cookie_check() && !finding.present)
}

fn labels(checks: &[CheckName]) -> String {
    checks
        .iter()
        .map(|c| c.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Builds the narrative for a scored finding set.
pub fn narrative(findings: &FindingSet, score: u8, grade: Grade) -> String {
    let passed: Vec<CheckName> = findings
        .with_severity(Severity::Pass)
        .into_iter()
        .filter(|c| listed_as_passed(*c, findings))
        .collect();
    let warned = findings.with_severity(Severity::Warn);
    let failed = findings.with_severity(Severity::Fail);

    let mut sentences = vec![format!(
        "Security grade: {} ({score}/100).",
        grade_title(grade)
    )];
    if !passed.is_empty() {
        sentences.push(format!("Passed ({}): {}.", passed.len(), labels(&passed)));
    }
    if !warned.is_empty() {
        sentences.push(format!(
            "Needs attention ({}): {}.",
            warned.len(),
            labels(&warned)
        ));
    }
    if !failed.is_empty() {
        sentences.push(format!("Failed ({}): {}.", failed.len(), labels(&failed)));
    }

    let disclosed: Vec<CheckName> = [CheckName::ServerHeader, CheckName::XPoweredBy]
        .into_iter()
        .filter(|c| findings.get(*c).is_some_and(|f| f.present))
        .collect();
    if !disclosed.is_empty() {
        sentences.push(format!(
            "Response headers disclose server software ({}).",
            labels(&disclosed)
        ));
    }

    let fixes: Vec<&str> = failed
        .iter()
        .chain(warned.iter())
        .filter(|c| !c.is_disclosure())
        .map(|c| c.remediation())
        .collect();
    if !fixes.is_empty() {
        sentences.push(format!("Recommended: {}.", fixes.join("; ")));
    }

    sentences.join(" ")
}

fn grade_title(grade: Grade) -> &'static str {
    match grade {
        Grade::Excellent => "Excellent",
        Grade::Good => "Good",
        Grade::Moderate => "Moderate",
        Grade::Critical => "Critical",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::findings::Finding;

    #[test]
    fn test_narrative_lists_outcomes() {
        let set = FindingSet::from_findings([
            (CheckName::Https, Finding::present("https", Severity::Pass)),
            (CheckName::XFrameOptions, Finding::present("ALLOW-FROM x", Severity::Warn)),
            (CheckName::ServerHeader, Finding::present("nginx", Severity::Warn)),
            (CheckName::XPoweredBy, Finding::absent(Severity::Pass)),
            (CheckName::XXssProtection, Finding::absent(Severity::Pass)),
            (CheckName::CookieSecure, Finding::absent(Severity::Pass)),
            (CheckName::CookieHttpOnly, Finding::absent(Severity::Pass)),
            (CheckName::CookieSameSite, Finding::absent(Severity::Pass)),
        ]);
        let text = narrative(&set, 42, Grade::Moderate);
        assert!(text.starts_with("Security grade: Moderate (42/100)."));
        assert!(text.contains("Passed (1): HTTPS."));
        assert!(text.contains("Needs attention (2): X-Frame-Options, Server header."));
        assert!(text.contains("disclose server software (Server header)"));
        assert!(text.contains("send X-Frame-Options: DENY or SAMEORIGIN"));
        assert!(!text.contains("remove or genericize"));
    }

    #[test]
    fn test_narrative_is_stable() {
        let set = FindingSet::from_findings([]);
        assert_eq!(
            narrative(&set, 0, Grade::Critical),
            narrative(&set, 0, Grade::Critical)
        );
    }
}
