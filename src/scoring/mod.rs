//! Posture scoring.
//!
//! A score starts at [`BASELINE_SCORE`], adds a fixed delta per check and is
//! clamped to 0..=100. Deltas depend only on each finding's presence and
//! severity, so equal finding sets always score the same.

mod narrative;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::findings::{CheckName, Finding, FindingSet, Severity};

pub use narrative::narrative;

/// Score before any check is applied.
pub const BASELINE_SCORE: i32 = 50;

/// Grade bands over the 0..=100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    Critical,
    Moderate,
    Good,
    Excellent,
}

impl Grade {
    pub fn from_score(score: u8) -> Self {
        match score {
            80..=u8::MAX => Grade::Excellent,
            60..=79 => Grade::Good,
            40..=59 => Grade::Moderate,
            _ => Grade::Critical,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Grade::Excellent => "excellent",
            Grade::Good => "good",
            Grade::Moderate => "moderate",
            Grade::Critical => "critical",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Contribution of one finding to the score.
pub fn check_delta(check: CheckName, finding: &Finding) -> i32 {
    use Severity::{Fail, Pass, Warn};
    let severity = finding.severity;
    match check {
        CheckName::Https => {
            if severity == Pass {
                15
            } else {
                -15
            }
        }
        CheckName::Hsts => match severity {
            Pass => 10,
            Warn => 5,
            Fail => -10,
        },
        CheckName::ContentSecurityPolicy => match severity {
            Pass => 10,
            Warn => 5,
            Fail => -5,
        },
        CheckName::XFrameOptions | CheckName::XContentTypeOptions => match severity {
            Pass => 5,
            Warn => 0,
            Fail => -3,
        },
        CheckName::ReferrerPolicy | CheckName::PermissionsPolicy => {
            if severity == Pass {
                3
            } else {
                0
            }
        }
        CheckName::CrossOriginOpenerPolicy | CheckName::CrossOriginEmbedderPolicy => {
            if severity == Pass {
                2
            } else {
                0
            }
        }
        CheckName::XXssProtection => {
            if severity == Pass {
                0
            } else {
                -2
            }
        }
        CheckName::ServerHeader | CheckName::XPoweredBy => {
            if finding.present {
                -3
            } else {
                0
            }
        }
        CheckName::CookieSecure | CheckName::CookieHttpOnly | CheckName::CookieSameSite => {
            if severity == Pass {
                0
            } else {
                -2
            }
        }
        CheckName::Spf | CheckName::Dmarc => match severity {
            Pass => 5,
            Warn => 2,
            Fail => -3,
        },
    }
}

/// Scores a finding set.
pub fn score(findings: &FindingSet) -> u8 {
    let total = findings
        .iter()
        .fold(BASELINE_SCORE, |acc, (check, finding)| {
            acc + check_delta(check, finding)
        });
    total.clamp(0, 100) as u8
}

/// Scores a finding set and assigns its grade.
pub fn score_and_grade(findings: &FindingSet) -> (u8, Grade) {
    let score = score(findings);
    (score, Grade::from_score(score))
}
