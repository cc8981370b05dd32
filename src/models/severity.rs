//! Suite-level outcome severity

use serde::{Deserialize, Serialize};
use std::fmt;

/// Overall suite outcome, ordered `Success < Warning < Fail`
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    #[default]
    Success,
    Warning,
    Fail,
}

impl Severity {
    /// Process exit code reported for this severity
    pub fn exit_code(&self) -> u8 {
        match self {
            Severity::Success => 0,
            Severity::Fail => 1,
            Severity::Warning => 2,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Severity::Success => "✓",
            Severity::Warning => "⚠",
            Severity::Fail => "✗",
        }
    }

    /// Fold another signal into this one. Never lowers the severity.
    pub fn escalate(self, other: Severity) -> Severity {
        self.max(other)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Success => write!(f, "SUCCESS"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Fail => write!(f, "FAIL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Success < Severity::Warning);
        assert!(Severity::Warning < Severity::Fail);
    }

    #[test]
    fn test_escalate_is_monotonic() {
        let folded = [Severity::Fail, Severity::Warning, Severity::Success]
            .into_iter()
            .fold(Severity::Success, Severity::escalate);
        assert_eq!(folded, Severity::Fail);

        assert_eq!(
            Severity::Warning.escalate(Severity::Success),
            Severity::Warning
        );
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Severity::Success.exit_code(), 0);
        assert_eq!(Severity::Fail.exit_code(), 1);
        assert_eq!(Severity::Warning.exit_code(), 2);
    }

    #[test]
    fn test_severity_serialization() {
        let json = serde_json::to_string(&Severity::Warning).unwrap();
        assert_eq!(json, "\"WARNING\"");
    }
}
