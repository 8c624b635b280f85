// Mon Oct 19 2026 - Alex

use serde::Serialize;
use std::fmt;

/// Outcome of a run. The binary turns `code()` into its exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "count", rename_all = "snake_case")]
pub enum AnalysisStatus {
    Clean,
    ErrorsFound(usize),
    ParseFailed,
}

impl AnalysisStatus {
    pub fn code(&self) -> i32 {
        match self {
            AnalysisStatus::Clean => 0,
            AnalysisStatus::ErrorsFound(_) => -1,
            AnalysisStatus::ParseFailed => -2,
        }
    }

    pub fn is_clean(&self) -> bool {
        matches!(self, AnalysisStatus::Clean)
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisStatus::Clean => write!(f, "PASS! No errors found!"),
            AnalysisStatus::ErrorsFound(count) => write!(f, "FAIL! There were {} errors", count),
            AnalysisStatus::ParseFailed => write!(f, "FAIL! Couldn't parse Valgrind output file"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_are_distinct() {
        assert_eq!(AnalysisStatus::Clean.code(), 0);
        assert_eq!(AnalysisStatus::ErrorsFound(3).code(), -1);
        assert_eq!(AnalysisStatus::ParseFailed.code(), -2);
        assert!(AnalysisStatus::Clean.is_clean());
    }

    #[test]
    fn test_status_serializes_with_count() {
        let json = serde_json::to_string(&AnalysisStatus::ErrorsFound(2)).unwrap();
        assert_eq!(json, r#"{"status":"errors_found","count":2}"#);
    }
}
