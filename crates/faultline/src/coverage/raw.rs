//! Raw per-test-case line coverage reports.

use crate::result::{FaultlineError, FaultlineResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Execution count of one line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLine {
    /// 1-based line number
    pub line_number: u32,
    /// Number of executions
    pub count: u64,
}

/// Line counters of one source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFile {
    /// Reported source file
    pub file: String,
    /// Per-line counters, in the tool's enumeration order
    pub lines: Vec<RawLine>,
}

/// Raw coverage report of one test case run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCoverageReport {
    /// Covered files, in the tool's enumeration order
    pub files: Vec<RawFile>,
}

impl RawCoverageReport {
    /// Parse a report from JSON text
    pub fn from_json(path: &Path, content: &str) -> FaultlineResult<Self> {
        serde_json::from_str(content)
            .map_err(|e| FaultlineError::parse(path, e.line(), e.to_string()))
    }

    /// Load a report from disk
    pub fn load(path: &Path) -> FaultlineResult<Self> {
        if !path.exists() {
            return Err(FaultlineError::missing(path));
        }
        Self::from_json(path, &std::fs::read_to_string(path)?)
    }

    /// `(file, line, covered)` for every row, in enumeration order
    pub fn rows(&self) -> impl Iterator<Item = (&str, u32, bool)> {
        self.files.iter().flat_map(|f| {
            f.lines
                .iter()
                .map(move |l| (f.file.as_str(), l.line_number, l.count > 0))
        })
    }

    /// Number of rows across all files
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.files.iter().map(|f| f.lines.len()).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_report() {
        let json = r#"{"files": [
            {"file": "src/a.c", "lines": [{"line_number": 3, "count": 0}, {"line_number": 4, "count": 12}]},
            {"file": "src/b.c", "lines": [{"line_number": 1, "count": 1}]}
        ]}"#;
        let report = RawCoverageReport::from_json(Path::new("TC1.raw.json"), json).unwrap();
        assert_eq!(report.row_count(), 3);
        let rows: Vec<_> = report.rows().collect();
        assert_eq!(rows[0], ("src/a.c", 3, false));
        assert_eq!(rows[1], ("src/a.c", 4, true));
        assert_eq!(rows[2], ("src/b.c", 1, true));
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = RawCoverageReport::from_json(Path::new("TC9.raw.json"), "{\"files\": 3}")
            .unwrap_err();
        assert!(err.to_string().contains("TC9.raw.json"));
    }

    #[test]
    fn test_load_missing() {
        assert!(RawCoverageReport::load(Path::new("/nonexistent/TC1.raw.json")).is_err());
    }
}
