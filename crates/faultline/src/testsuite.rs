//! Test cases and the failing/passing partition of a buggy version.

use crate::key::{file_name_of, FunctionExtents, LineKey};
use crate::result::{ensure_consistent, FaultlineError, FaultlineResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

/// A test case, identified by the stem of its script name (`TC17.sh` → `TC17`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestCase(String);

impl TestCase {
    /// Create a test case from a name or script file name
    #[must_use]
    pub fn new(name: &str) -> Self {
        let name = name.trim();
        let stem = name.split('.').next().unwrap_or(name);
        Self(stem.to_string())
    }

    /// Stable test case name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Numeric id after the two-character prefix (`TC17` → 17)
    #[must_use]
    pub fn number(&self) -> Option<u64> {
        self.0.get(2..).and_then(|n| n.parse().ok())
    }

    /// File name of this test case's raw coverage report
    #[must_use]
    pub fn raw_coverage_file(&self) -> String {
        format!("{}.raw.json", self.0)
    }
}

impl fmt::Display for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Ord for TestCase {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.number(), other.number()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for TestCase {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Parse a newline-delimited test case list, sorted by test case order
#[must_use]
pub fn parse_test_list(content: &str) -> Vec<TestCase> {
    let mut tcs: Vec<TestCase> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(TestCase::new)
        .collect();
    tcs.sort();
    tcs
}

/// Read a test case list; a missing optional list reads as empty
pub fn read_test_list(path: &Path, required: bool) -> FaultlineResult<Vec<TestCase>> {
    if !path.exists() {
        if required {
            return Err(FaultlineError::missing(path));
        }
        return Ok(Vec::new());
    }
    Ok(parse_test_list(&std::fs::read_to_string(path)?))
}

/// Which side of the partition a test case belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// Fails on the unmodified buggy version
    Failing,
    /// Passes on the unmodified buggy version
    Passing,
}

/// Disjoint failing/passing partition of a version's test suite
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestPartition {
    failing: Vec<TestCase>,
    passing: Vec<TestCase>,
}

impl TestPartition {
    /// Build a partition, checking disjointness and a non-empty failing set
    pub fn new(mut failing: Vec<TestCase>, mut passing: Vec<TestCase>) -> FaultlineResult<Self> {
        failing.sort();
        passing.sort();

        ensure_consistent!(!failing.is_empty(), "buggy version has no failing test cases");

        let failing_set: BTreeSet<&TestCase> = failing.iter().collect();
        ensure_consistent!(
            failing_set.len() == failing.len(),
            "duplicate test case in failing list"
        );
        let passing_set: BTreeSet<&TestCase> = passing.iter().collect();
        ensure_consistent!(
            passing_set.len() == passing.len(),
            "duplicate test case in passing list"
        );
        if let Some(tc) = failing_set.intersection(&passing_set).next() {
            return Err(FaultlineError::consistency(format!(
                "test case {tc} is both failing and passing"
            )));
        }

        Ok(Self { failing, passing })
    }

    /// Failing test cases, in test case order
    #[must_use]
    pub fn failing(&self) -> &[TestCase] {
        &self.failing
    }

    /// Passing test cases, in test case order
    #[must_use]
    pub fn passing(&self) -> &[TestCase] {
        &self.passing
    }

    /// All test cases in test case order
    #[must_use]
    pub fn all(&self) -> Vec<TestCase> {
        let mut all: Vec<TestCase> = self.failing.iter().chain(&self.passing).cloned().collect();
        all.sort();
        all
    }

    /// Verdict of `tc`, if it is part of the partition
    #[must_use]
    pub fn verdict(&self, tc: &TestCase) -> Option<Verdict> {
        if self.failing.binary_search(tc).is_ok() {
            Some(Verdict::Failing)
        } else if self.passing.binary_search(tc).is_ok() {
            Some(Verdict::Passing)
        } else {
            None
        }
    }

    /// Total number of utilized test cases
    #[must_use]
    pub fn len(&self) -> usize {
        self.failing.len() + self.passing.len()
    }

    /// Whether the partition is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Ground-truth description of a buggy version (`bug_info.csv`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BugInfo {
    /// Path of the target source file
    pub target_code_file: String,
    /// Name of the buggy code file (the version name)
    pub buggy_code_filename: String,
    /// Buggy line number
    pub buggy_line_number: u32,
}

impl BugInfo {
    /// Parse `bug_info.csv`: one header line and exactly one data row
    pub fn parse(path: &Path, content: &str) -> FaultlineResult<Self> {
        let rows: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
        if rows.len() != 2 {
            return Err(FaultlineError::parse(
                path,
                0,
                format!("expected header and one row, found {} lines", rows.len()),
            ));
        }

        let fields: Vec<&str> = rows[1].trim().split(',').map(str::trim).collect();
        let [target, buggy, line] = fields.as_slice() else {
            return Err(FaultlineError::parse(path, 2, "expected 3 fields"));
        };
        let buggy_line_number = line
            .parse()
            .map_err(|_| FaultlineError::parse(path, 2, format!("bad line number '{line}'")))?;

        Ok(Self {
            target_code_file: (*target).to_string(),
            buggy_code_filename: (*buggy).to_string(),
            buggy_line_number,
        })
    }

    /// Load `bug_info.csv`
    pub fn load(path: &Path) -> FaultlineResult<Self> {
        if !path.exists() {
            return Err(FaultlineError::missing(path));
        }
        Self::parse(path, &std::fs::read_to_string(path)?)
    }

    /// File name of the buggy source file
    #[must_use]
    pub fn target_file_name(&self) -> &str {
        file_name_of(&self.target_code_file)
    }

    /// Resolve the ground-truth key; the buggy function must be known
    pub fn buggy_line_key(&self, extents: &FunctionExtents) -> FaultlineResult<LineKey> {
        let key = extents.key_for(&self.target_code_file, self.buggy_line_number);
        ensure_consistent!(
            !key.function_not_found(),
            "function not found for buggy line {} of {}",
            self.buggy_line_number,
            self.target_code_file
        );
        Ok(key)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::key::FunctionExtent;

    fn tcs(names: &[&str]) -> Vec<TestCase> {
        names.iter().map(|n| TestCase::new(n)).collect()
    }

    #[test]
    fn test_test_case_strips_extension() {
        assert_eq!(TestCase::new("TC17.sh").name(), "TC17");
        assert_eq!(TestCase::new(" TC3 ").name(), "TC3");
        assert_eq!(TestCase::new("TC3").raw_coverage_file(), "TC3.raw.json");
    }

    #[test]
    fn test_test_case_numeric_order() {
        let mut list = tcs(&["TC10", "TC2", "TC1", "smoke"]);
        list.sort();
        let names: Vec<_> = list.iter().map(TestCase::name).collect();
        assert_eq!(names, vec!["TC1", "TC2", "TC10", "smoke"]);
    }

    #[test]
    fn test_parse_test_list_skips_blank_lines() {
        let list = parse_test_list("TC5.sh\n\nTC1.sh\n  \n");
        assert_eq!(list, tcs(&["TC1", "TC5"]));
    }

    #[test]
    fn test_partition_rejects_overlap() {
        let err = TestPartition::new(tcs(&["TC1", "TC2"]), tcs(&["TC2", "TC3"])).unwrap_err();
        assert!(err.is_consistency());
        assert!(err.to_string().contains("TC2"));
    }

    #[test]
    fn test_partition_rejects_empty_failing() {
        let err = TestPartition::new(Vec::new(), tcs(&["TC1"])).unwrap_err();
        assert!(err.to_string().contains("no failing"));
    }

    #[test]
    fn test_partition_rejects_duplicates() {
        assert!(TestPartition::new(tcs(&["TC1", "TC1.sh"]), Vec::new()).is_err());
    }

    #[test]
    fn test_partition_verdict() {
        let p = TestPartition::new(tcs(&["TC4"]), tcs(&["TC1", "TC9"])).unwrap();
        assert_eq!(p.verdict(&TestCase::new("TC4")), Some(Verdict::Failing));
        assert_eq!(p.verdict(&TestCase::new("TC9")), Some(Verdict::Passing));
        assert_eq!(p.verdict(&TestCase::new("TC5")), None);
        assert_eq!(p.all(), tcs(&["TC1", "TC4", "TC9"]));
        assert_eq!(p.len(), 3);
    }

    #[test]
    fn test_bug_info_parse() {
        let info = BugInfo::parse(
            Path::new("bug_info.csv"),
            "target_code_file,buggy_code_file,buggy_lineno\nlibxml2/parser.c,parser.MUT12.c,3034\n",
        )
        .unwrap();
        assert_eq!(info.target_file_name(), "parser.c");
        assert_eq!(info.buggy_code_filename, "parser.MUT12.c");
        assert_eq!(info.buggy_line_number, 3034);
    }

    #[test]
    fn test_bug_info_rejects_extra_rows() {
        let err = BugInfo::parse(Path::new("bug_info.csv"), "h\na,b,1\nc,d,2\n").unwrap_err();
        assert!(err.to_string().contains("one row"));
    }

    #[test]
    fn test_buggy_line_key_requires_function() {
        let mut extents = FunctionExtents::new();
        extents.insert(
            "src/parser.c",
            vec![FunctionExtent { name: "f".into(), start: 1, end: 10 }],
        );
        let mut info = BugInfo {
            target_code_file: "parser.c".into(),
            buggy_code_filename: "parser.MUT1.c".into(),
            buggy_line_number: 5,
        };
        assert_eq!(info.buggy_line_key(&extents).unwrap().to_string(), "parser.c#f#5");

        info.buggy_line_number = 11;
        let err = info.buggy_line_key(&extents).unwrap_err();
        assert!(err.to_string().contains("function not found"));
    }

    #[test]
    fn test_read_optional_list_missing() {
        let list = read_test_list(Path::new("/nonexistent/ccts.txt"), false).unwrap();
        assert!(list.is_empty());
        assert!(read_test_list(Path::new("/nonexistent/failing_tcs.txt"), true).is_err());
    }
}
