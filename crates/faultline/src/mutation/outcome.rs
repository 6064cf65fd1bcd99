//! Per-mutant build/test outcomes (`mutation_testing_results.csv`).

use crate::key::SourceLine;
use crate::result::{FaultlineError, FaultlineResult};
use crate::table::{parse_cell, Table};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Build result of one mutant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BuildResult {
    /// The mutant compiled and the test suite ran against it
    Pass,
    /// The mutant did not compile
    Fail,
}

impl fmt::Display for BuildResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}

impl FromStr for BuildResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "PASS" => Ok(Self::Pass),
            "FAIL" => Ok(Self::Fail),
            other => Err(format!("unknown build result '{other}'")),
        }
    }
}

/// Test verdict flips observed on a built mutant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlipCounts {
    /// Originally-passing tests that now fail
    pub p2f: u64,
    /// Originally-passing tests that still pass
    pub p2p: u64,
    /// Originally-failing tests that now pass
    pub f2p: u64,
    /// Originally-failing tests that still fail
    pub f2f: u64,
}

impl FlipCounts {
    /// Counts in `p2f, p2p, f2p, f2f` order
    #[must_use]
    pub const fn new(p2f: u64, p2p: u64, f2p: u64, f2f: u64) -> Self {
        Self { p2f, p2p, f2p, f2f }
    }
}

/// Result of testing one mutant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationOutcome {
    /// Mutated source file as reported by the mutation tester
    pub target_file: String,
    /// Mutant identifier (`mutant_17`)
    pub mutant_id: String,
    /// Mutated line
    pub line: u32,
    /// Flip counts; `None` when the mutant failed to build
    pub counts: Option<FlipCounts>,
}

impl MutationOutcome {
    /// Outcome of a mutant that built
    #[must_use]
    pub fn built(target_file: &str, mutant_id: &str, line: u32, counts: FlipCounts) -> Self {
        Self {
            target_file: target_file.to_string(),
            mutant_id: mutant_id.to_string(),
            line,
            counts: Some(counts),
        }
    }

    /// Outcome of a mutant that failed to build
    #[must_use]
    pub fn build_failed(target_file: &str, mutant_id: &str, line: u32) -> Self {
        Self {
            target_file: target_file.to_string(),
            mutant_id: mutant_id.to_string(),
            line,
            counts: None,
        }
    }

    /// Build result of this mutant
    #[must_use]
    pub const fn build_result(&self) -> BuildResult {
        if self.counts.is_some() {
            BuildResult::Pass
        } else {
            BuildResult::Fail
        }
    }

    /// `(file name, line)` this mutant sits on
    #[must_use]
    pub fn source_line(&self) -> SourceLine {
        SourceLine::new(&self.target_file, self.line)
    }
}

/// The flat outcome log of one buggy version
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationResults {
    outcomes: Vec<MutationOutcome>,
}

impl MutationResults {
    /// Column names of `mutation_testing_results.csv`
    pub const COLUMNS: [&'static str; 8] = [
        "target_file",
        "mutant_id",
        "lineno",
        "build_result",
        "p2f",
        "p2p",
        "f2p",
        "f2f",
    ];

    /// Wrap outcomes in log order
    #[must_use]
    pub const fn new(outcomes: Vec<MutationOutcome>) -> Self {
        Self { outcomes }
    }

    /// Parse the results table
    ///
    /// Counts of `FAIL` rows are not read; the tester leaves them blank or
    /// negative.
    pub fn from_table(path: &Path, table: &Table) -> FaultlineResult<Self> {
        let mut cols = [0usize; 8];
        for (slot, name) in cols.iter_mut().zip(Self::COLUMNS) {
            *slot = table.require_column(path, name)?;
        }
        let [file_c, id_c, line_c, build_c, p2f_c, p2p_c, f2p_c, f2f_c] = cols;

        let mut outcomes = Vec::with_capacity(table.len());
        for (i, row) in table.rows().iter().enumerate() {
            let row_no = i + 2;
            let line = parse_cell(path, row_no, "lineno", &row[line_c])?;
            let build: BuildResult = row[build_c]
                .parse()
                .map_err(|e: String| FaultlineError::parse(path, row_no, e))?;

            let counts = match build {
                BuildResult::Fail => None,
                BuildResult::Pass => Some(FlipCounts {
                    p2f: parse_cell(path, row_no, "p2f", &row[p2f_c])?,
                    p2p: parse_cell(path, row_no, "p2p", &row[p2p_c])?,
                    f2p: parse_cell(path, row_no, "f2p", &row[f2p_c])?,
                    f2f: parse_cell(path, row_no, "f2f", &row[f2f_c])?,
                }),
            };

            outcomes.push(MutationOutcome {
                target_file: row[file_c].trim().to_string(),
                mutant_id: row[id_c].trim().to_string(),
                line,
                counts,
            });
        }
        Ok(Self { outcomes })
    }

    /// Load `mutation_testing_results.csv`
    pub fn load(path: &Path) -> FaultlineResult<Self> {
        Self::from_table(path, &Table::load(path)?)
    }

    /// Outcomes in log order
    #[must_use]
    pub fn outcomes(&self) -> &[MutationOutcome] {
        &self.outcomes
    }

    /// Number of tested mutants, built or not
    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Whether no mutant was tested
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Render in the tester's table format
    #[must_use]
    pub fn to_table(&self) -> Table {
        let mut table = Table::new(Self::COLUMNS);
        for o in &self.outcomes {
            let counts = o.counts.map_or_else(
                || vec!["-1".to_string(); 4],
                |c| vec![c.p2f.to_string(), c.p2p.to_string(), c.f2p.to_string(), c.f2f.to_string()],
            );
            let row = [
                o.target_file.clone(),
                o.mutant_id.clone(),
                o.line.to_string(),
                o.build_result().to_string(),
            ]
            .into_iter()
            .chain(counts);
            let _ = table.push(row);
        }
        table
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const RESULTS: &str = "\
target_file,mutant_id,lineno,build_result,p2f,p2p,f2p,f2f
src/calc.c,mutant_1,3,PASS,0,7,3,0
src/calc.c,mutant_2,3,FAIL,-1,-1,-1,-1
src/calc.c,mutant_3,8,PASS,2,5,0,3
";

    fn parse(content: &str) -> FaultlineResult<MutationResults> {
        let path = Path::new("mutation_testing_results.csv");
        MutationResults::from_table(path, &Table::parse(path, content)?)
    }

    #[test]
    fn test_parse_results() {
        let results = parse(RESULTS).unwrap();
        assert_eq!(results.len(), 3);
        let first = &results.outcomes()[0];
        assert_eq!(first.build_result(), BuildResult::Pass);
        assert_eq!(first.counts, Some(FlipCounts::new(0, 7, 3, 0)));
        assert_eq!(first.source_line(), SourceLine::new("calc.c", 3));
        assert_eq!(results.outcomes()[1].build_result(), BuildResult::Fail);
        assert_eq!(results.outcomes()[1].counts, None);
    }

    #[test]
    fn test_failed_build_counts_are_ignored() {
        let results =
            parse("target_file,mutant_id,lineno,build_result,p2f,p2p,f2p,f2f\na.c,m1,1,FAIL,,,,\n")
                .unwrap();
        assert_eq!(results.outcomes()[0].counts, None);
    }

    #[test]
    fn test_unknown_build_result() {
        let err = parse("target_file,mutant_id,lineno,build_result,p2f,p2p,f2p,f2f\na.c,m1,1,MAYBE,0,0,0,0\n")
            .unwrap_err();
        assert!(err.to_string().contains("MAYBE"));
    }

    #[test]
    fn test_negative_count_on_built_mutant() {
        let err = parse("target_file,mutant_id,lineno,build_result,p2f,p2p,f2p,f2f\na.c,m1,1,PASS,-1,0,0,0\n")
            .unwrap_err();
        assert!(err.to_string().contains("p2f"));
    }

    #[test]
    fn test_missing_column() {
        assert!(parse("target_file,mutant_id,lineno\na.c,m1,1\n").is_err());
    }

    #[test]
    fn test_table_round_trip() {
        let results = parse(RESULTS).unwrap();
        let again = parse(&results.to_table().to_csv()).unwrap();
        assert_eq!(again, results);
    }

    #[test]
    fn test_build_result_display() {
        assert_eq!(BuildResult::Pass.to_string(), "PASS");
        assert_eq!("FAIL".parse::<BuildResult>().unwrap(), BuildResult::Fail);
    }
}
