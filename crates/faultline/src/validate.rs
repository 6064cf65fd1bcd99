//! Prerequisite checks before ranking a corpus.

use crate::config::FaultlineConfig;
use crate::corpus::Corpus;
use crate::pipeline::VersionDir;
use crate::result::{ensure_consistent, FaultlineError, FaultlineResult};
use crate::table::Table;
use tracing::{debug, warn};

/// Validation outcome of one version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Version name
    pub version: String,
    /// First failed check, `None` when the version is valid
    pub problem: Option<String>,
}

impl ValidationReport {
    /// Whether every check passed
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.problem.is_none()
    }

    /// Render reports as `version,valid,reason`
    #[must_use]
    pub fn to_table(reports: &[Self]) -> Table {
        let mut table = Table::new(["version", "valid", "reason"]);
        for r in reports {
            let _ = table.push([
                r.version.clone(),
                r.is_valid().to_string(),
                r.problem.clone().unwrap_or_default(),
            ]);
        }
        table
    }
}

/// Check that a version's coverage artifacts agree with its ground truth
pub fn validate_version(dir: &VersionDir<'_>) -> FaultlineResult<()> {
    let layout = dir.layout();
    let bug_info = dir.bug_info()?;
    let buggy = dir.buggy_line_key()?;
    ensure_consistent!(
        buggy.line() == bug_info.buggy_line_number,
        "buggy line key {buggy} disagrees with bug_info line {}",
        bug_info.buggy_line_number
    );
    ensure_consistent!(
        buggy.file() == bug_info.target_file_name(),
        "buggy line key {buggy} is not in {}",
        bug_info.target_code_file
    );

    for entry in [&layout.postprocessed_coverage, &layout.lines_executed_by_failing, &layout.line2function] {
        let path = dir.path(entry);
        if !path.exists() {
            return Err(FaultlineError::missing(path));
        }
    }

    let partition = dir.partition()?;
    let matrix = dir.coverage_matrix(&partition, &buggy)?;
    let row = matrix
        .row_of(&buggy)
        .ok_or_else(|| FaultlineError::consistency(format!("buggy line {buggy} is not a coverage row")))?;
    for tc in partition.failing() {
        let col = matrix
            .column_of(tc)
            .ok_or_else(|| FaultlineError::consistency(format!("failing test case {tc} has no column")))?;
        ensure_consistent!(
            matrix.covered(row, col),
            "failing test case {tc} does not execute buggy line {buggy}"
        );
    }
    debug!(version = %dir.name(), "version valid");
    Ok(())
}

/// Validate every version; an invalid version never stops the others
pub fn validate_corpus(corpus: &Corpus, config: &FaultlineConfig) -> FaultlineResult<Vec<ValidationReport>> {
    let results = corpus.map(config.effective_jobs(), |path| {
        validate_version(&VersionDir::new(path, &config.layout))
    })?;
    Ok(results
        .into_iter()
        .map(|(version, result)| {
            let problem = result.err().map(|e| e.to_string());
            if let Some(reason) = &problem {
                warn!(version = %version, reason = %reason, "version invalid");
            }
            ValidationReport { version, problem }
        })
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::pipeline::run_coverage;
    use crate::testing::SyntheticVersion;

    fn prepared(tmp: &std::path::Path, name: &str, config: &FaultlineConfig) -> std::path::PathBuf {
        let root = SyntheticVersion::default().write(tmp, name);
        run_coverage(&VersionDir::new(&root, &config.layout)).unwrap();
        root
    }

    #[test]
    fn test_valid_version() {
        let tmp = tempfile::tempdir().unwrap();
        let config = FaultlineConfig::default();
        let root = prepared(tmp.path(), "v1", &config);
        validate_version(&VersionDir::new(&root, &config.layout)).unwrap();
    }

    #[test]
    fn test_line_mismatch() {
        let tmp = tempfile::tempdir().unwrap();
        let config = FaultlineConfig::default();
        let root = prepared(tmp.path(), "v1", &config);
        std::fs::write(root.join(&config.layout.buggy_line_key), "calc.c#add#2\n").unwrap();
        let err = validate_version(&VersionDir::new(&root, &config.layout)).unwrap_err();
        assert!(err.to_string().contains("disagrees"));
    }

    #[test]
    fn test_failing_test_must_cover_buggy_row() {
        let tmp = tempfile::tempdir().unwrap();
        let config = FaultlineConfig::default();
        let root = prepared(tmp.path(), "v1", &config);
        let path = root.join(&config.layout.postprocessed_coverage);
        let table = Table::load(&path).unwrap();
        let tc1 = table.column("TC1").unwrap();
        let mut edited = Table::new(table.header().to_vec());
        for row in table.rows() {
            let mut row = row.clone();
            if row[0] == "calc.c#add#3" {
                row[tc1] = "0".into();
            }
            edited.push(row).unwrap();
        }
        edited.write(&path).unwrap();

        let err = validate_version(&VersionDir::new(&root, &config.layout)).unwrap_err();
        assert!(err.to_string().contains("TC1"));
    }

    #[test]
    fn test_corpus_reports_every_version() {
        let tmp = tempfile::tempdir().unwrap();
        let config = FaultlineConfig::default().with_jobs(2);
        prepared(tmp.path(), "v1", &config);
        SyntheticVersion::default().write(tmp.path(), "v2");

        let reports = validate_corpus(&Corpus::open(tmp.path()).unwrap(), &config).unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports[0].is_valid());
        assert!(!reports[1].is_valid());
        assert!(reports[1].problem.as_deref().unwrap().contains("buggy_line_key.txt"));

        let table = ValidationReport::to_table(&reports);
        assert_eq!(table.rows()[0][1], "true");
    }
}
