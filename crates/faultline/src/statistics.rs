//! Corpus coverage statistics.
//!
//! Collects every version's `coverage_summary.csv` into one table with a
//! coverage ratio column, then reports column averages and the spread of
//! lines executed by failing test cases.

use crate::config::FaultlineConfig;
use crate::corpus::{partition_results, Corpus, SkippedVersion};
use crate::coverage::CoverageSummary;
use crate::pipeline::VersionDir;
use crate::result::FaultlineResult;
use crate::table::{format_score, Table};
use tracing::info;

/// Name of the ratio column appended to the summary counters
pub const COVERAGE_RATIO: &str = "coverage";

/// Coverage counters of one version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionStatistics {
    /// Version name
    pub version: String,
    /// Counters from the coverage stage
    pub summary: CoverageSummary,
}

/// Coverage counters of a corpus
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorpusStatistics {
    /// Versions in name order
    pub versions: Vec<VersionStatistics>,
    /// Versions without a readable summary
    pub skipped: Vec<SkippedVersion>,
}

impl CorpusStatistics {
    /// Average of every counter column, then of the coverage ratio
    #[must_use]
    pub fn averages(&self) -> Vec<(&'static str, f64)> {
        let n = self.versions.len();
        if n == 0 {
            return Vec::new();
        }
        let mut sums = [0.0f64; 9];
        let mut ratio = 0.0;
        for v in &self.versions {
            for (sum, value) in sums.iter_mut().zip(v.summary.values()) {
                *sum += value as f64;
            }
            ratio += v.summary.coverage_ratio();
        }
        CoverageSummary::COLUMNS
            .into_iter()
            .zip(sums)
            .map(|(name, sum)| (name, sum / n as f64))
            .chain([(COVERAGE_RATIO, ratio / n as f64)])
            .collect()
    }

    /// Fewest and most lines executed by failing test cases
    #[must_use]
    pub fn failing_lines_range(&self) -> Option<(usize, usize)> {
        let counts = self.versions.iter().map(|v| v.summary.lines_executed_by_failing_tcs);
        Some((counts.clone().min()?, counts.max()?))
    }

    /// Render `statistics_summary.csv`
    #[must_use]
    pub fn to_table(&self) -> Table {
        let header = ["version"]
            .into_iter()
            .chain(CoverageSummary::COLUMNS)
            .chain([COVERAGE_RATIO]);
        let mut table = Table::new(header);
        for v in &self.versions {
            let values = v.summary.values();
            let row = std::iter::once(v.version.clone())
                .chain(values.iter().map(ToString::to_string))
                .chain([format_score(v.summary.coverage_ratio())]);
            let _ = table.push(row);
        }
        table
    }

    /// Summary lines for the terminal
    #[must_use]
    pub fn report(&self) -> Vec<String> {
        let mut lines = vec![format!("versions: {}", self.versions.len())];
        for (name, avg) in self.averages() {
            lines.push(format!("average {name}: {avg:.2}"));
        }
        if let Some((min, max)) = self.failing_lines_range() {
            lines.push(format!("lines executed by failing TCs: min {min}, max {max}"));
        }
        lines
    }
}

/// Read the coverage summary of every version
pub fn collect_statistics(corpus: &Corpus, config: &FaultlineConfig) -> FaultlineResult<CorpusStatistics> {
    let results = corpus.map(config.effective_jobs(), |path| {
        let dir = VersionDir::new(path, &config.layout);
        let file = dir.path(&config.layout.coverage_summary);
        let summary = CoverageSummary::from_table(&file, &Table::load(&file)?)?;
        Ok(VersionStatistics {
            version: dir.name(),
            summary,
        })
    })?;
    let (versions, skipped) = partition_results(results);
    info!(versions = versions.len(), skipped = skipped.len(), "corpus statistics collected");
    Ok(CorpusStatistics { versions, skipped })
}
