//! Corpus rank summary and top-N accuracy.

use crate::config::{FaultlineConfig, VersionLayout};
use crate::corpus::{partition_results, Corpus, SkippedVersion};
use crate::coverage::CoverageSummary;
use crate::key::LineKey;
use crate::mbfl::{MET_SCORE, MUSE_SCORE};
use crate::mutation::MutantStatistics;
use crate::pipeline::VersionDir;
use crate::rank::function::{rank_functions, FunctionRank};
use crate::rank::scores::ScoreTable;
use crate::result::{ensure_consistent, FaultlineError, FaultlineResult};
use crate::sbfl::SbflFormula;
use crate::table::{format_score, Table};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// A group of formulas ranked together
///
/// MBFL and SBFL scores are never mixed into one ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormulaFamily {
    /// Metallaxis and MUSE
    Mbfl,
    /// The eight spectrum formulas
    Sbfl,
}

/// One ranked score column and the label used in summary headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreColumn {
    /// Short label (`met`, `Ochiai`)
    pub label: &'static str,
    /// Column name in the feature table
    pub column: &'static str,
}

impl FormulaFamily {
    /// Score columns of the family, in summary order
    #[must_use]
    pub fn columns(self) -> Vec<ScoreColumn> {
        match self {
            Self::Mbfl => vec![
                ScoreColumn {
                    label: "met",
                    column: MET_SCORE,
                },
                ScoreColumn {
                    label: "muse",
                    column: MUSE_SCORE,
                },
            ],
            Self::Sbfl => SbflFormula::ALL
                .iter()
                .map(|f| ScoreColumn {
                    label: f.name(),
                    column: f.name(),
                })
                .collect(),
        }
    }

    /// Feature table the family is read from
    #[must_use]
    pub fn feature_file(self, layout: &VersionLayout) -> &str {
        match self {
            Self::Mbfl => &layout.mbfl_features,
            Self::Sbfl => &layout.sbfl_features,
        }
    }
}

impl fmt::Display for FormulaFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mbfl => write!(f, "mbfl"),
            Self::Sbfl => write!(f, "sbfl"),
        }
    }
}

impl FromStr for FormulaFamily {
    type Err = FaultlineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mbfl" => Ok(Self::Mbfl),
            "sbfl" => Ok(Self::Sbfl),
            other => Err(FaultlineError::config(format!("unknown formula family '{other}'"))),
        }
    }
}

/// Ranking outcome of one buggy version
#[derive(Debug, Clone, PartialEq)]
pub struct VersionRanking {
    /// Version name
    pub version: String,
    /// Ground-truth key
    pub buggy: LineKey,
    /// Test and line counters from the coverage stage
    pub coverage: CoverageSummary,
    /// Mutant counts (MBFL family only)
    pub mutants: Option<MutantStatistics>,
    /// Functions in the ranking
    pub functions: usize,
    /// One rank per family column, in column order
    pub ranks: Vec<FunctionRank>,
}

/// Rank the buggy function of one version under every formula of `family`
pub fn rank_version(dir: &VersionDir<'_>, family: FormulaFamily) -> FaultlineResult<VersionRanking> {
    let layout = dir.layout();
    let buggy = dir.buggy_line_key()?;
    let summary_path = dir.path(&layout.coverage_summary);
    let coverage = CoverageSummary::from_table(&summary_path, &Table::load(&summary_path)?)?;

    let columns = family.columns();
    let names: Vec<&str> = columns.iter().map(|c| c.column).collect();
    let scores = ScoreTable::load(&dir.path(family.feature_file(layout)), &names, &buggy)?;

    let mut ranks = Vec::with_capacity(columns.len());
    for column in &columns {
        ranks.push(rank_functions(&scores.scored_lines(column.column)?, &buggy)?);
    }
    let functions = ranks.first().map_or(0, |r| r.functions);
    ensure_consistent!(
        ranks.iter().all(|r| r.functions == functions),
        "formulas disagree on the number of functions"
    );

    let mutants = match family {
        FormulaFamily::Mbfl => Some(MutantStatistics::collect(&dir.mutation_results()?, &buggy)),
        FormulaFamily::Sbfl => None,
    };

    Ok(VersionRanking {
        version: dir.name(),
        buggy,
        coverage,
        mutants,
        functions,
        ranks,
    })
}

/// Versions whose buggy function ranks within the top `n`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Accuracy {
    /// Ranked at or above `n`
    pub hits: usize,
    /// Versions ranked
    pub total: usize,
    /// `hits / total` as a percentage (0 on an empty corpus)
    pub percent: f64,
}

/// Rank summary of a corpus for one formula family
#[derive(Debug, Clone, PartialEq)]
pub struct RankSummary {
    /// Family ranked
    pub family: FormulaFamily,
    /// Per-version outcomes in version-name order
    pub rows: Vec<VersionRanking>,
    /// Versions excluded, with the reason
    pub skipped: Vec<SkippedVersion>,
}

impl RankSummary {
    /// Accuracy@`n` of the family column at `index`
    #[must_use]
    pub fn accuracy(&self, index: usize, n: usize) -> Accuracy {
        let total = self.rows.len();
        let hits = self
            .rows
            .iter()
            .filter(|r| r.ranks.get(index).is_some_and(|rank| rank.buggy_rank <= n))
            .count();
        let percent = if total == 0 {
            0.0
        } else {
            hits as f64 * 100.0 / total as f64
        };
        Accuracy { hits, total, percent }
    }

    /// Column names of the summary table
    #[must_use]
    pub fn header(family: FormulaFamily) -> Vec<String> {
        let mut header: Vec<String> = [
            "buggy_version",
            "buggy_line_key",
            "# of failing tcs",
            "# of passing tcs",
            "# of ccts",
            "# of excluded tcs",
            "# of lines executed by failing TCs",
        ]
        .map(String::from)
        .to_vec();
        if family == FormulaFamily::Mbfl {
            header.extend(
                [
                    "# of mutants",
                    "# of uncompilable mutants",
                    "# of mutants on buggy line",
                    "# of uncompilable mutants on buggy line",
                    "# of compilable mutants on buggy line",
                    "total p2f (all mutants)",
                    "total f2p (all mutants)",
                ]
                .map(String::from),
            );
        }
        header.push("# of functions".into());
        for ScoreColumn { label, .. } in family.columns() {
            header.push(format!("# of functions with same highest {label} score"));
            header.push(format!("{label} score of highest rank"));
            header.push(format!("rank of buggy function (function level) ({label})"));
            header.push(format!("{label} score of buggy function"));
        }
        header
    }

    /// Render one row per ranked version
    #[must_use]
    pub fn to_table(&self) -> Table {
        let mut table = Table::new(Self::header(self.family));
        for row in &self.rows {
            let c = &row.coverage;
            let mut fields = vec![
                row.version.clone(),
                row.buggy.to_string(),
                c.failing_tcs.to_string(),
                c.passing_tcs.to_string(),
                c.cc_tcs.to_string(),
                c.excluded_tcs.to_string(),
                c.lines_executed_by_failing_tcs.to_string(),
            ];
            if self.family == FormulaFamily::Mbfl {
                let m = row.mutants.unwrap_or_default();
                fields.extend([
                    m.mutants.to_string(),
                    m.uncompilable.to_string(),
                    m.on_buggy_line.to_string(),
                    m.uncompilable_on_buggy_line.to_string(),
                    m.compilable_on_buggy_line.to_string(),
                    m.total_p2f.to_string(),
                    m.total_f2p.to_string(),
                ]);
            }
            fields.push(row.functions.to_string());
            for rank in &row.ranks {
                fields.extend([
                    rank.tied_at_top.to_string(),
                    format_score(rank.best_score),
                    rank.buggy_rank.to_string(),
                    format_score(rank.buggy_score),
                ]);
            }
            let _ = table.push(fields);
        }
        table
    }

    /// Sibling path of the skip list (`rank.csv` → `rank.skipped.csv`)
    #[must_use]
    pub fn skipped_path(summary: &Path) -> PathBuf {
        summary.with_extension("skipped.csv")
    }

    /// Write the summary and its skip list
    pub fn write(&self, path: &Path) -> FaultlineResult<()> {
        self.to_table().write(path)?;
        SkippedVersion::to_table(&self.skipped).write(&Self::skipped_path(path))
    }

    /// Accuracy lines for the terminal
    #[must_use]
    pub fn accuracy_report(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for (i, column) in self.family.columns().iter().enumerate() {
            for n in [5, 10] {
                let acc = self.accuracy(i, n);
                lines.push(format!(
                    "{} acc@{n}: {}/{} ({:.2}%)",
                    column.label, acc.hits, acc.total, acc.percent
                ));
            }
        }
        lines
    }
}

/// Rank every version of a corpus, skipping versions that fail
pub fn rank_corpus(corpus: &Corpus, family: FormulaFamily, config: &FaultlineConfig) -> FaultlineResult<RankSummary> {
    let results = corpus.map(config.effective_jobs(), |path| {
        rank_version(&VersionDir::new(path, &config.layout), family)
    })?;
    let (rows, skipped) = partition_results(results);
    info!(
        family = %family,
        ranked = rows.len(),
        skipped = skipped.len(),
        "corpus ranked"
    );
    Ok(RankSummary { family, rows, skipped })
}
