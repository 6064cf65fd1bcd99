//! Per-version stage execution.
//!
//! Every stage reads only materialized artifacts of its own version
//! directory and writes only inside it. [`run_version`] chains the stages
//! in memory; each `run_*` function also works alone from files written by
//! an earlier run.

use crate::config::{FaultlineConfig, VersionLayout};
use crate::coverage::{self, AuxiliaryCounts, CoverageDir, CoverageMatrix, ExecutionIndex, PostprocessedCoverage};
use crate::key::{FunctionExtents, LineKey};
use crate::mbfl::{compute_mbfl, MbflFeatures};
use crate::mutation::{aggregate, select_mutants, write_selected_mutants, MutantDb, MutationResults, SelectedMutant};
use crate::result::{FaultlineError, FaultlineResult};
use crate::sbfl::{compute_sbfl, SbflFeatures};
use crate::table::{write_text, Table};
use crate::testsuite::{read_test_list, BugInfo, TestPartition};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// A pipeline stage of one buggy version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Coverage postprocessing
    Coverage,
    /// MBFL features
    Mbfl,
    /// SBFL features
    Sbfl,
}

impl Stage {
    /// Every stage in dependency order
    pub const ALL: [Self; 3] = [Self::Coverage, Self::Mbfl, Self::Sbfl];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coverage => write!(f, "coverage"),
            Self::Mbfl => write!(f, "mbfl"),
            Self::Sbfl => write!(f, "sbfl"),
        }
    }
}

impl FromStr for Stage {
    type Err = FaultlineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "coverage" => Ok(Self::Coverage),
            "mbfl" => Ok(Self::Mbfl),
            "sbfl" => Ok(Self::Sbfl),
            other => Err(FaultlineError::config(format!("unknown stage '{other}'"))),
        }
    }
}

/// A buggy version directory read through a [`VersionLayout`]
#[derive(Debug, Clone)]
pub struct VersionDir<'a> {
    root: PathBuf,
    layout: &'a VersionLayout,
}

impl<'a> VersionDir<'a> {
    /// Open a version directory
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, layout: &'a VersionLayout) -> Self {
        Self {
            root: root.into(),
            layout,
        }
    }

    /// Directory path
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Version name (the directory name)
    #[must_use]
    pub fn name(&self) -> String {
        self.root
            .file_name()
            .map_or_else(|| self.root.display().to_string(), |n| n.to_string_lossy().into_owned())
    }

    /// Artifact layout
    #[must_use]
    pub const fn layout(&self) -> &'a VersionLayout {
        self.layout
    }

    /// Path of a layout entry
    #[must_use]
    pub fn path(&self, entry: &str) -> PathBuf {
        self.root.join(entry)
    }

    /// Ground truth
    pub fn bug_info(&self) -> FaultlineResult<BugInfo> {
        BugInfo::load(&self.path(&self.layout.bug_info))
    }

    /// Failing/passing partition
    pub fn partition(&self) -> FaultlineResult<TestPartition> {
        TestPartition::new(
            read_test_list(&self.path(&self.layout.failing_tcs), true)?,
            read_test_list(&self.path(&self.layout.passing_tcs), true)?,
        )
    }

    /// Counts of the optional test lists
    pub fn auxiliary_counts(&self) -> FaultlineResult<AuxiliaryCounts> {
        Ok(AuxiliaryCounts {
            cc_tcs: read_test_list(&self.path(&self.layout.cc_tcs), false)?.len(),
            excluded_tcs: read_test_list(&self.path(&self.layout.excluded_tcs), false)?.len(),
        })
    }

    /// Function extent table
    pub fn extents(&self) -> FaultlineResult<FunctionExtents> {
        FunctionExtents::load(&self.path(&self.layout.line2function))
    }

    /// Canonical buggy key written by the coverage stage
    pub fn buggy_line_key(&self) -> FaultlineResult<LineKey> {
        let path = self.path(&self.layout.buggy_line_key);
        if !path.exists() {
            return Err(FaultlineError::missing(&path));
        }
        let content = std::fs::read_to_string(&path)?;
        let first = content
            .lines()
            .next()
            .ok_or_else(|| FaultlineError::parse(&path, 1, "empty buggy line key"))?;
        first.parse()
    }

    /// Postprocessed coverage matrix written by the coverage stage
    pub fn coverage_matrix(&self, partition: &TestPartition, buggy: &LineKey) -> FaultlineResult<CoverageMatrix> {
        let path = self.path(&self.layout.postprocessed_coverage);
        CoverageMatrix::from_table(&path, &Table::load(&path)?, partition, buggy)
    }

    /// Lines executed by failing tests, written by the coverage stage
    pub fn executed_by_failing(&self) -> FaultlineResult<ExecutionIndex> {
        ExecutionIndex::load(&self.path(&self.layout.lines_executed_by_failing))
    }

    /// Mutation outcome log
    pub fn mutation_results(&self) -> FaultlineResult<MutationResults> {
        MutationResults::load(&self.path(&self.layout.mutation_results))
    }
}

/// Coverage stage output kept for later stages of the same run
#[derive(Debug, Clone)]
pub struct CoverageStage {
    /// Canonical buggy key
    pub buggy: LineKey,
    /// Failing/passing partition
    pub partition: TestPartition,
    /// Matrix, indexes and counters
    pub coverage: PostprocessedCoverage,
}

/// Postprocess raw coverage and write every coverage artifact
pub fn run_coverage(dir: &VersionDir<'_>) -> FaultlineResult<CoverageStage> {
    let layout = dir.layout();
    let bug_info = dir.bug_info()?;
    let extents = dir.extents()?;
    let buggy = bug_info.buggy_line_key(&extents)?;
    let partition = dir.partition()?;
    let aux = dir.auxiliary_counts()?;

    let source = CoverageDir::new(dir.path(&layout.raw_coverage_dir));
    let coverage = coverage::postprocess(&source, &extents, &partition, &buggy, aux)?;

    write_text(&dir.path(&layout.buggy_line_key), &format!("{buggy}\n"))?;
    coverage.matrix.to_table().write(&dir.path(&layout.postprocessed_coverage))?;
    write_text(
        &dir.path(&layout.lines_executed_by_failing),
        &coverage.executed_by_failing.to_json()?,
    )?;
    write_text(
        &dir.path(&layout.lines_executed_by_passing),
        &coverage.executed_by_passing.to_json()?,
    )?;
    coverage.summary.to_table().write(&dir.path(&layout.coverage_summary))?;

    info!(version = %dir.name(), buggy = %buggy, "coverage stage done");
    Ok(CoverageStage {
        buggy,
        partition,
        coverage,
    })
}

/// Select mutants on lines executed by failing tests and write the selection
pub fn run_select_mutants(dir: &VersionDir<'_>, config: &FaultlineConfig) -> FaultlineResult<Vec<SelectedMutant>> {
    let layout = dir.layout();
    let buggy = dir.buggy_line_key()?;
    let executed = dir.executed_by_failing()?;

    let targets: BTreeSet<String> = if config.target_files.is_empty() {
        executed.keys().map(|k| k.file().to_string()).collect()
    } else {
        config.target_files.iter().cloned().collect()
    };

    let mut dbs = Vec::with_capacity(targets.len());
    for target in &targets {
        dbs.push(MutantDb::load(target, &dir.path(&layout.mutant_db(target)))?);
    }

    let selected = select_mutants(&dbs, &executed, &buggy, config.max_mutants)?;
    write_selected_mutants(&dir.path(&layout.selected_mutants), &selected)?;
    info!(version = %dir.name(), selected = selected.len(), "mutant selection stage done");
    Ok(selected)
}

/// Coverage rows, partition and buggy key, from memory or from disk
fn coverage_inputs(
    dir: &VersionDir<'_>,
    stage: Option<&CoverageStage>,
) -> FaultlineResult<(CoverageMatrix, TestPartition, LineKey)> {
    if let Some(s) = stage {
        return Ok((s.coverage.matrix.clone(), s.partition.clone(), s.buggy.clone()));
    }
    let buggy = dir.buggy_line_key()?;
    let partition = dir.partition()?;
    let matrix = dir.coverage_matrix(&partition, &buggy)?;
    Ok((matrix, partition, buggy))
}

/// Aggregate mutation outcomes, score every coverage row and write the MBFL table
pub fn run_mbfl(
    dir: &VersionDir<'_>,
    config: &FaultlineConfig,
    stage: Option<&CoverageStage>,
) -> FaultlineResult<MbflFeatures> {
    let (matrix, partition, buggy) = coverage_inputs(dir, stage)?;
    let outcomes = aggregate(&dir.mutation_results()?, config.max_mutants)?;
    let features = compute_mbfl(matrix.rows(), &buggy, partition.failing().len(), &outcomes)?;
    features.to_table().write(&dir.path(&dir.layout().mbfl_features))?;
    info!(version = %dir.name(), "MBFL stage done");
    Ok(features)
}

/// Compute spectra and scores for every coverage row and write the SBFL table
pub fn run_sbfl(dir: &VersionDir<'_>, stage: Option<&CoverageStage>) -> FaultlineResult<SbflFeatures> {
    let (matrix, partition, buggy) = coverage_inputs(dir, stage)?;
    let features = compute_sbfl(&matrix, &partition, &buggy)?;
    features.to_table().write(&dir.path(&dir.layout().sbfl_features))?;
    info!(version = %dir.name(), "SBFL stage done");
    Ok(features)
}

/// What a chained run produced for one version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionReport {
    /// Version name
    pub version: String,
    /// Stages that ran
    pub stages: Vec<Stage>,
    /// Coverage rows scored
    pub lines: usize,
}

/// Run the selected stages of one version in dependency order
pub fn run_version(dir: &VersionDir<'_>, config: &FaultlineConfig, stages: &[Stage]) -> FaultlineResult<VersionReport> {
    let mut ran: Vec<Stage> = stages.to_vec();
    ran.sort();
    ran.dedup();

    let mut coverage = None;
    let mut lines = 0;
    for stage in &ran {
        match stage {
            Stage::Coverage => {
                let out = run_coverage(dir)?;
                lines = out.coverage.matrix.rows().len();
                coverage = Some(out);
            }
            Stage::Mbfl => lines = run_mbfl(dir, config, coverage.as_ref())?.records().len(),
            Stage::Sbfl => lines = run_sbfl(dir, coverage.as_ref())?.records().len(),
        }
    }

    Ok(VersionReport {
        version: dir.name(),
        stages: ran,
        lines,
    })
}
