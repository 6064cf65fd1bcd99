//! Coverage Postprocessor
//!
//! Turns raw per-test-case line coverage into a single covered/not-covered
//! matrix keyed by [`LineKey`](crate::key::LineKey), plus the
//! lines-executed-by-failing / lines-executed-by-passing indexes.
//!
//! ```text
//! TC1.raw.json ─┐
//! TC2.raw.json ─┼─► CoverageMatrixBuilder ─► CoverageMatrix ─► postprocessed_coverage.csv
//! TCn.raw.json ─┘         (row-set check)          │
//!                                                  ├─► lines_executed_by_failing_tc.json
//!                                                  └─► lines_executed_by_passing_tc.json
//! ```
//!
//! Validation here is fatal: the buggy key must be a row and every failing
//! test case must execute it.

mod matrix;
mod raw;

pub use matrix::{CoverageMatrix, CoverageMatrixBuilder, CoverageSummary, ExecutionIndex};
pub use raw::{RawCoverageReport, RawFile, RawLine};

use crate::key::{FunctionExtents, LineKey};
use crate::result::FaultlineResult;
use crate::testsuite::{TestCase, TestPartition, Verdict};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::info;

/// Supplies the raw coverage report of a test case
pub trait CoverageSource {
    /// Raw report of `tc` on the unmodified buggy version
    fn report(&self, tc: &TestCase) -> FaultlineResult<RawCoverageReport>;
}

/// Reports stored as `<dir>/<TC>.raw.json`
#[derive(Debug, Clone)]
pub struct CoverageDir {
    dir: PathBuf,
}

impl CoverageDir {
    /// Read reports from `dir`
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl CoverageSource for CoverageDir {
    fn report(&self, tc: &TestCase) -> FaultlineResult<RawCoverageReport> {
        RawCoverageReport::load(&self.dir.join(tc.raw_coverage_file()))
    }
}

impl CoverageSource for HashMap<TestCase, RawCoverageReport> {
    fn report(&self, tc: &TestCase) -> FaultlineResult<RawCoverageReport> {
        self.get(tc).cloned().ok_or_else(|| {
            crate::result::FaultlineError::missing(tc.raw_coverage_file())
        })
    }
}

/// Extra test suite counts reported in the coverage summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuxiliaryCounts {
    /// Coincidentally-correct test cases
    pub cc_tcs: usize,
    /// Excluded test cases
    pub excluded_tcs: usize,
}

/// Everything the postprocessor derives for one buggy version
#[derive(Debug, Clone)]
pub struct PostprocessedCoverage {
    /// Covered/not-covered matrix
    pub matrix: CoverageMatrix,
    /// Lines executed by failing test cases
    pub executed_by_failing: ExecutionIndex,
    /// Lines executed by passing test cases
    pub executed_by_passing: ExecutionIndex,
    /// Corpus-style counters
    pub summary: CoverageSummary,
}

/// Build the coverage matrix and its indexes for one buggy version
pub fn postprocess<S: CoverageSource + ?Sized>(
    source: &S,
    extents: &FunctionExtents,
    partition: &TestPartition,
    buggy: &LineKey,
    aux: AuxiliaryCounts,
) -> FaultlineResult<PostprocessedCoverage> {
    let mut builder = CoverageMatrixBuilder::new(extents, partition, buggy);
    for tc in partition.all() {
        let report = source.report(&tc)?;
        builder.add(&tc, &report)?;
    }
    let matrix = builder.finish()?;
    Ok(derive(matrix, partition, aux))
}

/// Derive indexes and counters from an existing matrix
#[must_use]
pub fn derive(matrix: CoverageMatrix, partition: &TestPartition, aux: AuxiliaryCounts) -> PostprocessedCoverage {
    let executed_by_failing = matrix.executed_by(partition, Verdict::Failing);
    let executed_by_passing = matrix.executed_by(partition, Verdict::Passing);

    let summary = CoverageSummary {
        failing_tcs: partition.failing().len(),
        passing_tcs: partition.passing().len(),
        cc_tcs: aux.cc_tcs,
        excluded_tcs: aux.excluded_tcs,
        total_utilized_tcs: partition.len(),
        lines_executed_by_failing_tcs: executed_by_failing.len(),
        lines_executed_by_passing_tcs: executed_by_passing.len(),
        total_lines_executed: matrix.executed_line_count(),
        total_lines: matrix.rows().len(),
    };

    info!(
        lines = summary.total_lines,
        executed = summary.total_lines_executed,
        by_failing = summary.lines_executed_by_failing_tcs,
        "coverage postprocessed"
    );

    PostprocessedCoverage {
        matrix,
        executed_by_failing,
        executed_by_passing,
        summary,
    }
}

#[cfg(test)]
mod tests;
