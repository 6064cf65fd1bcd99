//! Covered/not-covered matrix keyed by [`LineKey`].

use crate::coverage::raw::RawCoverageReport;
use crate::key::{FunctionExtents, LineKey};
use crate::result::{ensure_consistent, FaultlineError, FaultlineResult};
use crate::table::Table;
use crate::testsuite::{TestCase, TestPartition, Verdict};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::debug;

/// Line coverage of every utilized test case of one buggy version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageMatrix {
    rows: Vec<LineKey>,
    index: HashMap<LineKey, usize>,
    columns: Vec<TestCase>,
    /// One covered-flag vector per column, indexed by row
    cells: Vec<Vec<bool>>,
}

impl CoverageMatrix {
    /// Canonical row order
    #[must_use]
    pub fn rows(&self) -> &[LineKey] {
        &self.rows
    }

    /// Test case columns, in test case order
    #[must_use]
    pub fn columns(&self) -> &[TestCase] {
        &self.columns
    }

    /// Row index of `key`
    #[must_use]
    pub fn row_of(&self, key: &LineKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// Column index of `tc`
    #[must_use]
    pub fn column_of(&self, tc: &TestCase) -> Option<usize> {
        self.columns.iter().position(|c| c == tc)
    }

    /// Whether the test case in `col` executed the line in `row`
    #[must_use]
    pub fn covered(&self, row: usize, col: usize) -> bool {
        self.cells[col][row]
    }

    /// Test cases of `tests` that executed the line in `row`
    pub fn executed_count(&self, row: usize, tests: &[TestCase]) -> FaultlineResult<usize> {
        let mut executed = 0;
        for tc in tests {
            let col = self.column_of(tc).ok_or_else(|| {
                FaultlineError::consistency(format!("test case {tc} has no coverage column"))
            })?;
            if self.covered(row, col) {
                executed += 1;
            }
        }
        Ok(executed)
    }

    /// Lines executed by at least one test case of the given verdict
    #[must_use]
    pub fn executed_by(&self, partition: &TestPartition, verdict: Verdict) -> ExecutionIndex {
        let mut lines: BTreeMap<LineKey, Vec<TestCase>> = BTreeMap::new();
        for (col, tc) in self.columns.iter().enumerate() {
            if partition.verdict(tc) != Some(verdict) {
                continue;
            }
            for (row, key) in self.rows.iter().enumerate() {
                if self.cells[col][row] {
                    lines.entry(key.clone()).or_default().push(tc.clone());
                }
            }
        }
        ExecutionIndex { lines }
    }

    /// Number of rows executed by any test case
    #[must_use]
    pub fn executed_line_count(&self) -> usize {
        (0..self.rows.len())
            .filter(|&row| self.cells.iter().any(|col| col[row]))
            .count()
    }

    /// Render as the postprocessed coverage table (`key, TC1, TC2, …`)
    #[must_use]
    pub fn to_table(&self) -> Table {
        let mut table = Table::new(
            std::iter::once("key".to_string()).chain(self.columns.iter().map(ToString::to_string)),
        );
        for (row, key) in self.rows.iter().enumerate() {
            let record = std::iter::once(key.to_string()).chain(
                self.cells
                    .iter()
                    .map(|col| if col[row] { "1" } else { "0" }.to_string()),
            );
            // Width always matches the header
            let _ = table.push(record);
        }
        table
    }

    /// Read a postprocessed coverage table back
    ///
    /// Every test case of `partition` must have a column and `buggy` must be
    /// one of the rows.
    pub fn from_table(
        path: &Path,
        table: &Table,
        partition: &TestPartition,
        buggy: &LineKey,
    ) -> FaultlineResult<Self> {
        let key_col = table.require_column(path, "key")?;
        let by_name = table.column_index();

        let columns = partition.all();
        let mut positions = Vec::with_capacity(columns.len());
        for tc in &columns {
            let pos = by_name.get(tc.name()).copied().ok_or_else(|| {
                FaultlineError::consistency(format!(
                    "test case {tc} is not found in {}",
                    path.display()
                ))
            })?;
            positions.push(pos);
        }

        let mut rows = Vec::with_capacity(table.len());
        let mut index = HashMap::with_capacity(table.len());
        let mut cells = vec![Vec::with_capacity(table.len()); columns.len()];
        for (i, record) in table.rows().iter().enumerate() {
            let key: LineKey = record[key_col].parse()?;
            ensure_consistent!(
                index.insert(key.clone(), i).is_none(),
                "duplicate line key {key} in {}",
                path.display()
            );
            rows.push(key);
            for (col, &pos) in positions.iter().enumerate() {
                let covered = match record[pos].trim() {
                    "1" => true,
                    "0" => false,
                    other => {
                        return Err(FaultlineError::parse(
                            path,
                            i + 2,
                            format!("coverage cell must be 0 or 1, found '{other}'"),
                        ))
                    }
                };
                cells[col].push(covered);
            }
        }

        ensure_consistent!(
            index.contains_key(buggy),
            "buggy line {buggy} is not a row of {}",
            path.display()
        );

        Ok(Self {
            rows,
            index,
            columns,
            cells,
        })
    }
}

/// Lines executed by a group of test cases, with the executing tests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionIndex {
    lines: BTreeMap<LineKey, Vec<TestCase>>,
}

impl ExecutionIndex {
    /// Whether any test of the group executed `key`
    #[must_use]
    pub fn contains(&self, key: &LineKey) -> bool {
        self.lines.contains_key(key)
    }

    /// Test cases that executed `key`
    #[must_use]
    pub fn tests_for(&self, key: &LineKey) -> Option<&[TestCase]> {
        self.lines.get(key).map(Vec::as_slice)
    }

    /// Number of executed lines
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether no line was executed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Executed lines in key order
    pub fn keys(&self) -> impl Iterator<Item = &LineKey> {
        self.lines.keys()
    }

    /// Serialize as `{"file#function#line": ["TC1", ...]}`
    pub fn to_json(&self) -> FaultlineResult<String> {
        let map: BTreeMap<String, &Vec<TestCase>> =
            self.lines.iter().map(|(k, v)| (k.to_string(), v)).collect();
        Ok(serde_json::to_string(&map)?)
    }

    /// Parse the JSON form written by [`ExecutionIndex::to_json`]
    pub fn from_json(path: &Path, content: &str) -> FaultlineResult<Self> {
        let raw: BTreeMap<String, Vec<TestCase>> = serde_json::from_str(content)
            .map_err(|e| FaultlineError::parse(path, e.line(), e.to_string()))?;
        let mut lines = BTreeMap::new();
        for (key, tcs) in raw {
            lines.insert(key.parse()?, tcs);
        }
        Ok(Self { lines })
    }

    /// Load an index from disk
    pub fn load(path: &Path) -> FaultlineResult<Self> {
        if !path.exists() {
            return Err(FaultlineError::missing(path));
        }
        Self::from_json(path, &std::fs::read_to_string(path)?)
    }
}

/// Builds a [`CoverageMatrix`] one test case report at a time
///
/// Scoped to a single buggy version: the first report fixes the canonical
/// row order and every later report must enumerate exactly the same keys.
#[derive(Debug)]
pub struct CoverageMatrixBuilder<'a> {
    extents: &'a FunctionExtents,
    partition: &'a TestPartition,
    buggy: &'a LineKey,
    rows: Option<Vec<LineKey>>,
    index: HashMap<LineKey, usize>,
    columns: Vec<TestCase>,
    cells: Vec<Vec<bool>>,
}

impl<'a> CoverageMatrixBuilder<'a> {
    /// Create a builder for one buggy version
    #[must_use]
    pub fn new(
        extents: &'a FunctionExtents,
        partition: &'a TestPartition,
        buggy: &'a LineKey,
    ) -> Self {
        Self {
            extents,
            partition,
            buggy,
            rows: None,
            index: HashMap::new(),
            columns: Vec::with_capacity(partition.len()),
            cells: Vec::with_capacity(partition.len()),
        }
    }

    /// Add the raw report of one test case as a new column
    pub fn add(&mut self, tc: &TestCase, report: &RawCoverageReport) -> FaultlineResult<()> {
        let verdict = self.partition.verdict(tc).ok_or_else(|| {
            FaultlineError::consistency(format!("test case {tc} is neither failing nor passing"))
        })?;
        ensure_consistent!(
            !self.columns.contains(tc),
            "coverage of test case {tc} added twice"
        );

        if self.rows.is_none() {
            self.establish_rows(report)?;
        }
        let rows = self.rows.as_deref().unwrap_or_default();

        ensure_consistent!(
            report.row_count() == rows.len(),
            "coverage of {tc} enumerates {} lines, expected {}",
            report.row_count(),
            rows.len()
        );

        let mut column = Vec::with_capacity(rows.len());
        for ((file, line, covered), expected) in report.rows().zip(rows) {
            let key = self.extents.key_for(file, line);
            ensure_consistent!(
                &key == expected,
                "coverage of {tc} enumerates {key} where {expected} was expected"
            );
            if verdict == Verdict::Failing && &key == self.buggy {
                ensure_consistent!(
                    covered,
                    "failing test case {tc} does not execute buggy line {key}"
                );
            }
            column.push(covered);
        }

        debug!(test_case = %tc, covered = column.iter().filter(|c| **c).count(), "coverage column added");
        self.columns.push(tc.clone());
        self.cells.push(column);
        Ok(())
    }

    fn establish_rows(&mut self, report: &RawCoverageReport) -> FaultlineResult<()> {
        let mut rows = Vec::with_capacity(report.row_count());
        for (file, line, _) in report.rows() {
            let key = self.extents.key_for(file, line);
            ensure_consistent!(
                self.index.insert(key.clone(), rows.len()).is_none(),
                "line key {key} appears twice in one coverage report"
            );
            rows.push(key);
        }
        self.rows = Some(rows);
        Ok(())
    }

    /// Finish the matrix; every utilized test case must have contributed
    pub fn finish(self) -> FaultlineResult<CoverageMatrix> {
        ensure_consistent!(
            self.columns.len() == self.partition.len(),
            "coverage collected for {} of {} test cases",
            self.columns.len(),
            self.partition.len()
        );
        ensure_consistent!(
            self.index.contains_key(self.buggy),
            "buggy line {} does not appear in the coverage rows",
            self.buggy
        );

        // Columns are reported in test case order
        let mut order: Vec<usize> = (0..self.columns.len()).collect();
        order.sort_by(|&a, &b| self.columns[a].cmp(&self.columns[b]));
        let columns = order.iter().map(|&i| self.columns[i].clone()).collect();
        let mut cells: Vec<Option<Vec<bool>>> = self.cells.into_iter().map(Some).collect();
        let cells = order.iter().filter_map(|&i| cells[i].take()).collect();

        Ok(CoverageMatrix {
            rows: self.rows.unwrap_or_default(),
            index: self.index,
            columns,
            cells,
        })
    }
}

/// Per-version coverage counters (`coverage_summary.csv`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageSummary {
    /// Number of failing test cases
    pub failing_tcs: usize,
    /// Number of passing test cases
    pub passing_tcs: usize,
    /// Number of coincidentally-correct test cases
    pub cc_tcs: usize,
    /// Number of excluded test cases
    pub excluded_tcs: usize,
    /// Failing plus passing test cases
    pub total_utilized_tcs: usize,
    /// Lines executed by any failing test case
    pub lines_executed_by_failing_tcs: usize,
    /// Lines executed by any passing test case
    pub lines_executed_by_passing_tcs: usize,
    /// Lines executed by any test case
    pub total_lines_executed: usize,
    /// Distinct lines in the matrix
    pub total_lines: usize,
}

impl CoverageSummary {
    /// Column names of `coverage_summary.csv`
    pub const COLUMNS: [&'static str; 9] = [
        "#_failing_tcs",
        "#_passing_tcs",
        "#_cc_tcs",
        "#_excluded_tcs",
        "#_total_utilized_tcs",
        "#_lines_executed_by_failing_tcs",
        "#_lines_executed_by_passing_tcs",
        "#_total_lines_executed",
        "#_total_lines",
    ];

    /// Counter values in column order
    #[must_use]
    pub const fn values(&self) -> [usize; 9] {
        [
            self.failing_tcs,
            self.passing_tcs,
            self.cc_tcs,
            self.excluded_tcs,
            self.total_utilized_tcs,
            self.lines_executed_by_failing_tcs,
            self.lines_executed_by_passing_tcs,
            self.total_lines_executed,
            self.total_lines,
        ]
    }

    /// Fraction of lines executed by any test case
    #[must_use]
    pub fn coverage_ratio(&self) -> f64 {
        if self.total_lines == 0 {
            0.0
        } else {
            self.total_lines_executed as f64 / self.total_lines as f64
        }
    }

    /// Render as a one-row table
    #[must_use]
    pub fn to_table(&self) -> Table {
        let mut table = Table::new(Self::COLUMNS);
        let _ = table.push(self.values().iter().map(ToString::to_string));
        table
    }

    /// Read `coverage_summary.csv`
    pub fn from_table(path: &Path, table: &Table) -> FaultlineResult<Self> {
        if table.len() != 1 {
            return Err(FaultlineError::parse(
                path,
                0,
                format!("expected one summary row, found {}", table.len()),
            ));
        }
        let row = &table.rows()[0];
        let mut values = [0usize; 9];
        for (slot, name) in values.iter_mut().zip(Self::COLUMNS) {
            let col = table.require_column(path, name)?;
            *slot = crate::table::parse_cell(path, 2, name, &row[col])?;
        }
        let [failing_tcs, passing_tcs, cc_tcs, excluded_tcs, total_utilized_tcs, lines_executed_by_failing_tcs, lines_executed_by_passing_tcs, total_lines_executed, total_lines] =
            values;
        Ok(Self {
            failing_tcs,
            passing_tcs,
            cc_tcs,
            excluded_tcs,
            total_utilized_tcs,
            lines_executed_by_failing_tcs,
            lines_executed_by_passing_tcs,
            total_lines_executed,
            total_lines,
        })
    }
}
