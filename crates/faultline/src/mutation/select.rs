//! Mutant selection from the mutation engine's database.
//!
//! The engine writes one `<stem>_mut_db.csv` per target file: two header
//! lines, then one row per candidate mutant in the order the engine (or a
//! shuffling collaborator) supplies. Selection keeps, per line executed by a
//! failing test, the first `max_mutants` candidates on that line.

use crate::coverage::ExecutionIndex;
use crate::key::{file_name_of, LineKey, SourceLine};
use crate::result::{ensure_consistent, FaultlineError, FaultlineResult};
use crate::table::{format_record, parse_cell, parse_records, write_text};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::path::Path;
use tracing::{debug, info};

/// First header line of the database and of `selected_mutants.csv`
const GROUP_HEADER: &str = ",,,,,Before Mutation,,,,,After Mutation";

const RECORD_HEADER: [&str; 13] = [
    "Mutant Filename",
    "Mutation Operator",
    "Start Line#",
    "Start Col#",
    "End Line#",
    "End Col#",
    "Target Token",
    "Start Line#",
    "Start Col#",
    "End Line#",
    "End Col#",
    "Mutated Token",
    "Extra Info",
];

/// Location and text of a token before or after mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSpan {
    /// First line
    pub start_line: u32,
    /// First column
    pub start_col: u32,
    /// Last line
    pub end_line: u32,
    /// Last column
    pub end_col: u32,
    /// Token text
    pub token: String,
}

impl TokenSpan {
    fn parse(path: &Path, row: usize, fields: &[String]) -> FaultlineResult<Self> {
        Ok(Self {
            start_line: parse_cell(path, row, "Start Line#", &fields[0])?,
            start_col: parse_cell(path, row, "Start Col#", &fields[1])?,
            end_line: parse_cell(path, row, "End Line#", &fields[2])?,
            end_col: parse_cell(path, row, "End Col#", &fields[3])?,
            token: fields[4].clone(),
        })
    }

    fn fields(&self) -> [String; 5] {
        [
            self.start_line.to_string(),
            self.start_col.to_string(),
            self.end_line.to_string(),
            self.end_col.to_string(),
            self.token.clone(),
        ]
    }
}

/// One candidate mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutantRecord {
    /// File name of the generated mutant source
    pub mutant_file: String,
    /// Mutation operator tag
    pub operator: String,
    /// Original token span
    pub before: TokenSpan,
    /// Mutated token span
    pub after: TokenSpan,
    /// Free-form engine notes
    pub extra_info: String,
}

impl MutantRecord {
    /// Line the mutation applies to
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.before.start_line
    }

    fn fields(&self) -> Vec<String> {
        let mut fields = vec![self.mutant_file.clone(), self.operator.clone()];
        fields.extend(self.before.fields());
        fields.extend(self.after.fields());
        fields.push(self.extra_info.clone());
        fields
    }
}

/// Candidate mutants of one target file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutantDb {
    file: String,
    records: Vec<MutantRecord>,
}

impl MutantDb {
    /// Wrap records of the file named by `target_file`
    #[must_use]
    pub fn new(target_file: &str, records: Vec<MutantRecord>) -> Self {
        Self {
            file: file_name_of(target_file).to_string(),
            records,
        }
    }

    /// Parse a mutant database; the first two lines are headers
    pub fn parse(target_file: &str, path: &Path, content: &str) -> FaultlineResult<Self> {
        let mut records = Vec::new();
        for (i, fields) in parse_records(path, content)?.into_iter().enumerate().skip(2) {
            let row = i + 1;
            if fields.len() < 12 {
                return Err(FaultlineError::parse(
                    path,
                    row,
                    format!("expected at least 12 fields, found {}", fields.len()),
                ));
            }
            records.push(MutantRecord {
                mutant_file: fields[0].clone(),
                operator: fields[1].clone(),
                before: TokenSpan::parse(path, row, &fields[2..7])?,
                after: TokenSpan::parse(path, row, &fields[7..12])?,
                extra_info: fields[12..].join(","),
            });
        }
        Ok(Self::new(target_file, records))
    }

    /// Load `path`; a missing database means no mutants for the file
    pub fn load(target_file: &str, path: &Path) -> FaultlineResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no mutant database");
            return Ok(Self::new(target_file, Vec::new()));
        }
        Self::parse(target_file, path, &std::fs::read_to_string(path)?)
    }

    /// File name of the mutated target
    #[must_use]
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Candidates in supplied order
    #[must_use]
    pub fn records(&self) -> &[MutantRecord] {
        &self.records
    }
}

/// A mutant chosen for testing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedMutant {
    /// Target file name
    pub file: String,
    /// Sequential id (`mutant_1`, `mutant_2`, …)
    pub mutant_id: String,
    /// Mutated line
    pub line: u32,
    /// Database record
    pub record: MutantRecord,
}

/// Choose up to `max_mutants` candidates per line executed by failing tests
///
/// The buggy line must be among the executed lines.
pub fn select_mutants(
    dbs: &[MutantDb],
    executed_by_failing: &ExecutionIndex,
    buggy: &LineKey,
    max_mutants: usize,
) -> FaultlineResult<Vec<SelectedMutant>> {
    let executed: BTreeSet<SourceLine> = executed_by_failing.keys().map(LineKey::source_line).collect();
    ensure_consistent!(
        executed.contains(&buggy.source_line()),
        "buggy line {buggy} is not executed by any failing test case"
    );

    let mut per_line: BTreeMap<SourceLine, Vec<&MutantRecord>> = BTreeMap::new();
    for db in dbs {
        let mut kept = 0usize;
        for record in &db.records {
            let line = SourceLine {
                file: db.file.clone(),
                line: record.line(),
            };
            if !executed.contains(&line) {
                continue;
            }
            let chosen = per_line.entry(line).or_default();
            if chosen.len() < max_mutants {
                chosen.push(record);
                kept += 1;
            }
        }
        debug!(file = %db.file, candidates = db.records.len(), kept, "mutants selected");
    }

    let selected: Vec<SelectedMutant> = per_line
        .into_iter()
        .flat_map(|(line, records)| {
            records.into_iter().map(move |record| (line.clone(), record))
        })
        .enumerate()
        .map(|(i, (line, record))| SelectedMutant {
            file: line.file,
            mutant_id: format!("mutant_{}", i + 1),
            line: line.line,
            record: record.clone(),
        })
        .collect();

    info!(selected = selected.len(), "mutant selection done");
    Ok(selected)
}

/// Render `selected_mutants.csv`
#[must_use]
pub fn selected_mutants_csv(selected: &[SelectedMutant]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{GROUP_HEADER}");
    let header: Vec<&str> = ["target filename", "mutant_id", "lineno"]
        .into_iter()
        .chain(RECORD_HEADER)
        .collect();
    let _ = writeln!(out, "{}", format_record(&header));
    for m in selected {
        let mut fields = vec![m.file.clone(), m.mutant_id.clone(), m.line.to_string()];
        fields.extend(m.record.fields());
        let _ = writeln!(out, "{}", format_record(&fields));
    }
    out
}

/// Write `selected_mutants.csv`
pub fn write_selected_mutants(path: &Path, selected: &[SelectedMutant]) -> FaultlineResult<()> {
    write_text(path, &selected_mutants_csv(selected))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::testsuite::TestCase;

    const DB: &str = "\
,,Before Mutation,,,,,After Mutation,,,,,
Mutant Filename,Mutation Operator,Start Line#,Start Col#,End Line#,End Col#,Target Token,Start Line#,Start Col#,End Line#,End Col#,Mutated Token,Extra Info
calc.MUT1.c,ROR,3,10,3,11,<,3,10,3,12,<=,
calc.MUT2.c,AOR,3,14,3,15,+,3,14,3,15,-,
calc.MUT3.c,ROR,3,10,3,11,<,3,10,3,11,>,
calc.MUT4.c,CRCR,7,5,7,6,0,7,5,7,6,1,
calc.MUT5.c,AOR,9,2,9,3,*,9,2,9,3,/,
";

    fn index(keys: &[&str]) -> ExecutionIndex {
        let map: BTreeMap<String, Vec<TestCase>> = keys
            .iter()
            .map(|k| ((*k).to_string(), vec![TestCase::new("TC1")]))
            .collect();
        ExecutionIndex::from_json(Path::new("idx.json"), &serde_json::to_string(&map).unwrap())
            .unwrap()
    }

    fn db() -> MutantDb {
        MutantDb::parse("src/calc.c", Path::new("calc_mut_db.csv"), DB).unwrap()
    }

    #[test]
    fn test_parse_database() {
        let db = db();
        assert_eq!(db.file(), "calc.c");
        assert_eq!(db.records().len(), 5);
        let first = &db.records()[0];
        assert_eq!(first.operator, "ROR");
        assert_eq!(first.line(), 3);
        assert_eq!(first.after.token, "<=");
        assert_eq!(first.extra_info, "");
    }

    #[test]
    fn test_parse_rejects_short_row() {
        let content = "h1\nh2\ncalc.MUT1.c,ROR,3\n";
        assert!(MutantDb::parse("calc.c", Path::new("db.csv"), content).is_err());
    }

    #[test]
    fn test_select_caps_per_line() {
        let executed = index(&["calc.c#add#3", "calc.c#mul#7"]);
        let buggy = LineKey::new("calc.c", "add", 3);
        let selected = select_mutants(&[db()], &executed, &buggy, 2).unwrap();

        let lines: Vec<u32> = selected.iter().map(|m| m.line).collect();
        assert_eq!(lines, vec![3, 3, 7]);
        assert_eq!(selected[0].record.mutant_file, "calc.MUT1.c");
        assert_eq!(selected[1].record.mutant_file, "calc.MUT2.c");
        assert_eq!(selected[2].mutant_id, "mutant_3");
    }

    #[test]
    fn test_select_requires_buggy_line() {
        let executed = index(&["calc.c#mul#7"]);
        let buggy = LineKey::new("calc.c", "add", 3);
        let err = select_mutants(&[db()], &executed, &buggy, 2).unwrap_err();
        assert!(err.is_consistency());
    }

    #[test]
    fn test_selected_csv_layout() {
        let executed = index(&["calc.c#add#3"]);
        let buggy = LineKey::new("calc.c", "add", 3);
        let selected = select_mutants(&[db()], &executed, &buggy, 1).unwrap();
        let csv = selected_mutants_csv(&selected);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], GROUP_HEADER);
        assert!(lines[1].starts_with("target filename,mutant_id,lineno,Mutant Filename"));
        assert_eq!(lines[2], "calc.c,mutant_1,3,calc.MUT1.c,ROR,3,10,3,11,<,3,10,3,12,<=,");
    }

    #[test]
    fn test_load_missing_database_is_empty() {
        let db = MutantDb::load("calc.c", Path::new("/nonexistent/calc_mut_db.csv")).unwrap();
        assert!(db.records().is_empty());
    }
}
