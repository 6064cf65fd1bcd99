//! Per-line score columns read back from a feature table.

use crate::key::LineKey;
use crate::result::{ensure_consistent, FaultlineError, FaultlineResult};
use crate::table::{parse_cell, Table};
use std::path::Path;

/// Selected score columns of a feature table, one row per coverage line
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreTable {
    columns: Vec<String>,
    keys: Vec<LineKey>,
    scores: Vec<Vec<f64>>,
}

impl ScoreTable {
    /// Read `columns` from a feature table
    ///
    /// The `bug` column must flag exactly one row and that row must be
    /// `buggy`.
    pub fn from_table(path: &Path, table: &Table, columns: &[&str], buggy: &LineKey) -> FaultlineResult<Self> {
        let key_col = table.require_column(path, "key")?;
        let bug_col = table.require_column(path, "bug")?;
        let score_cols = columns
            .iter()
            .map(|name| table.require_column(path, name))
            .collect::<FaultlineResult<Vec<_>>>()?;

        let mut keys = Vec::with_capacity(table.len());
        let mut scores = Vec::with_capacity(table.len());
        let mut flagged = Vec::new();
        for (i, row) in table.rows().iter().enumerate() {
            let line = i + 2;
            let key: LineKey = row[key_col]
                .parse()
                .map_err(|e: FaultlineError| FaultlineError::parse(path, line, e.to_string()))?;
            let mut values = Vec::with_capacity(columns.len());
            for (name, col) in columns.iter().zip(&score_cols) {
                values.push(parse_cell::<f64>(path, line, name, &row[*col])?);
            }
            match row[bug_col].trim() {
                "1" => flagged.push(key.clone()),
                "0" => {}
                other => {
                    return Err(FaultlineError::parse(
                        path,
                        line,
                        format!("bad value '{other}' in column 'bug'"),
                    ))
                }
            }
            keys.push(key);
            scores.push(values);
        }

        ensure_consistent!(
            flagged.len() == 1,
            "{} flags {} buggy lines, expected exactly one",
            path.display(),
            flagged.len()
        );
        ensure_consistent!(
            &flagged[0] == buggy,
            "{} flags {} but the buggy line is {buggy}",
            path.display(),
            flagged[0]
        );

        Ok(Self {
            columns: columns.iter().map(ToString::to_string).collect(),
            keys,
            scores,
        })
    }

    /// Load and check a feature table
    pub fn load(path: &Path, columns: &[&str], buggy: &LineKey) -> FaultlineResult<Self> {
        Self::from_table(path, &Table::load(path)?, columns, buggy)
    }

    /// Number of lines
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the table has no lines
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Every line paired with its value in `column`
    pub fn scored_lines(&self, column: &str) -> FaultlineResult<Vec<(LineKey, f64)>> {
        let at = self
            .columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| FaultlineError::config(format!("score column '{column}' was not loaded")))?;
        Ok(self
            .keys
            .iter()
            .zip(&self.scores)
            .map(|(key, values)| (key.clone(), values[at]))
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    const FEATURES: &str = "\
key,ep,ef,Ochiai,bug
calc.c#add#2,0,3,0.5,0
calc.c#add#3,0,3,1.0,1
\"util.c#helper(int x, int y)#2\",3,0,0.0,0
";

    fn load(content: &str, buggy: &LineKey) -> FaultlineResult<ScoreTable> {
        let path = Path::new("sbfl_features.csv");
        ScoreTable::from_table(path, &Table::parse(path, content).unwrap(), &["Ochiai"], buggy)
    }

    #[test]
    fn test_scored_lines() {
        let table = load(FEATURES, &LineKey::new("calc.c", "add", 3)).unwrap();
        assert_eq!(table.len(), 3);
        let lines = table.scored_lines("Ochiai").unwrap();
        assert_eq!(lines[1], (LineKey::new("calc.c", "add", 3), 1.0));
        assert_eq!(lines[2].0.function(), "helper(int x, int y)");
        assert!(table.scored_lines("Jaccard").is_err());
    }

    #[test]
    fn test_flag_must_match_buggy_key() {
        let err = load(FEATURES, &LineKey::new("calc.c", "add", 2)).unwrap_err();
        assert!(err.is_consistency());
    }

    #[test]
    fn test_two_flagged_rows() {
        let content = FEATURES.replace("0.5,0", "0.5,1");
        let err = load(&content, &LineKey::new("calc.c", "add", 3)).unwrap_err();
        assert!(err.to_string().contains("2 buggy lines"));
    }

    #[test]
    fn test_missing_score_column() {
        let err = load("key,bug\ncalc.c#add#3,1\n", &LineKey::new("calc.c", "add", 3)).unwrap_err();
        assert!(matches!(err, FaultlineError::Parse { .. }));
    }
}
