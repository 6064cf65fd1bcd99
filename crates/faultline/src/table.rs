//! Column-labeled CSV tables.
//!
//! Every artifact this crate reads or writes is a small comma-separated
//! table with one header row. Fields that contain commas, quotes or line
//! breaks are quoted (function signatures routinely contain commas).

use crate::result::{FaultlineError, FaultlineResult};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

/// Quote a field when it needs quoting
#[must_use]
pub fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render one CSV record (without trailing newline)
#[must_use]
pub fn format_record<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|f| escape_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Format a score the way the dataset files carry them (`1.0`, `0.408…`)
#[must_use]
pub fn format_score(value: f64) -> String {
    format!("{value:?}")
}

/// Split CSV text into records, honoring quoted fields
pub fn parse_records(path: &Path, content: &str) -> FaultlineResult<Vec<Vec<String>>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1usize;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                if !(record.len() == 1 && record[0].is_empty()) {
                    records.push(std::mem::take(&mut record));
                }
                record.clear();
                line += 1;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(FaultlineError::parse(path, line, "unterminated quoted field"));
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    Ok(records)
}

/// A CSV table with a header row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Create an empty table with the given header
    #[must_use]
    pub fn new<S: Into<String>>(header: impl IntoIterator<Item = S>) -> Self {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Parse a table; every row must have the header's width
    pub fn parse(path: &Path, content: &str) -> FaultlineResult<Self> {
        let mut records = parse_records(path, content)?.into_iter();
        let header = records
            .next()
            .ok_or_else(|| FaultlineError::parse(path, 1, "missing header row"))?;

        let mut rows = Vec::new();
        for (idx, row) in records.enumerate() {
            if row.len() != header.len() {
                return Err(FaultlineError::parse(
                    path,
                    idx + 2,
                    format!("expected {} fields, found {}", header.len(), row.len()),
                ));
            }
            rows.push(row);
        }

        Ok(Self { header, rows })
    }

    /// Load a table from disk
    pub fn load(path: &Path) -> FaultlineResult<Self> {
        if !path.exists() {
            return Err(FaultlineError::missing(path));
        }
        Self::parse(path, &std::fs::read_to_string(path)?)
    }

    /// Column names
    #[must_use]
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Data rows
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a named column
    #[must_use]
    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// Index of a named column, or a parse error naming `path`
    pub fn require_column(&self, path: &Path, name: &str) -> FaultlineResult<usize> {
        self.column(name)
            .ok_or_else(|| FaultlineError::parse(path, 1, format!("missing column '{name}'")))
    }

    /// Map of column name to index
    #[must_use]
    pub fn column_index(&self) -> HashMap<&str, usize> {
        self.header
            .iter()
            .enumerate()
            .map(|(i, h)| (h.as_str(), i))
            .collect()
    }

    /// Append a row; its width must match the header
    pub fn push<S: Into<String>>(&mut self, row: impl IntoIterator<Item = S>) -> FaultlineResult<()> {
        let row: Vec<String> = row.into_iter().map(Into::into).collect();
        if row.len() != self.header.len() {
            return Err(FaultlineError::consistency(format!(
                "row has {} fields but the table has {} columns",
                row.len(),
                self.header.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Render as CSV text
    #[must_use]
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", format_record(&self.header));
        for row in &self.rows {
            let _ = writeln!(out, "{}", format_record(row));
        }
        out
    }

    /// Write the table, creating parent directories
    pub fn write(&self, path: &Path) -> FaultlineResult<()> {
        write_text(path, &self.to_csv())
    }
}

/// Write a text artifact, creating parent directories
pub fn write_text(path: &Path, content: &str) -> FaultlineResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

/// Parse a numeric cell, naming the column on failure
pub fn parse_cell<T: std::str::FromStr>(
    path: &Path,
    row: usize,
    column: &str,
    value: &str,
) -> FaultlineResult<T> {
    value.trim().parse().map_err(|_| {
        FaultlineError::parse(path, row, format!("bad value '{value}' in column '{column}'"))
    })
}
