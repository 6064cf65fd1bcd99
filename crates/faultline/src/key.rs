//! Canonical source-line identity.
//!
//! A [`LineKey`] names one line of the program under test as
//! `(file, enclosing function, line number)` and serializes to
//! `"file#function#lineno"`. The function component is recovered from a
//! [`FunctionExtents`] table; lines outside every known extent carry the
//! [`FUNCTION_NOT_FOUND`] sentinel.

use crate::result::{FaultlineError, FaultlineResult};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Function component of a line outside every known function extent
pub const FUNCTION_NOT_FOUND: &str = "FUNCTIONNOTFOUND";

/// Last path component of a reported source file
#[must_use]
pub fn file_name_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// `(file name, line number)` pair used to join coverage rows with mutants
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceLine {
    /// File name (last path component)
    pub file: String,
    /// 1-based line number
    pub line: u32,
}

impl SourceLine {
    /// Create a source line, reducing `path` to its file name
    #[must_use]
    pub fn new(path: &str, line: u32) -> Self {
        Self {
            file: file_name_of(path).to_string(),
            line,
        }
    }
}

/// Canonical identity of a source line
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineKey {
    file: String,
    function: String,
    line: u32,
}

impl LineKey {
    /// Create a key from its three components
    #[must_use]
    pub fn new(file: impl Into<String>, function: impl Into<String>, line: u32) -> Self {
        let file = file.into();
        Self {
            file: file_name_of(&file).to_string(),
            function: function.into(),
            line,
        }
    }

    /// File name component
    #[must_use]
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Enclosing function component
    #[must_use]
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Line number component
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }

    /// Whether the enclosing function could not be resolved
    #[must_use]
    pub fn function_not_found(&self) -> bool {
        self.function == FUNCTION_NOT_FOUND
    }

    /// Join key against mutation outcomes
    #[must_use]
    pub fn source_line(&self) -> SourceLine {
        SourceLine {
            file: self.file.clone(),
            line: self.line,
        }
    }

    /// `(file, function)` group used by function-level ranking
    #[must_use]
    pub fn function_id(&self) -> (&str, &str) {
        (&self.file, &self.function)
    }
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}#{}", self.file, self.function, self.line)
    }
}

impl FromStr for LineKey {
    type Err = FaultlineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || FaultlineError::consistency(format!("malformed line key '{s}'"));

        let (file, rest) = s.split_once('#').ok_or_else(invalid)?;
        let (function, line) = rest.rsplit_once('#').ok_or_else(invalid)?;
        let line = line.parse::<u32>().map_err(|_| invalid())?;
        if file.is_empty() || function.is_empty() {
            return Err(invalid());
        }

        Ok(Self::new(file, function, line))
    }
}

/// One `(function_name, start_line, end_line)` entry of the extent table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FunctionExtent {
    /// Function name or signature
    pub name: String,
    /// First line of the function (inclusive)
    pub start: u32,
    /// Last line of the function (inclusive)
    pub end: u32,
}

impl FunctionExtent {
    /// Whether `line` falls inside this extent
    #[must_use]
    pub const fn contains(&self, line: u32) -> bool {
        self.start <= line && line <= self.end
    }
}

/// Function extents recovered per source file
#[derive(Debug, Clone, Default)]
pub struct FunctionExtents {
    /// Entries in a deterministic order (sorted by source path)
    files: Vec<(String, Vec<FunctionExtent>)>,
}

/// Extent entries appear as `["name", start, end]` with numbers or numeric strings
#[derive(Deserialize)]
#[serde(untagged)]
enum LineNumber {
    Number(u32),
    Text(String),
}

impl LineNumber {
    fn value(&self) -> Option<u32> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl FunctionExtents {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the extents of one source file
    pub fn insert(&mut self, path: impl Into<String>, extents: Vec<FunctionExtent>) {
        let path = path.into();
        match self.files.binary_search_by(|(p, _)| p.as_str().cmp(&path)) {
            Ok(idx) => self.files[idx].1 = extents,
            Err(idx) => self.files.insert(idx, (path, extents)),
        }
    }

    /// Number of source files in the table
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Parse the `line2function.json` table
    pub fn from_json(path: &Path, content: &str) -> FaultlineResult<Self> {
        let raw: HashMap<String, Vec<(String, LineNumber, LineNumber)>> =
            serde_json::from_str(content)
                .map_err(|e| FaultlineError::parse(path, e.line(), e.to_string()))?;

        let mut table = Self::new();
        for (file, entries) in raw {
            let mut extents = Vec::with_capacity(entries.len());
            for (name, start, end) in entries {
                let (Some(start), Some(end)) = (start.value(), end.value()) else {
                    return Err(FaultlineError::parse(
                        path,
                        0,
                        format!("non-numeric extent for function '{name}' in {file}"),
                    ));
                };
                extents.push(FunctionExtent { name, start, end });
            }
            table.insert(file, extents);
        }
        Ok(table)
    }

    /// Load the extent table from disk
    pub fn load(path: &Path) -> FaultlineResult<Self> {
        if !path.exists() {
            return Err(FaultlineError::missing(path));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json(path, &content)
    }

    /// Resolve the enclosing function of `line` in the file named by `path`
    ///
    /// An entry applies when its last path component equals the file name
    /// of `path`; the first containing extent wins.
    #[must_use]
    pub fn function_at(&self, path: &str, line: u32) -> Option<&str> {
        let file = file_name_of(path);
        self.files
            .iter()
            .filter(|(p, _)| file_name_of(p) == file)
            .flat_map(|(_, extents)| extents.iter())
            .find(|extent| extent.contains(line))
            .map(|extent| extent.name.as_str())
    }

    /// Build the canonical key of `line` in `path`
    #[must_use]
    pub fn key_for(&self, path: &str, line: u32) -> LineKey {
        let function = self.function_at(path, line).unwrap_or(FUNCTION_NOT_FOUND);
        LineKey::new(path, function, line)
    }
}
