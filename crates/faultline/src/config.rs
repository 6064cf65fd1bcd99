//! Dataset configuration and per-version artifact layout.

use crate::result::{FaultlineError, FaultlineResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default mutants kept per line
pub const DEFAULT_MAX_MUTANTS: usize = 5;

/// File names of every artifact inside a buggy version directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionLayout {
    /// Ground truth (`bug_info.csv`)
    pub bug_info: String,
    /// Failing test list
    pub failing_tcs: String,
    /// Passing test list
    pub passing_tcs: String,
    /// Coincidentally-correct test list (optional)
    pub cc_tcs: String,
    /// Excluded test list (optional)
    pub excluded_tcs: String,
    /// Function extent table
    pub line2function: String,
    /// Directory of `<TC>.raw.json` reports
    pub raw_coverage_dir: String,
    /// Mutation outcome log
    pub mutation_results: String,
    /// Directory of `<stem>_mut_db.csv` databases
    pub mutant_db_dir: String,
    /// Canonical buggy key output
    pub buggy_line_key: String,
    /// Coverage counters output
    pub coverage_summary: String,
    /// Postprocessed coverage matrix output
    pub postprocessed_coverage: String,
    /// Lines executed by failing tests output
    pub lines_executed_by_failing: String,
    /// Lines executed by passing tests output
    pub lines_executed_by_passing: String,
    /// Selected mutants output
    pub selected_mutants: String,
    /// MBFL feature table output
    pub mbfl_features: String,
    /// SBFL feature table output
    pub sbfl_features: String,
}

impl Default for VersionLayout {
    fn default() -> Self {
        Self {
            bug_info: "bug_info.csv".into(),
            failing_tcs: "testsuite_info/failing_tcs.txt".into(),
            passing_tcs: "testsuite_info/passing_tcs.txt".into(),
            cc_tcs: "testsuite_info/ccts.txt".into(),
            excluded_tcs: "testsuite_info/excluded_tcs.txt".into(),
            line2function: "line2function_info/line2function.json".into(),
            raw_coverage_dir: "coverage".into(),
            mutation_results: "mutation_testing_results.csv".into(),
            mutant_db_dir: "generated_mutants".into(),
            buggy_line_key: "buggy_line_key.txt".into(),
            coverage_summary: "coverage_summary.csv".into(),
            postprocessed_coverage: "coverage_info/postprocessed_coverage.csv".into(),
            lines_executed_by_failing: "coverage_info/lines_executed_by_failing_tc.json".into(),
            lines_executed_by_passing: "coverage_info/lines_executed_by_passing_tc.json".into(),
            selected_mutants: "selected_mutants.csv".into(),
            mbfl_features: "mbfl_features.csv".into(),
            sbfl_features: "sbfl_features.csv".into(),
        }
    }
}

impl VersionLayout {
    /// Database path of a target file (`generated_mutants/parser_mut_db.csv`)
    #[must_use]
    pub fn mutant_db(&self, target_file: &str) -> String {
        let name = crate::key::file_name_of(target_file);
        let stem = name.split('.').next().unwrap_or(name);
        format!("{}/{stem}_mut_db.csv", self.mutant_db_dir)
    }
}

/// Dataset-building configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaultlineConfig {
    /// Mutants kept per line and MBFL slot width
    pub max_mutants: usize,
    /// Target source files; empty means every file failing tests execute
    pub target_files: Vec<String>,
    /// Worker threads for corpus runs (0 = one per core)
    pub jobs: usize,
    /// Artifact names
    pub layout: VersionLayout,
}

impl Default for FaultlineConfig {
    fn default() -> Self {
        Self {
            max_mutants: DEFAULT_MAX_MUTANTS,
            target_files: Vec::new(),
            jobs: 0,
            layout: VersionLayout::default(),
        }
    }
}

impl FaultlineConfig {
    /// Create the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the mutants-per-line cap
    #[must_use]
    pub const fn with_max_mutants(mut self, max_mutants: usize) -> Self {
        self.max_mutants = max_mutants;
        self
    }

    /// Set the worker count
    #[must_use]
    pub const fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Set the target files
    #[must_use]
    pub fn with_target_files(mut self, files: Vec<String>) -> Self {
        self.target_files = files;
        self
    }

    /// Set the artifact layout
    #[must_use]
    pub fn with_layout(mut self, layout: VersionLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Worker count with `0` resolved to the available cores
    #[must_use]
    pub fn effective_jobs(&self) -> usize {
        if self.jobs == 0 {
            std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
        } else {
            self.jobs
        }
    }

    /// Reject unusable settings
    pub fn validate(&self) -> FaultlineResult<()> {
        if self.max_mutants == 0 {
            return Err(FaultlineError::config("max_mutants must be at least 1"));
        }
        Ok(())
    }

    /// Parse a JSON configuration
    pub fn from_json(content: &str) -> FaultlineResult<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML configuration
    pub fn from_yaml(content: &str) -> FaultlineResult<Self> {
        let config: Self = serde_yaml_ng::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load by extension: `.json`, `.yaml` or `.yml`
    pub fn load(path: &Path) -> FaultlineResult<Self> {
        if !path.exists() {
            return Err(FaultlineError::missing(path));
        }
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            Some("yaml" | "yml") => Self::from_yaml(&content),
            _ => Err(FaultlineError::config(format!(
                "unsupported configuration format: {}",
                path.display()
            ))),
        }
    }
}
