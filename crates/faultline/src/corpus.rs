//! Corpus-wide map over buggy versions.
//!
//! Versions share no state, so every corpus operation is a parallel map on a
//! rayon pool sized by the configured job count. Results come back in
//! version-name order. A failing version becomes a [`SkippedVersion`] and
//! never aborts the rest of the corpus.

use crate::config::FaultlineConfig;
use crate::pipeline::{run_version, Stage, VersionDir, VersionReport};
use crate::result::{FaultlineError, FaultlineResult};
use crate::table::Table;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A version excluded from a corpus operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedVersion {
    /// Version name
    pub version: String,
    /// Why it was skipped
    pub reason: String,
}

impl SkippedVersion {
    /// Render a skip list as `version,reason`
    #[must_use]
    pub fn to_table(skipped: &[Self]) -> Table {
        let mut table = Table::new(["version", "reason"]);
        for s in skipped {
            let _ = table.push([s.version.clone(), s.reason.clone()]);
        }
        table
    }
}

/// A directory whose subdirectories are buggy versions
#[derive(Debug, Clone)]
pub struct Corpus {
    root: PathBuf,
    versions: Vec<PathBuf>,
}

impl Corpus {
    /// List the versions of `root`, sorted by name
    pub fn open(root: &Path) -> FaultlineResult<Self> {
        if !root.is_dir() {
            return Err(FaultlineError::missing(root));
        }
        let mut versions = Vec::new();
        for entry in std::fs::read_dir(root)? {
            let path = entry?.path();
            if path.is_dir() {
                versions.push(path);
            }
        }
        versions.sort();
        Ok(Self {
            root: root.to_path_buf(),
            versions,
        })
    }

    /// Corpus directory
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Version directories in name order
    #[must_use]
    pub fn versions(&self) -> &[PathBuf] {
        &self.versions
    }

    /// Number of versions
    #[must_use]
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Whether the corpus has no versions
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Apply `f` to every version on `jobs` workers, keeping name order
    pub fn map<T, F>(&self, jobs: usize, f: F) -> FaultlineResult<Vec<(String, FaultlineResult<T>)>>
    where
        T: Send,
        F: Fn(&Path) -> FaultlineResult<T> + Sync,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .map_err(|e| FaultlineError::config(format!("cannot start worker pool: {e}")))?;

        Ok(pool.install(|| {
            self.versions
                .par_iter()
                .map(|path| {
                    let name = path
                        .file_name()
                        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
                    (name, f(path))
                })
                .collect()
        }))
    }
}

/// Outcome of a chained corpus run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorpusRun {
    /// Versions whose stages all succeeded
    pub completed: Vec<VersionReport>,
    /// Versions that failed, with the reason
    pub skipped: Vec<SkippedVersion>,
}

/// Split per-version results into successes and skips, logging each skip
pub fn partition_results<T>(results: Vec<(String, FaultlineResult<T>)>) -> (Vec<T>, Vec<SkippedVersion>) {
    let mut done = Vec::new();
    let mut skipped = Vec::new();
    for (version, result) in results {
        match result {
            Ok(value) => done.push(value),
            Err(e) => {
                warn!(version = %version, reason = %e, "version skipped");
                skipped.push(SkippedVersion {
                    version,
                    reason: e.to_string(),
                });
            }
        }
    }
    (done, skipped)
}

/// Run the chained pipeline on every version of a corpus
///
/// `on_version` is called once per finished version with its name and
/// whether it completed.
pub fn run_corpus<P>(
    corpus: &Corpus,
    config: &FaultlineConfig,
    stages: &[Stage],
    on_version: P,
) -> FaultlineResult<CorpusRun>
where
    P: Fn(&str, bool) + Sync,
{
    config.validate()?;
    let results = corpus.map(config.effective_jobs(), |path| {
        let dir = VersionDir::new(path, &config.layout);
        let result = run_version(&dir, config, stages);
        on_version(&dir.name(), result.is_ok());
        result
    })?;

    let (completed, skipped) = partition_results(results);
    info!(
        completed = completed.len(),
        skipped = skipped.len(),
        "corpus run finished"
    );
    Ok(CorpusRun { completed, skipped })
}
