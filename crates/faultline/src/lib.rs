//! Faultline: fault-localization datasets from mutation and coverage evidence
//!
//! Faultline turns the materialized results of a mutation-testing and
//! coverage engine into per-line suspiciousness features and function-level
//! rankings for a corpus of buggy C program versions.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                      one buggy version                            │
//! ├───────────────────────────────────────────────────────────────────┤
//! │  raw coverage ──► coverage ──► postprocessed matrix ──┬──► sbfl   │
//! │                                                       │           │
//! │  mutation results ──► mutation::aggregate ────────────┴──► mbfl   │
//! │                                                                   │
//! │  mbfl/sbfl feature tables ──► rank (function level, "max" ties)   │
//! └───────────────────────────────────────────────────────────────────┘
//!            corpus: versions processed in parallel, skips recorded
//! ```
//!
//! # Example
//!
//! ```no_run
//! use faultline::{run_corpus, Corpus, FaultlineConfig, Stage};
//! use std::path::Path;
//!
//! let config = FaultlineConfig::default().with_max_mutants(5);
//! let corpus = Corpus::open(Path::new("corpus"))?;
//! let run = run_corpus(&corpus, &config, &Stage::ALL, |_, _| {})?;
//! println!("{} versions done, {} skipped", run.completed.len(), run.skipped.len());
//! # Ok::<(), faultline::FaultlineError>(())
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod corpus;
pub mod coverage;
pub mod key;
pub mod mbfl;
pub mod mutation;
pub mod pipeline;
pub mod rank;
mod result;
pub mod sbfl;
pub mod statistics;
pub mod table;
pub mod testsuite;
pub mod validate;

#[cfg(test)]
mod testing;

pub use config::{FaultlineConfig, VersionLayout, DEFAULT_MAX_MUTANTS};
pub use corpus::{run_corpus, Corpus, CorpusRun, SkippedVersion};
pub use key::{FunctionExtents, LineKey, SourceLine};
pub use pipeline::{run_coverage, run_mbfl, run_sbfl, run_select_mutants, run_version, Stage, VersionDir};
pub use rank::{rank_corpus, FormulaFamily, FunctionRank, RankSummary};
pub use result::{FaultlineError, FaultlineResult};
pub use statistics::{collect_statistics, CorpusStatistics};
pub use testsuite::{BugInfo, TestCase, TestPartition};
pub use validate::{validate_corpus, ValidationReport};
