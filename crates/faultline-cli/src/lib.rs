//! Faultline CLI Library
//!
//! Command-line front end of the Faultline dataset engine: single-version
//! stages, parallel corpus runs, ranking, statistics and validation.

#![warn(missing_docs)]

mod commands;
mod config;
mod error;
pub mod handlers;
pub mod logging;
mod output;

pub use commands::{
    Cli, ColorArg, Commands, CorpusArgs, FamilyArg, MutantArgs, RankArgs, RunArgs, StageArg,
    StatsArgs, VersionArgs,
};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::ProgressReporter;
