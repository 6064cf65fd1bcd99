//! Command handlers
//!
//! Each handler turns parsed arguments into one library call and reports
//! the outcome on the terminal.

pub mod rank;
pub mod run;
pub mod stats;
pub mod validate;
pub mod version;

#[cfg(test)]
mod fixture;

pub use rank::execute_rank;
pub use run::execute_run;
pub use stats::execute_stats;
pub use validate::execute_validate;
pub use version::{execute_coverage, execute_mbfl, execute_sbfl, execute_select_mutants};

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use std::path::Path;

/// Reporter honoring the configured color and verbosity
pub(crate) fn reporter(config: &CliConfig) -> ProgressReporter {
    ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet())
}

/// Fail early when a version or corpus argument is not a directory
pub(crate) fn require_dir(path: &Path) -> CliResult<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(CliError::invalid_argument(format!(
            "{} is not a directory",
            path.display()
        )))
    }
}
