//! Corpus validation handler

use super::{reporter, require_dir};
use crate::commands::CorpusArgs;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use faultline::{validate_corpus, Corpus};

/// Execute the validate command; any invalid version is an error
pub fn execute_validate(config: &CliConfig, args: &CorpusArgs) -> CliResult<()> {
    require_dir(&args.corpus)?;
    let dataset = config.dataset_with(None, args.jobs);
    let corpus = Corpus::open(&args.corpus)?;
    let reports = validate_corpus(&corpus, &dataset)?;

    let out = reporter(config);
    let mut invalid = 0;
    for report in &reports {
        match &report.problem {
            None => out.success(&report.version),
            Some(reason) => {
                invalid += 1;
                out.failure(&format!("{}: {reason}", report.version));
            }
        }
    }

    if invalid > 0 {
        return Err(CliError::Validation {
            invalid,
            total: reports.len(),
        });
    }
    out.info(&format!("all {} versions are valid", reports.len()));
    Ok(())
}
