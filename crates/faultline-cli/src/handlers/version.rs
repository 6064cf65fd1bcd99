//! Single-version stage handlers

use super::{reporter, require_dir};
use crate::commands::{MutantArgs, VersionArgs};
use crate::config::CliConfig;
use crate::error::CliResult;
use faultline::{run_coverage, run_mbfl, run_sbfl, run_select_mutants, VersionDir};

/// Execute the coverage command
pub fn execute_coverage(config: &CliConfig, args: &VersionArgs) -> CliResult<()> {
    require_dir(&args.version)?;
    let dir = VersionDir::new(&args.version, &config.dataset.layout);
    let stage = run_coverage(&dir)?;
    reporter(config).success(&format!(
        "{}: buggy line {}, {} lines, {} failing / {} passing test cases",
        dir.name(),
        stage.buggy,
        stage.coverage.matrix.rows().len(),
        stage.partition.failing().len(),
        stage.partition.passing().len()
    ));
    Ok(())
}

/// Execute the select-mutants command
pub fn execute_select_mutants(config: &CliConfig, args: &MutantArgs) -> CliResult<()> {
    require_dir(&args.version)?;
    let dataset = config.dataset_with(args.max_mutants, None);
    dataset.validate()?;
    let dir = VersionDir::new(&args.version, &dataset.layout);
    let selected = run_select_mutants(&dir, &dataset)?;
    reporter(config).success(&format!(
        "{}: {} mutants selected (at most {} per line)",
        dir.name(),
        selected.len(),
        dataset.max_mutants
    ));
    Ok(())
}

/// Execute the mbfl command
pub fn execute_mbfl(config: &CliConfig, args: &MutantArgs) -> CliResult<()> {
    require_dir(&args.version)?;
    let dataset = config.dataset_with(args.max_mutants, None);
    dataset.validate()?;
    let dir = VersionDir::new(&args.version, &dataset.layout);
    let features = run_mbfl(&dir, &dataset, None)?;
    let out = reporter(config);
    out.success(&format!("{}: {} lines scored", dir.name(), features.records().len()));
    if let Some(bug) = features.buggy_record() {
        out.info(&format!(
            "buggy line {}: met {:.4}, muse {:.4}",
            bug.key, bug.metallaxis, bug.muse.score
        ));
    }
    Ok(())
}

/// Execute the sbfl command
pub fn execute_sbfl(config: &CliConfig, args: &VersionArgs) -> CliResult<()> {
    require_dir(&args.version)?;
    let dir = VersionDir::new(&args.version, &config.dataset.layout);
    let features = run_sbfl(&dir, None)?;
    reporter(config).success(&format!("{}: {} lines scored", dir.name(), features.records().len()));
    Ok(())
}
