//! Corpus pipeline handler

use super::{reporter, require_dir};
use crate::commands::RunArgs;
use crate::config::CliConfig;
use crate::error::CliResult;
use faultline::{run_corpus, Corpus, CorpusRun, SkippedVersion, Stage};
use std::time::Instant;

/// Execute the run command
pub fn execute_run(config: &CliConfig, args: &RunArgs) -> CliResult<CorpusRun> {
    require_dir(&args.corpus)?;
    let dataset = config.dataset_with(args.max_mutants, args.jobs);
    let stages: Vec<Stage> = args.stages.iter().copied().map(Stage::from).collect();
    let corpus = Corpus::open(&args.corpus)?;

    let mut out = reporter(config);
    out.header(&format!(
        "Running {} on {} versions ({} workers)",
        stages.iter().map(ToString::to_string).collect::<Vec<_>>().join(","),
        corpus.len(),
        dataset.effective_jobs()
    ));
    out.start_progress(corpus.len() as u64, "versions");
    let bar = out.progress_bar();

    let started = Instant::now();
    let run = run_corpus(&corpus, &dataset, &stages, |version, _| {
        if let Some(pb) = &bar {
            pb.set_message(version.to_string());
            pb.inc(1);
        }
    })?;
    out.finish();

    for skip in &run.skipped {
        out.warning(&format!("{}: {}", skip.version, skip.reason));
    }
    if let Some(path) = &args.skipped {
        SkippedVersion::to_table(&run.skipped).write(path)?;
    }
    out.summary(run.completed.len(), run.skipped.len(), started.elapsed());
    Ok(run)
}
