//! Corpus ranking handler

use super::{reporter, require_dir};
use crate::commands::RankArgs;
use crate::config::CliConfig;
use crate::error::CliResult;
use faultline::{rank_corpus, Corpus, FormulaFamily, RankSummary};
use std::time::Instant;

/// Execute the rank command
///
/// Writes the summary and its skip list, then prints accuracy@5 and
/// accuracy@10 per formula on stdout.
pub fn execute_rank(config: &CliConfig, args: &RankArgs) -> CliResult<RankSummary> {
    require_dir(&args.corpus)?;
    let family = FormulaFamily::from(args.family);
    let dataset = config.dataset_with(None, args.jobs);
    let corpus = Corpus::open(&args.corpus)?;

    let out = reporter(config);
    let started = Instant::now();
    let summary = rank_corpus(&corpus, family, &dataset)?;
    for skip in &summary.skipped {
        out.warning(&format!("{}: {}", skip.version, skip.reason));
    }

    let path = args.output_path();
    summary.write(&path)?;
    out.info(&format!("rank summary written to {}", path.display()));

    for line in summary.accuracy_report() {
        println!("{line}");
    }
    out.summary(summary.rows.len(), summary.skipped.len(), started.elapsed());
    Ok(summary)
}
