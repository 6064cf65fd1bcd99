//! Corpus statistics handler

use super::{reporter, require_dir};
use crate::commands::StatsArgs;
use crate::config::CliConfig;
use crate::error::CliResult;
use faultline::{collect_statistics, Corpus, CorpusStatistics};

/// Execute the stats command
pub fn execute_stats(config: &CliConfig, args: &StatsArgs) -> CliResult<CorpusStatistics> {
    require_dir(&args.corpus)?;
    let corpus = Corpus::open(&args.corpus)?;
    let stats = collect_statistics(&corpus, &config.dataset)?;

    let out = reporter(config);
    for skip in &stats.skipped {
        out.warning(&format!("{}: {}", skip.version, skip.reason));
    }
    let path = args.output_path();
    stats.to_table().write(&path)?;
    out.info(&format!("statistics written to {}", path.display()));

    for line in stats.report() {
        println!("{line}");
    }
    Ok(stats)
}
