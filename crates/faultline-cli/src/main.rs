//! Faultline CLI: fault-localization datasets from mutation and coverage results
//!
//! ## Usage
//!
//! ```bash
//! faultline run corpus/ -j 8                  # coverage, MBFL and SBFL for every version
//! faultline rank corpus/ --family mbfl        # function-level accuracy@5/10
//! faultline validate corpus/                  # check artifacts before ranking
//! ```

use clap::Parser;
use faultline::FaultlineConfig;
use faultline_cli::{
    handlers::{
        execute_coverage, execute_mbfl, execute_rank, execute_run, execute_sbfl,
        execute_select_mutants, execute_stats, execute_validate,
    },
    logging::init_logging,
    Cli, CliConfig, CliError, CliResult, ColorChoice, Commands, Verbosity,
};
use std::process::ExitCode;
use tracing::debug;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli)?;
    init_logging(&config);
    debug!(version = env!("CARGO_PKG_VERSION"), "faultline starting");

    match cli.command {
        Commands::Coverage(args) => execute_coverage(&config, &args),
        Commands::SelectMutants(args) => execute_select_mutants(&config, &args),
        Commands::Mbfl(args) => execute_mbfl(&config, &args),
        Commands::Sbfl(args) => execute_sbfl(&config, &args),
        Commands::Run(args) => execute_run(&config, &args).map(|_| ()),
        Commands::Rank(args) => execute_rank(&config, &args).map(|_| ()),
        Commands::Stats(args) => execute_stats(&config, &args).map(|_| ()),
        Commands::Validate(args) => execute_validate(&config, &args),
    }
}

fn build_config(cli: &Cli) -> CliResult<CliConfig> {
    let dataset = match &cli.config {
        Some(path) => FaultlineConfig::load(path)
            .map_err(|e| CliError::config(format!("{}: {e}", path.display())))?,
        None => FaultlineConfig::default(),
    };
    let color: ColorChoice = cli.color.clone().into();

    Ok(CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(color)
        .with_log_json(cli.log_json)
        .with_dataset(dataset))
}
