//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use faultline::{FormulaFamily, Stage};
use std::path::PathBuf;

/// Faultline: build MBFL and SBFL fault-localization datasets for buggy C programs
#[derive(Parser, Debug)]
#[command(name = "faultline")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Dataset configuration file (.json, .yaml or .yml)
    #[arg(long, global = true, env = "FAULTLINE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Postprocess raw coverage of one buggy version
    Coverage(VersionArgs),

    /// Select mutants on lines executed by failing tests
    SelectMutants(MutantArgs),

    /// Compute MBFL features of one buggy version
    Mbfl(MutantArgs),

    /// Compute SBFL features of one buggy version
    Sbfl(VersionArgs),

    /// Run the pipeline on every version of a corpus
    Run(RunArgs),

    /// Rank buggy functions across a corpus and report accuracy@5/10
    Rank(RankArgs),

    /// Summarize coverage counters across a corpus
    Stats(StatsArgs),

    /// Check that every version is ready for ranking
    Validate(CorpusArgs),
}

/// Arguments naming one buggy version
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Buggy version directory
    #[arg(id = "version_dir", value_name = "VERSION")]
    pub version: PathBuf,
}

/// Arguments of commands that read mutation outcomes
#[derive(Args, Debug)]
pub struct MutantArgs {
    /// Buggy version directory
    #[arg(id = "version_dir", value_name = "VERSION")]
    pub version: PathBuf,

    /// Mutants per line (overrides the configuration)
    #[arg(short, long)]
    pub max_mutants: Option<usize>,
}

/// Arguments naming a corpus
#[derive(Args, Debug)]
pub struct CorpusArgs {
    /// Corpus directory (one subdirectory per buggy version)
    pub corpus: PathBuf,

    /// Worker threads (0 = one per core)
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Corpus directory (one subdirectory per buggy version)
    pub corpus: PathBuf,

    /// Worker threads (0 = one per core)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Stages to run
    #[arg(long, value_delimiter = ',', default_value = "coverage,mbfl,sbfl")]
    pub stages: Vec<StageArg>,

    /// Mutants per line (overrides the configuration)
    #[arg(short, long)]
    pub max_mutants: Option<usize>,

    /// Write skipped versions to this CSV file
    #[arg(long)]
    pub skipped: Option<PathBuf>,
}

/// Arguments for the rank command
#[derive(Args, Debug)]
pub struct RankArgs {
    /// Corpus directory (one subdirectory per buggy version)
    pub corpus: PathBuf,

    /// Formula family to rank with
    #[arg(long)]
    pub family: FamilyArg,

    /// Summary CSV (default: <corpus>/<family>_rank_summary.csv)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Worker threads (0 = one per core)
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

impl RankArgs {
    /// Summary path, defaulting inside the corpus
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            self.corpus
                .join(format!("{}_rank_summary.csv", FormulaFamily::from(self.family)))
        })
    }
}

/// Arguments for the stats command
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Corpus directory (one subdirectory per buggy version)
    pub corpus: PathBuf,

    /// Statistics CSV (default: <corpus>/statistics_summary.csv)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl StatsArgs {
    /// Statistics path, defaulting inside the corpus
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.corpus.join("statistics_summary.csv"))
    }
}

/// Pipeline stage argument
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageArg {
    /// Coverage postprocessing
    Coverage,
    /// MBFL features
    Mbfl,
    /// SBFL features
    Sbfl,
}

impl From<StageArg> for Stage {
    fn from(arg: StageArg) -> Self {
        match arg {
            StageArg::Coverage => Self::Coverage,
            StageArg::Mbfl => Self::Mbfl,
            StageArg::Sbfl => Self::Sbfl,
        }
    }
}

/// Formula family argument
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FamilyArg {
    /// Metallaxis and MUSE
    Mbfl,
    /// Spectrum-based formulas
    Sbfl,
}

impl From<FamilyArg> for FormulaFamily {
    fn from(arg: FamilyArg) -> Self {
        match arg {
            FamilyArg::Mbfl => Self::Mbfl,
            FamilyArg::Sbfl => Self::Sbfl,
        }
    }
}

/// Color output argument
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
