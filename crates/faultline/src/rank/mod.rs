//! Function-Level Ranking & Accuracy Evaluator
//!
//! Collapses a version's per-line scores to one score per function, ranks
//! functions with the conservative "max" tie-break and reports where the
//! ground-truth function lands. Across a corpus this yields accuracy@5 and
//! accuracy@10 per formula, for MBFL and SBFL separately.

mod function;
mod scores;
mod summary;

pub use function::{max_ranks, rank_functions, FunctionRank};
pub use scores::ScoreTable;
pub use summary::{
    rank_corpus, rank_version, Accuracy, FormulaFamily, RankSummary, ScoreColumn, VersionRanking,
};
