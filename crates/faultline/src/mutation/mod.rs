//! Mutation Outcome Aggregator
//!
//! Reads the per-mutant outcome log of a buggy version and groups built
//! mutants by source line into fixed-width slot vectors, plus the corpus
//! flip totals MUSE needs. Mutant selection and mutant statistics live here
//! as well since they read the same engine artifacts.

mod aggregate;
mod outcome;
mod select;
mod stats;

pub use aggregate::{aggregate, AggregatedOutcomes, FlipTotals, MutantSlot, SlotVector};
pub use outcome::{BuildResult, FlipCounts, MutationOutcome, MutationResults};
pub use select::{
    select_mutants, selected_mutants_csv, write_selected_mutants, MutantDb, MutantRecord,
    SelectedMutant, TokenSpan,
};
pub use stats::MutantStatistics;
