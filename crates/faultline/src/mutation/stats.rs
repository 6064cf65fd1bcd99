//! Mutant counts reported beside MBFL rankings.

use crate::key::LineKey;
use crate::mutation::outcome::MutationResults;

/// Mutant counts of one buggy version
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutantStatistics {
    /// Tested mutants, built or not
    pub mutants: usize,
    /// Mutants that failed to build
    pub uncompilable: usize,
    /// Mutants on the buggy line
    pub on_buggy_line: usize,
    /// Mutants on the buggy line that failed to build
    pub uncompilable_on_buggy_line: usize,
    /// Mutants on the buggy line that built
    pub compilable_on_buggy_line: usize,
    /// Sum of `p2f` over built mutants
    pub total_p2f: u64,
    /// Sum of `f2p` over built mutants
    pub total_f2p: u64,
}

impl MutantStatistics {
    /// Count the outcome log against the buggy line
    #[must_use]
    pub fn collect(results: &MutationResults, buggy: &LineKey) -> Self {
        let buggy_line = buggy.source_line();
        let mut stats = Self::default();

        for outcome in results.outcomes() {
            stats.mutants += 1;
            let on_buggy = outcome.source_line() == buggy_line;
            if on_buggy {
                stats.on_buggy_line += 1;
            }
            match outcome.counts {
                Some(counts) => {
                    stats.total_p2f += counts.p2f;
                    stats.total_f2p += counts.f2p;
                    if on_buggy {
                        stats.compilable_on_buggy_line += 1;
                    }
                }
                None => {
                    stats.uncompilable += 1;
                    if on_buggy {
                        stats.uncompilable_on_buggy_line += 1;
                    }
                }
            }
        }
        stats
    }
}
