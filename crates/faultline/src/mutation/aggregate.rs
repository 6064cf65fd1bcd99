//! Groups built mutant outcomes by source line into fixed-width slot vectors.

use crate::key::SourceLine;
use crate::mutation::outcome::MutationResults;
use crate::result::{ensure_consistent, FaultlineError, FaultlineResult};
use std::collections::BTreeMap;
use tracing::debug;

/// Flip evidence of one built mutant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutantSlot {
    /// Originally-passing tests that now fail
    pub p2f: u64,
    /// Originally-failing tests that now pass
    pub f2p: u64,
}

/// `max_mutants` slots of one line, in outcome-log order
///
/// `None` marks a slot no built mutant occupies. Absent slots are excluded
/// from every sum and count and serialize as `-1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotVector {
    slots: Vec<Option<MutantSlot>>,
}

impl SlotVector {
    /// A vector of `width` absent slots
    #[must_use]
    pub fn absent(width: usize) -> Self {
        Self {
            slots: vec![None; width],
        }
    }

    /// Pad `built` to `width` slots; more than `width` mutants is an error
    pub fn padded(built: Vec<MutantSlot>, width: usize) -> FaultlineResult<Self> {
        if built.len() > width {
            return Err(FaultlineError::consistency(format!(
                "{} built mutants exceed max_mutants = {width}",
                built.len()
            )));
        }
        let mut slots: Vec<Option<MutantSlot>> = built.into_iter().map(Some).collect();
        slots.resize(width, None);
        Ok(Self { slots })
    }

    /// All slots, occupied or not
    #[must_use]
    pub fn slots(&self) -> &[Option<MutantSlot>] {
        &self.slots
    }

    /// Number of slots
    #[must_use]
    pub fn width(&self) -> usize {
        self.slots.len()
    }

    /// Occupied slots
    pub fn built(&self) -> impl Iterator<Item = &MutantSlot> {
        self.slots.iter().flatten()
    }

    /// Number of occupied slots
    #[must_use]
    pub fn built_count(&self) -> usize {
        self.built().count()
    }

    /// Sum of `f2p` over occupied slots
    #[must_use]
    pub fn line_total_f2p(&self) -> u64 {
        self.built().map(|s| s.f2p).sum()
    }

    /// Sum of `p2f` over occupied slots
    #[must_use]
    pub fn line_total_p2f(&self) -> u64 {
        self.built().map(|s| s.p2f).sum()
    }
}

/// Flip totals over every built mutant of a buggy version
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlipTotals {
    /// Sum of `p2f`
    pub total_p2f: u64,
    /// Sum of `f2p`
    pub total_f2p: u64,
}

/// Per-line slot vectors plus corpus totals of one buggy version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedOutcomes {
    max_mutants: usize,
    lines: BTreeMap<SourceLine, SlotVector>,
    totals: FlipTotals,
}

impl AggregatedOutcomes {
    /// Slot width
    #[must_use]
    pub const fn max_mutants(&self) -> usize {
        self.max_mutants
    }

    /// Corpus-wide flip totals
    #[must_use]
    pub const fn totals(&self) -> FlipTotals {
        self.totals
    }

    /// Slot vector of a line with at least one built mutant
    #[must_use]
    pub fn get(&self, line: &SourceLine) -> Option<&SlotVector> {
        self.lines.get(line)
    }

    /// Slot vector of any line; lines without built mutants are all absent
    #[must_use]
    pub fn slots_for(&self, line: &SourceLine) -> SlotVector {
        self.lines
            .get(line)
            .cloned()
            .unwrap_or_else(|| SlotVector::absent(self.max_mutants))
    }

    /// Lines with at least one built mutant, in `(file, line)` order
    pub fn lines(&self) -> impl Iterator<Item = (&SourceLine, &SlotVector)> {
        self.lines.iter()
    }

    /// Number of lines with at least one built mutant
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether no mutant built
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Aggregate a version's outcome log
///
/// Failed builds are dropped here; [`MutantStatistics`](super::MutantStatistics)
/// still counts them.
pub fn aggregate(results: &MutationResults, max_mutants: usize) -> FaultlineResult<AggregatedOutcomes> {
    let mut grouped: BTreeMap<SourceLine, Vec<MutantSlot>> = BTreeMap::new();
    let mut totals = FlipTotals::default();

    for outcome in results.outcomes() {
        let Some(counts) = outcome.counts else {
            continue;
        };
        totals.total_p2f += counts.p2f;
        totals.total_f2p += counts.f2p;
        grouped.entry(outcome.source_line()).or_default().push(MutantSlot {
            p2f: counts.p2f,
            f2p: counts.f2p,
        });
    }

    let mut lines = BTreeMap::new();
    for (line, built) in grouped {
        ensure_consistent!(
            built.len() <= max_mutants,
            "{}:{} has {} built mutants, more than max_mutants = {max_mutants}",
            line.file,
            line.line,
            built.len()
        );
        let vector = SlotVector::padded(built, max_mutants)?;
        lines.insert(line, vector);
    }

    debug!(
        lines = lines.len(),
        total_p2f = totals.total_p2f,
        total_f2p = totals.total_f2p,
        "mutation outcomes aggregated"
    );

    Ok(AggregatedOutcomes {
        max_mutants,
        lines,
        totals,
    })
}
