//! MBFL Suspiciousness Calculator
//!
//! Scores every coverage row with Metallaxis and MUSE from the line's slot
//! vector and the version's flip totals.
//!
//! Metallaxis takes the **maximum** single-mutant score at a line:
//!
//! ```text
//! score_i = f2p_i / sqrt(total_failing * (f2p_i + p2f_i))      (0 when f2p_i + p2f_i == 0)
//! met     = max_i score_i                                        (0 when no slot is occupied)
//! ```
//!
//! MUSE weighs the line's flips against the corpus totals with `+1`
//! smoothing:
//!
//! ```text
//! w1   = 1 / ((m + 1) * (total_f2p + 1))
//! w2   = 1 / ((m + 1) * (total_p2f + 1))
//! muse = w1 * line_f2p - w2 * line_p2f
//! ```

use crate::key::LineKey;
use crate::mutation::{AggregatedOutcomes, FlipTotals, SlotVector};
use crate::result::{ensure_consistent, FaultlineResult};
use crate::table::{format_score, Table};
use tracing::{debug, info};

/// Score column of Metallaxis
pub const MET_SCORE: &str = "met susp. score";
/// Score column of MUSE
pub const MUSE_SCORE: &str = "muse susp. score";

/// Metallaxis score of a slot vector
#[must_use]
pub fn metallaxis(slots: &SlotVector, total_failing: usize) -> f64 {
    slots
        .built()
        .map(|slot| {
            let flips = slot.f2p + slot.p2f;
            if flips == 0 {
                0.0
            } else {
                slot.f2p as f64 / (total_failing as f64 * flips as f64).sqrt()
            }
        })
        .fold(None, |best: Option<f64>, s| Some(best.map_or(s, |b| b.max(s))))
        .unwrap_or(0.0)
}

/// MUSE score and the aggregates it was computed from
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MuseTerms {
    /// Occupied slots (`|muse(s)|`)
    pub mutants: usize,
    /// Corpus `f2p` total
    pub total_f2p: u64,
    /// Corpus `p2f` total
    pub total_p2f: u64,
    /// Line `f2p` sum
    pub line_total_f2p: u64,
    /// Line `p2f` sum
    pub line_total_p2f: u64,
    /// `w1`
    pub muse_1: f64,
    /// `w2`
    pub muse_2: f64,
    /// `w1 * line_total_f2p`
    pub muse_3: f64,
    /// `w2 * line_total_p2f`
    pub muse_4: f64,
    /// `muse_3 - muse_4`
    pub score: f64,
}

impl MuseTerms {
    /// Evaluate MUSE for one line
    #[must_use]
    pub fn compute(slots: &SlotVector, totals: FlipTotals) -> Self {
        let mutants = slots.built_count();
        let line_total_f2p = slots.line_total_f2p();
        let line_total_p2f = slots.line_total_p2f();

        let m1 = (mutants + 1) as f64;
        let muse_1 = 1.0 / (m1 * (totals.total_f2p + 1) as f64);
        let muse_2 = 1.0 / (m1 * (totals.total_p2f + 1) as f64);
        let muse_3 = muse_1 * line_total_f2p as f64;
        let muse_4 = muse_2 * line_total_p2f as f64;

        Self {
            mutants,
            total_f2p: totals.total_f2p,
            total_p2f: totals.total_p2f,
            line_total_f2p,
            line_total_p2f,
            muse_1,
            muse_2,
            muse_3,
            muse_4,
            score: muse_3 - muse_4,
        }
    }
}

/// MBFL features of one coverage row
#[derive(Debug, Clone, PartialEq)]
pub struct MbflRecord {
    /// Line identity
    pub key: LineKey,
    /// Number of failing test cases of the version
    pub total_failing: usize,
    /// Slot vector (all absent for lines without built mutants)
    pub slots: SlotVector,
    /// MUSE terms
    pub muse: MuseTerms,
    /// Metallaxis score
    pub metallaxis: f64,
    /// Ground-truth flag
    pub bug: bool,
}

impl MbflRecord {
    /// Record of a line no built mutant sits on
    #[must_use]
    pub fn without_mutants(key: LineKey, total_failing: usize, max_mutants: usize, bug: bool) -> Self {
        Self {
            key,
            total_failing,
            slots: SlotVector::absent(max_mutants),
            muse: MuseTerms::default(),
            metallaxis: 0.0,
            bug,
        }
    }

    fn fields(&self) -> Vec<String> {
        let m = &self.muse;
        let mut fields = vec![
            self.key.to_string(),
            self.total_failing.to_string(),
            self.slots.width().to_string(),
        ];
        for slot in self.slots.slots() {
            match slot {
                Some(s) => {
                    fields.push(s.f2p.to_string());
                    fields.push(s.p2f.to_string());
                }
                None => {
                    fields.push("-1".into());
                    fields.push("-1".into());
                }
            }
        }
        fields.extend([
            m.mutants.to_string(),
            m.total_f2p.to_string(),
            m.total_p2f.to_string(),
            m.line_total_f2p.to_string(),
            m.line_total_p2f.to_string(),
            format_score(m.muse_1),
            format_score(m.muse_2),
            format_score(m.muse_3),
            format_score(m.muse_4),
            format_score(m.score),
            format_score(self.metallaxis),
            u8::from(self.bug).to_string(),
        ]);
        fields
    }
}

/// MBFL feature table of one buggy version
#[derive(Debug, Clone, PartialEq)]
pub struct MbflFeatures {
    max_mutants: usize,
    records: Vec<MbflRecord>,
}

impl MbflFeatures {
    /// Column names for a given slot width
    #[must_use]
    pub fn header(max_mutants: usize) -> Vec<String> {
        let mut header = vec![
            "key".to_string(),
            "# of totfailed_TCs".to_string(),
            "# of mutants".to_string(),
        ];
        for i in 1..=max_mutants {
            header.push(format!("m{i}:f2p"));
            header.push(format!("m{i}:p2f"));
        }
        header.extend(
            [
                "|muse(s)|",
                "total_f2p",
                "total_p2f",
                "line_total_f2p",
                "line_total_p2f",
                "muse_1",
                "muse_2",
                "muse_3",
                "muse_4",
                MUSE_SCORE,
                MET_SCORE,
                "bug",
            ]
            .map(String::from),
        );
        header
    }

    /// Records in coverage row order
    #[must_use]
    pub fn records(&self) -> &[MbflRecord] {
        &self.records
    }

    /// Slot width
    #[must_use]
    pub const fn max_mutants(&self) -> usize {
        self.max_mutants
    }

    /// The ground-truth record
    #[must_use]
    pub fn buggy_record(&self) -> Option<&MbflRecord> {
        self.records.iter().find(|r| r.bug)
    }

    /// Render as `mbfl_features.csv`
    #[must_use]
    pub fn to_table(&self) -> Table {
        let mut table = Table::new(Self::header(self.max_mutants));
        for record in &self.records {
            let _ = table.push(record.fields());
        }
        table
    }
}

/// Score every coverage row of a version
///
/// `rows` is the coverage row order; `buggy` must be one of them.
pub fn compute_mbfl(
    rows: &[LineKey],
    buggy: &LineKey,
    total_failing: usize,
    outcomes: &AggregatedOutcomes,
) -> FaultlineResult<MbflFeatures> {
    ensure_consistent!(
        rows.contains(buggy),
        "buggy line {buggy} is not a coverage row"
    );
    ensure_consistent!(total_failing > 0, "buggy version has no failing test cases");

    let max_mutants = outcomes.max_mutants();
    let totals = outcomes.totals();
    let mut with_mutants = 0usize;

    let records: Vec<MbflRecord> = rows
        .iter()
        .map(|key| {
            let bug = key == buggy;
            match outcomes.get(&key.source_line()) {
                Some(slots) => {
                    with_mutants += 1;
                    MbflRecord {
                        key: key.clone(),
                        total_failing,
                        slots: slots.clone(),
                        muse: MuseTerms::compute(slots, totals),
                        metallaxis: metallaxis(slots, total_failing),
                        bug,
                    }
                }
                None => MbflRecord::without_mutants(key.clone(), total_failing, max_mutants, bug),
            }
        })
        .collect();

    if with_mutants < outcomes.len() {
        debug!(
            dropped = outcomes.len() - with_mutants,
            "mutated lines outside the coverage rows"
        );
    }
    info!(rows = records.len(), with_mutants, "MBFL features computed");

    Ok(MbflFeatures {
        max_mutants,
        records,
    })
}
