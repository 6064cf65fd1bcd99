//! SBFL Suspiciousness Calculator
//!
//! Counts an execution spectrum per coverage row and evaluates eight
//! classical formulas on it. `e`/`n` mean executed/not executed and `f`/`p`
//! the failing/passing group:
//!
//! | count | meaning |
//! |---|---|
//! | `ef` | failing tests that executed the line |
//! | `ep` | failing tests that did not |
//! | `nf` | passing tests that executed the line |
//! | `np` | passing tests that did not |

use crate::coverage::CoverageMatrix;
use crate::key::LineKey;
use crate::result::{ensure_consistent, FaultlineResult};
use crate::table::{format_score, Table};
use crate::testsuite::TestPartition;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// Execution spectrum of one line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Spectrum {
    /// Failing tests that did not execute the line
    pub ep: usize,
    /// Failing tests that executed the line
    pub ef: usize,
    /// Passing tests that did not execute the line
    pub np: usize,
    /// Passing tests that executed the line
    pub nf: usize,
}

impl Spectrum {
    /// Spectrum in the historical `(ep, ef, np, nf)` order
    #[must_use]
    pub const fn new(ep: usize, ef: usize, np: usize, nf: usize) -> Self {
        Self { ep, ef, np, nf }
    }

    /// Count the spectrum of one matrix row
    ///
    /// Fails unless `ef + ep == |failing|` and `nf + np == |passing|`.
    pub fn of_row(matrix: &CoverageMatrix, row: usize, partition: &TestPartition) -> FaultlineResult<Self> {
        let ef = matrix.executed_count(row, partition.failing())?;
        let nf = matrix.executed_count(row, partition.passing())?;
        let spectrum = Self {
            ep: partition.failing().len().saturating_sub(ef),
            ef,
            np: partition.passing().len().saturating_sub(nf),
            nf,
        };
        spectrum.check(partition)?;
        Ok(spectrum)
    }

    /// Verify conservation against partition sizes
    pub fn check(&self, partition: &TestPartition) -> FaultlineResult<()> {
        ensure_consistent!(
            self.ef + self.ep == partition.failing().len(),
            "ef + ep = {} but there are {} failing test cases",
            self.ef + self.ep,
            partition.failing().len()
        );
        ensure_consistent!(
            self.nf + self.np == partition.passing().len(),
            "nf + np = {} but there are {} passing test cases",
            self.nf + self.np,
            partition.passing().len()
        );
        Ok(())
    }
}

/// A spectrum-based suspiciousness formula
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SbflFormula {
    /// 1 when no passing test executes the line
    Binary,
    /// `ef + ef/(2ep + ef)`
    Gp13,
    /// `ef/(ef + nf + ep)`
    Jaccard,
    /// `np` when no passing test executes the line, else -1
    Naish1,
    /// `ef - ep/(ep + np + 1)`
    Naish2,
    /// `ef/sqrt((ef + nf)(ef + ep))`
    Ochiai,
    /// `ef/(ep + np + ef + nf)`
    RusselRao,
    /// `ef`
    Wong1,
}

impl SbflFormula {
    /// Every formula, in column order
    pub const ALL: [Self; 8] = [
        Self::Binary,
        Self::Gp13,
        Self::Jaccard,
        Self::Naish1,
        Self::Naish2,
        Self::Ochiai,
        Self::RusselRao,
        Self::Wong1,
    ];

    /// Column name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Binary => "Binary",
            Self::Gp13 => "GP13",
            Self::Jaccard => "Jaccard",
            Self::Naish1 => "Naish1",
            Self::Naish2 => "Naish2",
            Self::Ochiai => "Ochiai",
            Self::RusselRao => "Russel+Rao",
            Self::Wong1 => "Wong1",
        }
    }

    /// Evaluate on a spectrum
    #[must_use]
    pub fn score(self, s: &Spectrum) -> f64 {
        let (ep, ef, np, nf) = (s.ep as f64, s.ef as f64, s.np as f64, s.nf as f64);
        let ratio = |num: f64, den: f64| if den == 0.0 { 0.0 } else { num / den };
        match self {
            Self::Binary => {
                if s.nf == 0 {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Gp13 => ef + ratio(ef, 2.0 * ep + ef),
            Self::Jaccard => ratio(ef, ef + nf + ep),
            Self::Naish1 => {
                if s.nf == 0 {
                    np
                } else {
                    -1.0
                }
            }
            Self::Naish2 => ef - ep / (ep + np + 1.0),
            Self::Ochiai => ratio(ef, ((ef + nf) * (ef + ep)).sqrt()),
            Self::RusselRao => ratio(ef, ep + np + ef + nf),
            Self::Wong1 => ef,
        }
    }
}

impl fmt::Display for SbflFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// SBFL features of one coverage row
#[derive(Debug, Clone, PartialEq)]
pub struct SbflRecord {
    /// Line identity
    pub key: LineKey,
    /// Execution spectrum
    pub spectrum: Spectrum,
    /// Scores in [`SbflFormula::ALL`] order
    pub scores: [f64; 8],
    /// Ground-truth flag
    pub bug: bool,
}

impl SbflRecord {
    /// Score of one formula
    #[must_use]
    pub fn score(&self, formula: SbflFormula) -> f64 {
        SbflFormula::ALL
            .iter()
            .position(|f| *f == formula)
            .map_or(0.0, |i| self.scores[i])
    }
}

/// SBFL feature table of one buggy version
#[derive(Debug, Clone, PartialEq)]
pub struct SbflFeatures {
    records: Vec<SbflRecord>,
}

impl SbflFeatures {
    /// Column names of `sbfl_features.csv`
    #[must_use]
    pub fn header() -> Vec<&'static str> {
        ["key", "ep", "ef", "np", "nf"]
            .into_iter()
            .chain(SbflFormula::ALL.map(SbflFormula::name))
            .chain(["bug"])
            .collect()
    }

    /// Records in coverage row order
    #[must_use]
    pub fn records(&self) -> &[SbflRecord] {
        &self.records
    }

    /// Render as `sbfl_features.csv`
    #[must_use]
    pub fn to_table(&self) -> Table {
        let mut table = Table::new(Self::header());
        for r in &self.records {
            let s = r.spectrum;
            let row = [
                r.key.to_string(),
                s.ep.to_string(),
                s.ef.to_string(),
                s.np.to_string(),
                s.nf.to_string(),
            ]
            .into_iter()
            .chain(r.scores.iter().map(|v| format_score(*v)))
            .chain([u8::from(r.bug).to_string()]);
            let _ = table.push(row);
        }
        table
    }
}

/// Compute spectra and scores for every row of a version's matrix
pub fn compute_sbfl(
    matrix: &CoverageMatrix,
    partition: &TestPartition,
    buggy: &LineKey,
) -> FaultlineResult<SbflFeatures> {
    ensure_consistent!(
        matrix.row_of(buggy).is_some(),
        "buggy line {buggy} is not a coverage row"
    );

    let mut records = Vec::with_capacity(matrix.rows().len());
    for (row, key) in matrix.rows().iter().enumerate() {
        let spectrum = Spectrum::of_row(matrix, row, partition)?;
        let bug = key == buggy;
        if bug {
            ensure_consistent!(
                spectrum.ef == partition.failing().len(),
                "buggy line {key} is executed by {} of {} failing test cases",
                spectrum.ef,
                partition.failing().len()
            );
        }
        records.push(SbflRecord {
            key: key.clone(),
            spectrum,
            scores: SbflFormula::ALL.map(|f| f.score(&spectrum)),
            bug,
        });
    }

    info!(rows = records.len(), "SBFL features computed");
    Ok(SbflFeatures { records })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::coverage::{CoverageMatrixBuilder, RawCoverageReport, RawFile, RawLine};
    use crate::key::{FunctionExtent, FunctionExtents};
    use crate::testsuite::TestCase;
    use proptest::prelude::*;

    mod formula_tests {
        use super::*;

        #[test]
        fn test_zero_denominator_guards() {
            let s = Spectrum::new(0, 0, 5, 5);
            assert_eq!(SbflFormula::Ochiai.score(&s), 0.0);
            assert_eq!(SbflFormula::Jaccard.score(&s), 0.0);
            assert_eq!(SbflFormula::Gp13.score(&s), 0.0);
        }

        #[test]
        fn test_binary_without_passing_execution() {
            let s = Spectrum::new(2, 1, 0, 0);
            assert_eq!(SbflFormula::Binary.score(&s), 1.0);
            assert_eq!(SbflFormula::Binary.score(&Spectrum::new(2, 1, 0, 1)), 0.0);
        }

        #[test]
        fn test_naish1() {
            assert_eq!(SbflFormula::Naish1.score(&Spectrum::new(0, 3, 7, 0)), 7.0);
            assert_eq!(SbflFormula::Naish1.score(&Spectrum::new(0, 3, 6, 1)), -1.0);
        }

        #[test]
        fn test_values() {
            let s = Spectrum::new(1, 2, 3, 4);
            assert!((SbflFormula::Gp13.score(&s) - (2.0 + 2.0 / 4.0)).abs() < 1e-12);
            assert!((SbflFormula::Jaccard.score(&s) - 2.0 / 7.0).abs() < 1e-12);
            assert!((SbflFormula::Naish2.score(&s) - (2.0 - 1.0 / 5.0)).abs() < 1e-12);
            assert!((SbflFormula::Ochiai.score(&s) - 2.0 / (6.0f64 * 3.0).sqrt()).abs() < 1e-12);
            assert!((SbflFormula::RusselRao.score(&s) - 0.2).abs() < 1e-12);
            assert_eq!(SbflFormula::Wong1.score(&s), 2.0);
        }

        #[test]
        fn test_header() {
            assert_eq!(
                SbflFeatures::header().join(","),
                "key,ep,ef,np,nf,Binary,GP13,Jaccard,Naish1,Naish2,Ochiai,Russel+Rao,Wong1,bug"
            );
        }
    }

    mod feature_tests {
        use super::*;

        fn setup() -> (CoverageMatrix, TestPartition, LineKey) {
            let mut extents = FunctionExtents::new();
            extents.insert(
                "calc.c",
                vec![FunctionExtent {
                    name: "add".into(),
                    start: 1,
                    end: 9,
                }],
            );
            let partition = TestPartition::new(
                vec![TestCase::new("TC1"), TestCase::new("TC2")],
                vec![TestCase::new("TC3")],
            )
            .unwrap();
            let buggy = LineKey::new("calc.c", "add", 2);
            let report = |counts: [u64; 2]| RawCoverageReport {
                files: vec![RawFile {
                    file: "calc.c".into(),
                    lines: vec![
                        RawLine { line_number: 2, count: counts[0] },
                        RawLine { line_number: 5, count: counts[1] },
                    ],
                }],
            };
            let mut builder = CoverageMatrixBuilder::new(&extents, &partition, &buggy);
            builder.add(&TestCase::new("TC1"), &report([1, 0])).unwrap();
            builder.add(&TestCase::new("TC2"), &report([1, 1])).unwrap();
            builder.add(&TestCase::new("TC3"), &report([0, 1])).unwrap();
            (builder.finish().unwrap(), partition, buggy)
        }

        #[test]
        fn test_spectra() {
            let (matrix, partition, buggy) = setup();
            let features = compute_sbfl(&matrix, &partition, &buggy).unwrap();
            let records = features.records();
            assert_eq!(records[0].spectrum, Spectrum::new(0, 2, 1, 0));
            assert!(records[0].bug);
            assert_eq!(records[1].spectrum, Spectrum::new(1, 1, 0, 1));
            assert!(!records[1].bug);
            assert_eq!(records[0].score(SbflFormula::Binary), 1.0);
            assert_eq!(records[0].score(SbflFormula::Ochiai), 1.0);
        }

        #[test]
        fn test_csv_row() {
            let (matrix, partition, buggy) = setup();
            let csv = compute_sbfl(&matrix, &partition, &buggy).unwrap().to_table().to_csv();
            let row = csv.lines().nth(1).unwrap();
            assert_eq!(row, "calc.c#add#2,0,2,1,0,1.0,3.0,1.0,1.0,2.0,1.0,0.6666666666666666,2.0,1");
        }

        #[test]
        fn test_conservation_violation() {
            let (_, partition, _) = setup();
            let err = Spectrum::new(0, 1, 1, 0).check(&partition).unwrap_err();
            assert!(err.is_consistency());
        }
    }

    proptest! {
        #[test]
        fn prop_spectrum_conservation(covered in proptest::collection::vec(any::<bool>(), 2..12), failing in 1usize..6) {
            let failing = failing.min(covered.len() - 1);
            let names: Vec<TestCase> = (1..=covered.len()).map(|i| TestCase::new(&format!("TC{i}"))).collect();
            let partition = TestPartition::new(names[..failing].to_vec(), names[failing..].to_vec()).unwrap();

            let mut extents = FunctionExtents::new();
            extents.insert("a.c", vec![FunctionExtent { name: "f".into(), start: 1, end: 10 }]);
            let buggy = LineKey::new("a.c", "f", 1);
            let mut builder = CoverageMatrixBuilder::new(&extents, &partition, &buggy);
            for (i, tc) in names.iter().enumerate() {
                let hit = u64::from(i < failing || covered[i]);
                let report = RawCoverageReport {
                    files: vec![RawFile {
                        file: "a.c".into(),
                        lines: vec![
                            RawLine { line_number: 1, count: 1 },
                            RawLine { line_number: 2, count: hit },
                        ],
                    }],
                };
                builder.add(tc, &report).unwrap();
            }
            let matrix = builder.finish().unwrap();
            for row in 0..matrix.rows().len() {
                let s = Spectrum::of_row(&matrix, row, &partition).unwrap();
                prop_assert_eq!(s.ef + s.ep, failing);
                prop_assert_eq!(s.nf + s.np, names.len() - failing);
            }
        }

        #[test]
        fn prop_scores_finite(ep in 0usize..20, ef in 0usize..20, np in 0usize..20, nf in 0usize..20) {
            let s = Spectrum::new(ep, ef, np, nf);
            for f in SbflFormula::ALL {
                prop_assert!(f.score(&s).is_finite());
            }
        }
    }
}
