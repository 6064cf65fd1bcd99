//! Tests for the Coverage Postprocessor

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::key::FunctionExtent;
use crate::table::Table;
use std::path::Path;

fn extents() -> FunctionExtents {
    let mut extents = FunctionExtents::new();
    extents.insert(
        "src/calc.c",
        vec![
            FunctionExtent { name: "add".into(), start: 1, end: 5 },
            FunctionExtent { name: "mul".into(), start: 6, end: 10 },
        ],
    );
    extents
}

fn report(lines: &[(u32, u64)]) -> RawCoverageReport {
    RawCoverageReport {
        files: vec![RawFile {
            file: "src/calc.c".into(),
            lines: lines
                .iter()
                .map(|&(line_number, count)| RawLine { line_number, count })
                .collect(),
        }],
    }
}

fn tc(name: &str) -> TestCase {
    TestCase::new(name)
}

fn partition() -> TestPartition {
    TestPartition::new(vec![tc("TC1")], vec![tc("TC2"), tc("TC10")]).unwrap()
}

fn buggy() -> LineKey {
    LineKey::new("calc.c", "add", 3)
}

fn sources() -> HashMap<TestCase, RawCoverageReport> {
    let mut map = HashMap::new();
    map.insert(tc("TC1"), report(&[(2, 1), (3, 4), (7, 0)]));
    map.insert(tc("TC2"), report(&[(2, 1), (3, 0), (7, 2)]));
    map.insert(tc("TC10"), report(&[(2, 0), (3, 0), (7, 0)]));
    map
}

mod builder_tests {
    use super::*;

    #[test]
    fn test_matrix_shape_and_order() {
        let out = postprocess(&sources(), &extents(), &partition(), &buggy(), AuxiliaryCounts::default())
            .unwrap();
        let names: Vec<_> = out.matrix.columns().iter().map(TestCase::name).collect();
        assert_eq!(names, vec!["TC1", "TC2", "TC10"]);
        let keys: Vec<_> = out.matrix.rows().iter().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["calc.c#add#2", "calc.c#add#3", "calc.c#mul#7"]);
        assert!(out.matrix.covered(1, 0));
        assert!(!out.matrix.covered(1, 1));
    }

    #[test]
    fn test_row_mismatch_is_fatal() {
        let mut map = sources();
        map.insert(tc("TC2"), report(&[(2, 1), (4, 0), (7, 2)]));
        let err = postprocess(&map, &extents(), &partition(), &buggy(), AuxiliaryCounts::default())
            .unwrap_err();
        assert!(err.is_consistency());
        assert!(err.to_string().contains("calc.c#add#4"));
    }

    #[test]
    fn test_row_count_mismatch_is_fatal() {
        let mut map = sources();
        map.insert(tc("TC10"), report(&[(2, 0), (3, 0)]));
        let err = postprocess(&map, &extents(), &partition(), &buggy(), AuxiliaryCounts::default())
            .unwrap_err();
        assert!(err.to_string().contains("enumerates 2 lines"));
    }

    #[test]
    fn test_failing_test_must_cover_buggy_line() {
        let mut map = sources();
        map.insert(tc("TC1"), report(&[(2, 1), (3, 0), (7, 0)]));
        let err = postprocess(&map, &extents(), &partition(), &buggy(), AuxiliaryCounts::default())
            .unwrap_err();
        assert!(err.to_string().contains("does not execute buggy line"));
    }

    #[test]
    fn test_buggy_line_must_be_a_row() {
        let missing = LineKey::new("calc.c", "mul", 9);
        let err = postprocess(&sources(), &extents(), &partition(), &missing, AuxiliaryCounts::default())
            .unwrap_err();
        assert!(err.to_string().contains("does not appear"));
    }

    #[test]
    fn test_duplicate_key_in_first_report() {
        let mut map = sources();
        map.insert(tc("TC1"), report(&[(3, 1), (3, 1), (7, 0)]));
        let err = postprocess(&map, &extents(), &partition(), &buggy(), AuxiliaryCounts::default())
            .unwrap_err();
        assert!(err.to_string().contains("appears twice"));
    }

    #[test]
    fn test_unknown_test_case_rejected() {
        let extents = extents();
        let partition = partition();
        let buggy = buggy();
        let mut builder = CoverageMatrixBuilder::new(&extents, &partition, &buggy);
        let err = builder.add(&tc("TC99"), &report(&[(3, 1)])).unwrap_err();
        assert!(err.to_string().contains("neither failing nor passing"));
    }

    #[test]
    fn test_missing_column_rejected_on_finish() {
        let extents = extents();
        let partition = partition();
        let buggy = buggy();
        let mut builder = CoverageMatrixBuilder::new(&extents, &partition, &buggy);
        builder.add(&tc("TC1"), &report(&[(3, 1)])).unwrap();
        let err = builder.finish().unwrap_err();
        assert!(err.to_string().contains("1 of 3"));
    }

    #[test]
    fn test_missing_report_propagates() {
        let mut map = sources();
        map.remove(&tc("TC10"));
        let err = postprocess(&map, &extents(), &partition(), &buggy(), AuxiliaryCounts::default())
            .unwrap_err();
        assert!(err.to_string().contains("TC10.raw.json"));
    }
}

mod index_tests {
    use super::*;

    #[test]
    fn test_execution_indexes() {
        let out = postprocess(&sources(), &extents(), &partition(), &buggy(), AuxiliaryCounts::default())
            .unwrap();
        assert_eq!(out.executed_by_failing.len(), 2);
        assert!(out.executed_by_failing.contains(&buggy()));
        assert_eq!(out.executed_by_failing.tests_for(&buggy()), Some(&[tc("TC1")][..]));

        let mul7 = LineKey::new("calc.c", "mul", 7);
        assert!(!out.executed_by_failing.contains(&mul7));
        assert_eq!(out.executed_by_passing.tests_for(&mul7), Some(&[tc("TC2")][..]));
    }

    #[test]
    fn test_summary_counters() {
        let aux = AuxiliaryCounts { cc_tcs: 2, excluded_tcs: 1 };
        let out = postprocess(&sources(), &extents(), &partition(), &buggy(), aux).unwrap();
        let s = &out.summary;
        assert_eq!(s.failing_tcs, 1);
        assert_eq!(s.passing_tcs, 2);
        assert_eq!(s.cc_tcs, 2);
        assert_eq!(s.excluded_tcs, 1);
        assert_eq!(s.total_utilized_tcs, 3);
        assert_eq!(s.lines_executed_by_failing_tcs, 2);
        assert_eq!(s.lines_executed_by_passing_tcs, 2);
        assert_eq!(s.total_lines_executed, 3);
        assert_eq!(s.total_lines, 3);
        assert!((s.coverage_ratio() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_index_json_round_trip() {
        let out = postprocess(&sources(), &extents(), &partition(), &buggy(), AuxiliaryCounts::default())
            .unwrap();
        let json = out.executed_by_passing.to_json().unwrap();
        assert!(json.contains("\"calc.c#mul#7\":[\"TC2\"]"));
        let back = ExecutionIndex::from_json(Path::new("idx.json"), &json).unwrap();
        assert_eq!(back, out.executed_by_passing);
    }
}

mod table_tests {
    use super::*;

    #[test]
    fn test_postprocessed_table_layout() {
        let out = postprocess(&sources(), &extents(), &partition(), &buggy(), AuxiliaryCounts::default())
            .unwrap();
        let csv = out.matrix.to_table().to_csv();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("key,TC1,TC2,TC10"));
        assert_eq!(lines.next(), Some("calc.c#add#2,1,1,0"));
        assert_eq!(lines.next(), Some("calc.c#add#3,1,0,0"));
    }

    #[test]
    fn test_matrix_reads_back() {
        let out = postprocess(&sources(), &extents(), &partition(), &buggy(), AuxiliaryCounts::default())
            .unwrap();
        let table = out.matrix.to_table();
        let back = CoverageMatrix::from_table(Path::new("cov.csv"), &table, &partition(), &buggy())
            .unwrap();
        assert_eq!(back, out.matrix);
    }

    #[test]
    fn test_read_back_requires_all_columns() {
        let table = Table::parse(Path::new("cov.csv"), "key,TC1,TC2\ncalc.c#add#3,1,0\n").unwrap();
        let err = CoverageMatrix::from_table(Path::new("cov.csv"), &table, &partition(), &buggy())
            .unwrap_err();
        assert!(err.to_string().contains("TC10"));
    }

    #[test]
    fn test_read_back_rejects_bad_cell() {
        let table =
            Table::parse(Path::new("cov.csv"), "key,TC1,TC2,TC10\ncalc.c#add#3,1,2,0\n").unwrap();
        assert!(CoverageMatrix::from_table(Path::new("cov.csv"), &table, &partition(), &buggy())
            .is_err());
    }

    #[test]
    fn test_summary_table_round_trip() {
        let summary = CoverageSummary {
            failing_tcs: 3,
            passing_tcs: 7,
            total_utilized_tcs: 10,
            total_lines: 40,
            total_lines_executed: 12,
            ..CoverageSummary::default()
        };
        let table = summary.to_table();
        assert!(table.to_csv().starts_with("#_failing_tcs,#_passing_tcs,#_cc_tcs"));
        let back = CoverageSummary::from_table(Path::new("s.csv"), &table).unwrap();
        assert_eq!(back, summary);
        assert!((back.coverage_ratio() - 0.3).abs() < 1e-12);
    }
}
