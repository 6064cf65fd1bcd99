//! Synthetic buggy-version fixtures for tests.

#![allow(clippy::expect_used)]

use std::path::{Path, PathBuf};

/// A small buggy version of `src/calc.c` with 3 failing and 7 passing tests
///
/// Functions: `add` (lines 1-5), `mul` (6-10) in `calc.c` and
/// `helper(int x, int y)` (1-4) in `util.c`. Four mutants sit on `calc.c:3`,
/// two of which fail to build.
#[derive(Debug, Clone)]
pub(crate) struct SyntheticVersion {
    /// Ground-truth line in `calc.c`
    pub bug_line: u32,
    /// Make `TC2` skip the buggy line
    pub failing_misses_bug: bool,
}

impl Default for SyntheticVersion {
    fn default() -> Self {
        Self {
            bug_line: 3,
            failing_misses_bug: false,
        }
    }
}

const EXTENTS: &str = r#"{
    "src/calc.c": [["add", 1, 5], ["mul", 6, 10]],
    "src/util.c": [["helper(int x, int y)", "1", "4"]]
}"#;

const RESULTS: &str = "\
target_file,mutant_id,lineno,build_result,p2f,p2p,f2p,f2f
src/calc.c,mutant_1,3,FAIL,-1,-1,-1,-1
src/calc.c,mutant_2,3,FAIL,-1,-1,-1,-1
src/calc.c,mutant_3,3,PASS,0,7,3,0
src/calc.c,mutant_4,3,PASS,1,6,1,2
src/calc.c,mutant_5,7,PASS,2,5,0,3
src/util.c,mutant_6,2,PASS,1,6,0,3
";

const MUT_DB: &str = "\
,,Before Mutation,,,,,After Mutation,,,,,
Mutant Filename,Mutation Operator,Start Line#,Start Col#,End Line#,End Col#,Target Token,Start Line#,Start Col#,End Line#,End Col#,Mutated Token,Extra Info
calc.MUT1.c,ROR,3,10,3,11,<,3,10,3,12,<=,
calc.MUT2.c,AOR,3,14,3,15,+,3,14,3,15,-,
calc.MUT3.c,CRCR,7,5,7,6,0,7,5,7,6,1,
calc.MUT4.c,AOR,9,2,9,3,*,9,2,9,3,/,
";

impl SyntheticVersion {
    /// Write the version as `<corpus>/<name>` and return its path
    pub fn write(&self, corpus: &Path, name: &str) -> PathBuf {
        let root = corpus.join(name);
        let put = |rel: &str, content: &str| {
            let path = root.join(rel);
            std::fs::create_dir_all(path.parent().expect("fixture path has a parent"))
                .expect("create fixture dir");
            std::fs::write(path, content).expect("write fixture file");
        };

        put(
            "bug_info.csv",
            &format!(
                "target_code_file,buggy_code_filename,buggy_lineno\nsrc/calc.c,{name},{}\n",
                self.bug_line
            ),
        );
        put("testsuite_info/failing_tcs.txt", "TC1.sh\nTC2.sh\nTC3.sh\n");
        put(
            "testsuite_info/passing_tcs.txt",
            "TC4.sh\nTC5.sh\nTC6.sh\nTC7.sh\nTC8.sh\nTC9.sh\nTC10.sh\n",
        );
        put("testsuite_info/ccts.txt", "TC11.sh\n");
        put("line2function_info/line2function.json", EXTENTS);
        put("mutation_testing_results.csv", RESULTS);
        put("generated_mutants/calc_mut_db.csv", MUT_DB);

        for i in 1..=10u32 {
            let failing = i <= 3;
            let covers_bug = failing && !(self.failing_misses_bug && i == 2);
            let calc = [
                (2, 1),
                (3, u32::from(covers_bug || i == 4)),
                (7, u32::from(failing || i % 2 == 0)),
                (8, u32::from(!failing)),
            ];
            let util = [(2, u32::from(i >= 8))];
            let lines = |rows: &[(u32, u32)]| {
                rows.iter()
                    .map(|(l, c)| format!(r#"{{"line_number": {l}, "count": {c}}}"#))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            put(
                &format!("coverage/TC{i}.raw.json"),
                &format!(
                    r#"{{"files": [{{"file": "src/calc.c", "lines": [{}]}}, {{"file": "src/util.c", "lines": [{}]}}]}}"#,
                    lines(&calc),
                    lines(&util)
                ),
            );
        }
        root
    }
}
