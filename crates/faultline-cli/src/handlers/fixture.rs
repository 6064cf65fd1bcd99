//! A two-function buggy version for handler tests.

#![allow(clippy::expect_used)]

use std::path::{Path, PathBuf};

/// Write `<corpus>/<name>` with its bug on `calc.c:3` inside `add`
pub(crate) fn write_version(corpus: &Path, name: &str) -> PathBuf {
    let root = corpus.join(name);
    let put = |rel: &str, content: &str| {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().expect("fixture path has a parent")).expect("create fixture dir");
        std::fs::write(path, content).expect("write fixture file");
    };

    put(
        "bug_info.csv",
        &format!("target_code_file,buggy_code_filename,buggy_lineno\nsrc/calc.c,{name},3\n"),
    );
    put("testsuite_info/failing_tcs.txt", "TC1.sh\nTC2.sh\n");
    put("testsuite_info/passing_tcs.txt", "TC3.sh\nTC4.sh\n");
    put(
        "line2function_info/line2function.json",
        r#"{"src/calc.c": [["add", 1, 5], ["mul", 6, 10]]}"#,
    );
    put(
        "mutation_testing_results.csv",
        "target_file,mutant_id,lineno,build_result,p2f,p2p,f2p,f2f\n\
         src/calc.c,mutant_1,3,PASS,0,2,2,0\n\
         src/calc.c,mutant_2,3,FAIL,-1,-1,-1,-1\n\
         src/calc.c,mutant_3,7,PASS,1,1,0,2\n",
    );
    put(
        "generated_mutants/calc_mut_db.csv",
        ",,Before Mutation,,,,,After Mutation,,,,,\n\
         Mutant Filename,Mutation Operator,Start Line#,Start Col#,End Line#,End Col#,Target Token,Start Line#,Start Col#,End Line#,End Col#,Mutated Token,Extra Info\n\
         calc.MUT1.c,AOR,3,14,3,15,+,3,14,3,15,-,\n\
         calc.MUT2.c,ROR,7,8,7,9,<,7,8,7,10,<=,\n",
    );
    for i in 1..=4u32 {
        let lines = [(2, 1), (3, u32::from(i <= 2)), (7, u32::from(i != 2))]
            .iter()
            .map(|(l, c)| format!(r#"{{"line_number": {l}, "count": {c}}}"#))
            .collect::<Vec<_>>()
            .join(", ");
        put(
            &format!("coverage/TC{i}.raw.json"),
            &format!(r#"{{"files": [{{"file": "src/calc.c", "lines": [{lines}]}}]}}"#),
        );
    }
    root
}
