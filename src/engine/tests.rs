//! Rendering tests.
//!
//! This module runs examples of (query state, SQL) pairs from the src/tests folder as tests.
//! When changing the renderer, start by adding a case to one of those files.
use crate::engine::compile;
use crate::engine::tests::reader::{SqlTestFileReader, Test};
use std::fs;
use std::path::Path;

mod reader;

/// Scans the entire src/tests folder and runs everything in there.
#[test]
fn run_rendering_tests() {
    let test_files = fs::read_dir(Path::new("src/tests")).expect("Failed to read test files");

    let mut failures = Vec::new();
    let mut count = 0;

    for file in test_files.flatten() {
        let reader = SqlTestFileReader::new(file.path())
            .unwrap_or_else(|error| panic!("Cannot read {:?}: {error}", file.path()));
        let file_name = reader.file_path.display().to_string();
        let dialect = reader.dialect;

        for test in reader {
            let Test {
                line_nr,
                state,
                expected,
            } = test.unwrap_or_else(|error| panic!("Broken test in {file_name}: {error}"));

            count += 1;

            let found = compile(&state, dialect);
            if found != expected {
                failures.push(format!(
                    "{file_name}:{line_nr} ({dialect})\nexpected:\n{expected}\nfound:\n{found}\n"
                ));
            }
        }
    }

    assert!(count > 0, "No rendering tests found");
    assert!(failures.is_empty(), "{}", failures.join("\n"));
}
