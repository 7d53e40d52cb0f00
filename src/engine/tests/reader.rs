//! Reads an .sql file that contains our rendering tests.
//!
//! These files contain multiple tests that look like this:
//! ```sql
//! --       v____________________________________v--- this is the query state, as JSON
//! -- Test: {"tables": [{"name": "humans"}], ...}
//! SELECT humans.id, humans.name
//! FROM humans;
//! ```
//! All tests start with "-- Test:" followed by the query state on the same line. The next lines
//! until a blank line are the expected output.
//!
//! The name of the file decides the dialect: `postgres.sql` tests are rendered for Postgres.
use crate::engine::{Dialect, QueryState};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::iter::Enumerate;
use std::path::PathBuf;

const TEST_MARKER: &str = "-- Test: ";

pub struct SqlTestFileReader {
    pub file_path: PathBuf,
    pub dialect: Dialect,
    lines: Enumerate<Lines<BufReader<File>>>,
}

pub struct Test {
    pub line_nr: usize,
    pub state: QueryState,
    pub expected: String,
}

impl Iterator for SqlTestFileReader {
    type Item = Result<Test, crate::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((line_nr, line_res)) = self.lines.next() {
            match line_res {
                Ok(line) if line.starts_with(TEST_MARKER) => {
                    return Some(self.create_test(line_nr, &line));
                }
                Ok(_) => {
                    // Any line not in a -- Test: block is ignored.
                }
                Err(err) => {
                    return Some(Err(err.into()));
                }
            }
        }

        None
    }
}

impl SqlTestFileReader {
    pub fn new(file_path: PathBuf) -> Result<Self, crate::Error> {
        let dialect = file_path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
            .parse::<Dialect>()
            .map_err(|error| crate::InternalError(format!("{error}")))?;

        let file = File::open(&file_path)?;
        let lines = BufReader::new(file).lines().enumerate();

        Ok(SqlTestFileReader {
            file_path,
            dialect,
            lines,
        })
    }

    fn create_test(&mut self, line_nr: usize, input_line: &str) -> Result<Test, crate::Error> {
        let state = serde_json::from_str(&input_line[TEST_MARKER.len()..])?;
        let mut expected = Vec::new();

        for (_, line_res) in self.lines.by_ref() {
            let line = line_res?;

            if line.trim().is_empty() {
                // Empty line => end of test
                break;
            }

            expected.push(line);
        }

        Ok(Test {
            line_nr: line_nr + 1, // they don't start at 0
            state,
            expected: expected.join("\n"),
        })
    }
}
