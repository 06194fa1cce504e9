mod case;
mod runner;
mod source;

pub use case::{
    ExpectedError, ExpectedInstance, Expectation, ScriptCase, TestCase, TESTCASE_SCHEMA_V1,
};
pub use runner::{assert_case, assert_cases_in_dir, check_expectations, run_case, RunReport};
pub use source::{collect_case_files, read_test_case};

use std::path::PathBuf;

use gml_api::GmlError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GmlToolError {
    #[error("Failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse testcase {path}: {source}")]
    ParseCase {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid testcase schema version \"{found}\", expected \"{expected}\".")]
    InvalidSchemaVersion { expected: String, found: String },
    #[error("No .json testcases under {path}.")]
    CasesEmpty { path: PathBuf },
    #[error("Engine error: {0}")]
    Engine(#[from] GmlError),
    #[error("Self entity index {index} is out of range ({count} entities).")]
    MissingEntity { index: usize, count: usize },
    #[error("Expected error {expected_code}, but the entry finished normally.")]
    UnexpectedSuccess { expected_code: String },
    #[error("Entry failed unexpectedly: {0}")]
    UnexpectedError(String),
    #[error("Error mismatch. expected={expected} actual={actual}")]
    ErrorMismatch { expected: String, actual: String },
    #[error("Value mismatch for {scope} {name}. expected={expected} actual={actual}")]
    ValueMismatch {
        scope: String,
        name: String,
        expected: String,
        actual: String,
    },
    #[error("Message mismatch. expected={expected:?} actual={actual:?}")]
    MessageMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },
    #[error("Testcase {path} failed: {source}")]
    CaseFailed {
        path: PathBuf,
        source: Box<GmlToolError>,
    },
}
