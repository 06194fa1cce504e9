use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{GmlToolError, TestCase, TESTCASE_SCHEMA_V1};

/// Every `.json` file under `cases_dir`, in path order.
pub fn collect_case_files(cases_dir: &Path) -> Result<Vec<PathBuf>, GmlToolError> {
    let files: Vec<PathBuf> = WalkDir::new(cases_dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("json"))
        .collect();

    if files.is_empty() {
        return Err(GmlToolError::CasesEmpty {
            path: cases_dir.to_path_buf(),
        });
    }
    Ok(files)
}

pub fn read_test_case(case_path: &Path) -> Result<TestCase, GmlToolError> {
    let raw = fs::read_to_string(case_path).map_err(|source| GmlToolError::ReadFile {
        path: case_path.to_path_buf(),
        source,
    })?;
    let parsed: TestCase = serde_json::from_str(&raw).map_err(|source| GmlToolError::ParseCase {
        path: case_path.to_path_buf(),
        source,
    })?;

    if parsed.schema_version != TESTCASE_SCHEMA_V1 {
        return Err(GmlToolError::InvalidSchemaVersion {
            expected: TESTCASE_SCHEMA_V1.to_string(),
            found: parsed.schema_version,
        });
    }

    Ok(parsed)
}
