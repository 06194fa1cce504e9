use std::fmt::Display;
use std::path::Path;

use gml_api::GmlError;

/// The CLI step that failed before any script ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CliStage {
    SourcePath,
    SourceScan,
    SourceRead,
    WorldRead,
    WorldInvalid,
}

impl CliStage {
    fn code(self) -> &'static str {
        match self {
            Self::SourcePath => "CLI_SOURCE_PATH",
            Self::SourceScan => "CLI_SOURCE_SCAN",
            Self::SourceRead => "CLI_SOURCE_READ",
            Self::WorldRead => "CLI_WORLD_READ",
            Self::WorldInvalid => "CLI_WORLD_INVALID",
        }
    }

    fn action(self) -> &'static str {
        match self {
            Self::SourcePath => "resolve scripts directory",
            Self::SourceScan => "scan scripts under",
            Self::SourceRead => "read script",
            Self::WorldRead => "read world fixture",
            Self::WorldInvalid => "decode world fixture",
        }
    }
}

pub(crate) fn cli_error(stage: CliStage, path: &Path, error: impl Display) -> GmlError {
    GmlError::host(
        stage.code(),
        format!("cannot {} {}: {}", stage.action(), path.display(), error),
    )
}

/// Protocol lines for a failed command. Located script errors also report
/// their line and column.
pub(crate) fn error_lines(error: &GmlError) -> Vec<String> {
    let mut lines = vec!["RESULT:ERROR".to_string(), format!("ERROR_CODE:{}", error.code)];
    if let Some(location) = &error.location {
        lines.push(format!("ERROR_LINE:{}", location.line));
        lines.push(format!("ERROR_COLUMN:{}", location.column));
    }
    lines.push(format!(
        "ERROR_MSG_JSON:{}",
        serde_json::to_string(&error.to_string()).expect("string json")
    ));
    lines
}

pub(crate) fn emit_error(error: GmlError) -> i32 {
    for line in error_lines(&error) {
        println!("{}", line);
    }
    1
}

#[cfg(test)]
mod error_map_tests {
    use super::*;

    #[test]
    fn emit_error_returns_non_zero_exit_code() {
        let code = emit_error(GmlError::host("ERR", "failed"));
        assert_eq!(code, 1);
    }

    #[test]
    fn stage_errors_name_the_path_and_the_cause() {
        let error = cli_error(
            CliStage::WorldRead,
            Path::new("worlds/arena.json"),
            std::io::Error::other("denied"),
        );
        assert_eq!(error.code, "CLI_WORLD_READ");
        assert_eq!(error.message, "cannot read world fixture worlds/arena.json: denied");

        let invalid = serde_json::from_str::<serde_json::Value>("{").expect_err("invalid json");
        let error = cli_error(CliStage::WorldInvalid, Path::new("w.json"), invalid);
        assert_eq!(error.code, "CLI_WORLD_INVALID");

        for (stage, code) in [
            (CliStage::SourcePath, "CLI_SOURCE_PATH"),
            (CliStage::SourceScan, "CLI_SOURCE_SCAN"),
            (CliStage::SourceRead, "CLI_SOURCE_READ"),
        ] {
            assert_eq!(cli_error(stage, Path::new("scripts"), "x").code, code);
        }
    }

    #[test]
    fn located_errors_report_line_and_column() {
        let error = gml_api::compile("a = 1;\nb = ;").expect_err("syntax error");
        let lines = error_lines(&error);
        assert_eq!(lines[0], "RESULT:ERROR");
        assert_eq!(lines[1], "ERROR_CODE:GML_SYNTAX");
        assert_eq!(lines[2], "ERROR_LINE:2");
        assert_eq!(lines[3], "ERROR_COLUMN:5");
        assert!(lines[4].starts_with("ERROR_MSG_JSON:\"Error in code at line 2:"));

        let lines = error_lines(&GmlError::host("CLI_SOURCE_EMPTY", "none"));
        assert_eq!(lines.len(), 3);
    }
}
