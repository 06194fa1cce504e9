use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::SourceLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Syntax,
    Resolution,
    Type,
    Arity,
    Host,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Syntax => "syntax error",
            Self::Resolution => "resolution error",
            Self::Type => "type error",
            Self::Arity => "arity error",
            Self::Host => "host error",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("{}", self.render())]
pub struct GmlError {
    pub code: String,
    pub message: String,
    pub kind: ErrorKind,
    pub fatal: bool,
    pub location: Option<SourceLocation>,
}

impl GmlError {
    pub fn new(kind: ErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            kind,
            fatal: false,
            location: None,
        }
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, "GML_SYNTAX", message).into_fatal()
    }

    pub fn resolution(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Resolution, code, message)
    }

    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type, "GML_TYPE_MISMATCH", message)
    }

    pub fn arity(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Arity, "GML_WRONG_ARGUMENT_COUNT", message).into_fatal()
    }

    pub fn host(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Host, code, message)
    }

    pub fn into_fatal(mut self) -> Self {
        self.fatal = true;
        self
    }

    /// Attaches a location unless one was already recorded closer to the fault.
    pub fn located(mut self, source: &str, offset: usize) -> Self {
        if self.location.is_none() {
            self.location = Some(SourceLocation::locate(source, offset));
        }
        self
    }

    pub fn render(&self) -> String {
        match &self.location {
            Some(location) => format!(
                "Error in code at line {}:\n{}\n{}\nat position {}: {}",
                location.line, location.line_text, location.caret, location.column, self.message
            ),
            None => format!("{}: {}", self.code, self.message),
        }
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn unlocated_errors_render_code_and_message() {
        let error = GmlError::host("GML_UNKNOWN_FUNCTION", "Unknown function or script: foo");
        assert_eq!(
            error.to_string(),
            "GML_UNKNOWN_FUNCTION: Unknown function or script: foo"
        );
        assert!(!error.fatal);
    }

    #[test]
    fn located_errors_render_snippet_and_caret() {
        let error = GmlError::type_mismatch("Wrong type of arguments to +.").located("x = 1 + \"a\";", 6);
        assert_eq!(
            error.to_string(),
            "Error in code at line 1:\nx = 1 + \"a\";\n      ^\nat position 7: Wrong type of arguments to +."
        );
    }

    #[test]
    fn first_location_wins() {
        let error = GmlError::syntax("bad").located("ab\ncd", 3).located("ab\ncd", 0);
        let location = error.location.expect("location should be set");
        assert_eq!(location.line, 2);
        assert!(error.fatal);
    }

    #[test]
    fn arity_errors_are_always_fatal() {
        assert!(GmlError::arity("too few").fatal);
        assert_eq!(GmlError::arity("too few").kind, ErrorKind::Arity);
    }
}
