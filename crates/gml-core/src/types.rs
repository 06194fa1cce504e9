use serde::{Deserialize, Serialize};

use crate::value::GmlValue;

/// Position of a diagnostic inside its source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
    pub line_text: String,
    pub caret: String,
}

impl SourceLocation {
    /// Resolves a byte offset into a 1-based line and column.
    pub fn locate(source: &str, offset: usize) -> Self {
        let mut offset = offset.min(source.len());
        while !source.is_char_boundary(offset) {
            offset -= 1;
        }
        let line_start = source[..offset].rfind('\n').map_or(0, |index| index + 1);
        let line_end = source[offset..]
            .find('\n')
            .map_or(source.len(), |index| offset + index);
        let line = source[..line_start].matches('\n').count() + 1;
        let column = source[line_start..offset].chars().count() + 1;
        let line_text = source[line_start..line_end].trim_end_matches('\r').to_string();
        Self {
            line,
            column,
            line_text,
            caret: format!("{}^", " ".repeat(column - 1)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgKind {
    Any,
    Real,
    Integer,
    String,
    Boolean,
    AsString,
}

impl ArgKind {
    pub fn coerce(self, value: &GmlValue) -> GmlValue {
        match self {
            Self::Any => value.clone(),
            Self::Real => GmlValue::Real(value.force_real()),
            Self::Integer => GmlValue::Real(value.force_integer()),
            Self::String => GmlValue::Str(value.force_string()),
            Self::AsString => GmlValue::Str(value.to_display_string()),
            Self::Boolean => GmlValue::from_bool(value.force_bool()),
        }
    }
}

/// One entry of a native function's parameter list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgSpec {
    pub kind: ArgKind,
    pub variadic: bool,
}

impl ArgSpec {
    pub const fn of(kind: ArgKind) -> Self {
        Self {
            kind,
            variadic: false,
        }
    }

    pub const fn rest(kind: ArgKind) -> Self {
        Self {
            kind,
            variadic: true,
        }
    }
}

#[cfg(test)]
mod types_tests {
    use super::*;

    #[test]
    fn locate_reports_line_column_and_caret() {
        let source = "a = 1;\nb = 2;\nc = = 3;";
        let offset = source.find("= 3").expect("offset should exist") - 2;
        let location = SourceLocation::locate(source, offset);
        assert_eq!(location.line, 3);
        assert_eq!(location.column, 3);
        assert_eq!(location.line_text, "c = = 3;");
        assert_eq!(location.caret, "  ^");
    }

    #[test]
    fn locate_handles_offsets_past_the_end() {
        let location = SourceLocation::locate("x", 10);
        assert_eq!(location.line, 1);
        assert_eq!(location.column, 2);
    }

    #[test]
    fn arg_kinds_coerce_values() {
        let text = GmlValue::from("7");
        assert_eq!(ArgKind::Any.coerce(&text), text);
        assert_eq!(ArgKind::Real.coerce(&text), GmlValue::Real(0.0));
        assert_eq!(ArgKind::Integer.coerce(&GmlValue::Real(3.8)), GmlValue::Real(3.0));
        assert_eq!(ArgKind::String.coerce(&GmlValue::Real(3.0)), GmlValue::from(""));
        assert_eq!(ArgKind::AsString.coerce(&GmlValue::Real(3.0)), GmlValue::from("3"));
        assert_eq!(ArgKind::Boolean.coerce(&GmlValue::Real(0.4)), GmlValue::Real(0.0));
    }
}
