use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GmlError;

/// A scalar runtime value. The language has exactly two dynamic types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GmlValue {
    Real(f64),
    Str(String),
}

impl GmlValue {
    pub const ZERO: GmlValue = GmlValue::Real(0.0);

    pub fn from_bool(value: bool) -> Self {
        Self::Real(if value { 1.0 } else { 0.0 })
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Self::Real(value) => Some(*value),
            Self::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value.as_str()),
            Self::Real(_) => None,
        }
    }

    pub fn is_real(&self) -> bool {
        matches!(self, Self::Real(_))
    }

    pub fn is_str(&self) -> bool {
        matches!(self, Self::Str(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Real(_) => "real",
            Self::Str(_) => "string",
        }
    }

    pub fn same_type(&self, other: &GmlValue) -> bool {
        self.is_real() == other.is_real()
    }

    /// Numeric cast used by `real` argument specs: strings become 0.
    pub fn force_real(&self) -> f64 {
        self.as_real().unwrap_or(0.0)
    }

    pub fn force_integer(&self) -> f64 {
        to_integer(self.force_real())
    }

    /// String cast used by `string` argument specs: numbers become "".
    pub fn force_string(&self) -> String {
        match self {
            Self::Str(value) => value.clone(),
            Self::Real(_) => String::new(),
        }
    }

    pub fn force_bool(&self) -> bool {
        is_true(self.force_real())
    }

    /// Display formatting, as used by `string()` and `as-string` specs.
    pub fn to_display_string(&self) -> String {
        match self {
            Self::Str(value) => value.clone(),
            Self::Real(value) => format_real(*value),
        }
    }
}

impl Default for GmlValue {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for GmlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

impl From<f64> for GmlValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<i32> for GmlValue {
    fn from(value: i32) -> Self {
        Self::Real(f64::from(value))
    }
}

impl From<&str> for GmlValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for GmlValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// Truthiness threshold shared by conditions and logical operators.
pub fn is_true(value: f64) -> bool {
    value >= 0.5
}

/// The integer rule used by `integer` specs and `repeat` counts.
pub fn to_integer(value: f64) -> f64 {
    if value.is_finite() {
        value.trunc()
    } else {
        0.0
    }
}

/// Longest string, in bytes, that repetition may produce.
pub const MAX_STRING_LENGTH: usize = 16 * 1024 * 1024;

/// Repeats `text` a truncated `times` (negative counts give ""), refusing
/// results longer than [`MAX_STRING_LENGTH`].
pub fn repeat_string(text: &str, times: f64) -> Result<String, GmlError> {
    let count = to_integer(times).max(0.0) as usize;
    match count.checked_mul(text.len()) {
        Some(length) if length <= MAX_STRING_LENGTH => Ok(text.repeat(count)),
        _ => Err(GmlError::host(
            "GML_STRING_TOO_LONG",
            format!(
                "Repeating a string of {} bytes {} times exceeds the {} byte limit",
                text.len(),
                format_real(to_integer(times)),
                MAX_STRING_LENGTH
            ),
        )),
    }
}

/// 32-bit two's complement conversion applied before bitwise operators.
pub fn to_int32(value: f64) -> i32 {
    if !value.is_finite() {
        return 0;
    }
    let truncated = value.trunc();
    let modulo = truncated.rem_euclid(4_294_967_296.0);
    if modulo >= 2_147_483_648.0 {
        (modulo - 4_294_967_296.0) as i32
    } else {
        modulo as i32
    }
}

pub fn format_real(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    format!("{:.2}", value)
}

#[cfg(test)]
mod value_tests {
    use super::*;

    #[test]
    fn truthiness_threshold_is_one_half() {
        assert!(!is_true(0.49));
        assert!(is_true(0.5));
        assert!(!is_true(-3.0));
    }

    #[test]
    fn display_formatting_keeps_integers_and_two_decimals() {
        assert_eq!(GmlValue::Real(3.0).to_display_string(), "3");
        assert_eq!(GmlValue::Real(-12.0).to_display_string(), "-12");
        assert_eq!(GmlValue::Real(1.5).to_display_string(), "1.50");
        assert_eq!(GmlValue::Real(0.125).to_display_string(), "0.13");
        assert_eq!(GmlValue::from("abc").to_display_string(), "abc");
    }

    #[test]
    fn forced_casts_replace_foreign_types() {
        assert_eq!(GmlValue::from("12").force_real(), 0.0);
        assert_eq!(GmlValue::Real(4.0).force_string(), "");
        assert_eq!(GmlValue::Real(2.9).force_integer(), 2.0);
        assert_eq!(GmlValue::Real(-2.9).force_integer(), -2.0);
        assert!(GmlValue::Real(0.7).force_bool());
    }

    #[test]
    fn int32_conversion_wraps_like_twos_complement() {
        assert_eq!(to_int32(5.7), 5);
        assert_eq!(to_int32(-1.0), -1);
        assert_eq!(to_int32(4_294_967_297.0), 1);
        assert_eq!(to_int32(2_147_483_648.0), i32::MIN);
        assert_eq!(to_int32(f64::NAN), 0);
    }

    #[test]
    fn repetition_is_bounded() {
        assert_eq!(repeat_string("ab", 2.7).expect("small repeat"), "abab");
        assert_eq!(repeat_string("ab", -3.0).expect("negative repeat"), "");
        assert_eq!(repeat_string("", 1e18).expect("empty text"), "");
        let error = repeat_string("ab", 1e18).expect_err("huge repeat should fail");
        assert_eq!(error.code, "GML_STRING_TOO_LONG");
        repeat_string("a", MAX_STRING_LENGTH as f64).expect("exact limit should pass");
        repeat_string("a", MAX_STRING_LENGTH as f64 + 1.0).expect_err("limit plus one");
    }

    #[test]
    fn values_serialize_untagged() {
        let encoded = serde_json::to_string(&vec![GmlValue::Real(1.5), GmlValue::from("x")])
            .expect("values should serialize");
        assert_eq!(encoded, r#"[1.5,"x"]"#);
    }
}
