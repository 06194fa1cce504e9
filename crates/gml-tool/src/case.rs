use std::collections::BTreeMap;

use gml_api::{GmlValue, WorldFixture};
use serde::Deserialize;

pub const TESTCASE_SCHEMA_V1: &str = "gml-tool-case.v1";

/// One scenario: a world, scripts, the code to run and what must hold afterwards.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub schema_version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub world: WorldFixture,
    #[serde(default)]
    pub scripts: Vec<ScriptCase>,
    /// A `#define` library registered after `scripts`.
    #[serde(default)]
    pub library: Option<String>,
    pub entry: String,
    /// Index into the fixture entities; defaults to the first one.
    #[serde(default)]
    pub self_entity: Option<usize>,
    #[serde(default)]
    pub args: Vec<GmlValue>,
    #[serde(default)]
    pub expect: Expectation,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScriptCase {
    pub name: String,
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expectation {
    #[serde(default)]
    pub result: Option<GmlValue>,
    #[serde(default)]
    pub globals: BTreeMap<String, GmlValue>,
    #[serde(default)]
    pub instances: Vec<ExpectedInstance>,
    #[serde(default)]
    pub messages: Option<Vec<String>>,
    #[serde(default)]
    pub error: Option<ExpectedError>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExpectedInstance {
    /// Index into the fixture entities.
    pub entity: usize,
    pub vars: BTreeMap<String, GmlValue>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExpectedError {
    pub code: String,
    #[serde(default)]
    pub line: Option<usize>,
    #[serde(default)]
    pub column: Option<usize>,
}

#[cfg(test)]
mod case_tests {
    use super::*;

    #[test]
    fn testcase_deserialize_applies_defaults() {
        let parsed: TestCase = serde_json::from_str(
            r#"{
  "schemaVersion": "gml-tool-case.v1",
  "entry": "x = 1;"
}"#,
        )
        .expect("testcase should deserialize");

        assert_eq!(parsed.schema_version, TESTCASE_SCHEMA_V1);
        assert!(parsed.scripts.is_empty());
        assert!(parsed.world.entities.is_empty());
        assert_eq!(parsed.self_entity, None);
        assert_eq!(parsed.expect, Expectation::default());
    }

    #[test]
    fn expectation_deserialize_reads_every_section() {
        let parsed: Expectation = serde_json::from_str(
            r#"{
  "result": "done",
  "globals": {"g": 2},
  "instances": [{"entity": 1, "vars": {"hp": 5}}],
  "messages": ["hi"],
  "error": {"code": "GML_TYPE_MISMATCH", "line": 2}
}"#,
        )
        .expect("expectation should deserialize");

        assert_eq!(parsed.result, Some(GmlValue::from("done")));
        assert_eq!(parsed.globals.get("g"), Some(&GmlValue::from(2)));
        assert_eq!(parsed.instances[0].entity, 1);
        assert_eq!(parsed.messages, Some(vec!["hi".to_string()]));
        let error = parsed.error.expect("error should be present");
        assert_eq!(error.line, Some(2));
        assert_eq!(error.column, None);
    }
}
