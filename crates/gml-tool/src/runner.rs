use std::collections::BTreeMap;
use std::path::Path;

use gml_api::{
    create_simple_interpreter, execute_string, CreateInterpreterOptions, GmlError, GmlValue,
    VarStore, World,
};

use crate::source::{collect_case_files, read_test_case};
use crate::{Expectation, GmlToolError, TestCase};

const CASE_RANDOM_SEED: u32 = 1;

/// What a case run left behind.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub outcome: Result<GmlValue, GmlError>,
    /// Scalar globals; declared globals win over `global.` fields of the same name.
    pub globals: BTreeMap<String, GmlValue>,
    /// Scalar variables of every live entity, in entity order.
    pub instances: Vec<BTreeMap<String, GmlValue>>,
    pub messages: Vec<String>,
}

pub fn run_case(case: &TestCase) -> Result<RunReport, GmlToolError> {
    let mut options = CreateInterpreterOptions {
        scripts: case
            .scripts
            .iter()
            .map(|script| (script.name.clone(), script.source.clone()))
            .collect(),
        random_seed: Some(CASE_RANDOM_SEED),
        ..CreateInterpreterOptions::default()
    };
    if let Some(library) = &case.library {
        options.script_libraries.push(library.clone());
    }
    let mut interpreter = create_simple_interpreter(&case.world, options)?;

    let entities = interpreter.world().entities();
    let self_id = match case.self_entity {
        Some(index) => *entities.get(index).ok_or(GmlToolError::MissingEntity {
            index,
            count: entities.len(),
        })?,
        None => entities.first().copied().unwrap_or(0),
    };

    let outcome = execute_string(&mut interpreter, &case.entry, self_id, self_id, case.args.clone());

    let mut globals = scalars(interpreter.global_object());
    globals.extend(scalars(interpreter.globals()));
    let world = interpreter.world();
    let instances = world
        .entities()
        .into_iter()
        .map(|id| world.vars(id).map(scalars).unwrap_or_default())
        .collect();

    Ok(RunReport {
        outcome,
        globals,
        instances,
        messages: world.messages.clone(),
    })
}

fn scalars(store: &VarStore) -> BTreeMap<String, GmlValue> {
    store
        .names()
        .filter_map(|name| store.get_scalar(name).map(|value| (name.to_string(), value)))
        .collect()
}

pub fn check_expectations(report: &RunReport, expect: &Expectation) -> Result<(), GmlToolError> {
    match (&report.outcome, &expect.error) {
        (Ok(_), Some(expected)) => {
            return Err(GmlToolError::UnexpectedSuccess {
                expected_code: expected.code.clone(),
            })
        }
        (Err(error), None) => return Err(GmlToolError::UnexpectedError(error.to_string())),
        (Err(error), Some(expected)) => {
            let location = error.location.as_ref();
            let line = location.map(|location| location.line);
            let column = location.map(|location| location.column);
            let matches = error.code == expected.code
                && expected.line.map_or(true, |want| line == Some(want))
                && expected.column.map_or(true, |want| column == Some(want));
            if !matches {
                return Err(GmlToolError::ErrorMismatch {
                    expected: format!("{} at {:?}:{:?}", expected.code, expected.line, expected.column),
                    actual: format!("{} at {:?}:{:?} ({})", error.code, line, column, error.message),
                });
            }
        }
        (Ok(value), None) => {
            if let Some(expected) = &expect.result {
                compare("result", "value", Some(expected), Some(value))?;
            }
        }
    }

    for (name, expected) in &expect.globals {
        compare("global", name, Some(expected), report.globals.get(name))?;
    }

    for instance in &expect.instances {
        let vars = report.instances.get(instance.entity).ok_or(GmlToolError::MissingEntity {
            index: instance.entity,
            count: report.instances.len(),
        })?;
        let scope = format!("instance {}", instance.entity);
        for (name, expected) in &instance.vars {
            compare(&scope, name, Some(expected), vars.get(name))?;
        }
    }

    if let Some(expected) = &expect.messages {
        if expected != &report.messages {
            return Err(GmlToolError::MessageMismatch {
                expected: expected.clone(),
                actual: report.messages.clone(),
            });
        }
    }

    Ok(())
}

fn compare(
    scope: &str,
    name: &str,
    expected: Option<&GmlValue>,
    actual: Option<&GmlValue>,
) -> Result<(), GmlToolError> {
    if expected == actual {
        return Ok(());
    }
    Err(GmlToolError::ValueMismatch {
        scope: scope.to_string(),
        name: name.to_string(),
        expected: describe(expected),
        actual: describe(actual),
    })
}

fn describe(value: Option<&GmlValue>) -> String {
    match value {
        Some(value) => serde_json::to_string(value).unwrap_or_else(|_| value.to_string()),
        None => "<missing>".to_string(),
    }
}

pub fn assert_case(case_path: &Path) -> Result<(), GmlToolError> {
    let case = read_test_case(case_path)?;
    let report = run_case(&case)?;
    check_expectations(&report, &case.expect)
}

/// Asserts every case under `cases_dir`, returning how many ran.
pub fn assert_cases_in_dir(cases_dir: &Path) -> Result<usize, GmlToolError> {
    let files = collect_case_files(cases_dir)?;
    for path in &files {
        assert_case(path).map_err(|source| GmlToolError::CaseFailed {
            path: path.clone(),
            source: Box::new(source),
        })?;
    }
    Ok(files.len())
}

#[cfg(test)]
mod runner_tests {
    use super::*;

    fn case(json: &str) -> TestCase {
        serde_json::from_str(json).expect("testcase should deserialize")
    }

    #[test]
    fn run_case_collects_globals_instances_and_messages() {
        let case = case(
            r#"{
  "schemaVersion": "gml-tool-case.v1",
  "world": {
    "classes": [{"id": 0, "name": "obj_a"}],
    "entities": [{"class": "obj_a", "vars": {"hp": 1}}, {"class": "obj_a"}]
  },
  "entry": "global.g = 1; globalvar d; d = 2; hp += 1; show_message('hi'); return 'ok';"
}"#,
        );
        let report = run_case(&case).expect("run should pass");
        assert_eq!(report.outcome, Ok(GmlValue::from("ok")));
        assert_eq!(report.globals.get("g"), Some(&GmlValue::from(1)));
        assert_eq!(report.globals.get("d"), Some(&GmlValue::from(2)));
        assert_eq!(report.instances.len(), 2);
        assert_eq!(report.instances[0].get("hp"), Some(&GmlValue::from(2)));
        assert!(report.instances[1].is_empty());
        assert_eq!(report.messages, vec!["hi".to_string()]);
    }

    #[test]
    fn run_case_rejects_missing_self_entity() {
        let case = case(
            r#"{"schemaVersion": "gml-tool-case.v1", "entry": "x = 1;", "selfEntity": 2}"#,
        );
        let error = run_case(&case).expect_err("missing entity should fail");
        assert!(matches!(error, GmlToolError::MissingEntity { index: 2, count: 0 }));
    }

    #[test]
    fn run_case_surfaces_setup_errors() {
        let case = case(
            r#"{
  "schemaVersion": "gml-tool-case.v1",
  "scripts": [{"name": "broken", "source": "x = ;"}],
  "entry": "return 1;"
}"#,
        );
        let error = run_case(&case).expect_err("broken script should fail");
        assert!(matches!(error, GmlToolError::Engine(_)));
    }

    #[test]
    fn check_expectations_reports_each_kind_of_mismatch() {
        let ok_case = case(
            r#"{
  "schemaVersion": "gml-tool-case.v1",
  "world": {"classes": [{"id": 0, "name": "obj_a"}], "entities": [{"class": "obj_a"}]},
  "entry": "v = 3; return 1;"
}"#,
        );
        let report = run_case(&ok_case).expect("run should pass");

        let mut expect = Expectation {
            result: Some(GmlValue::from("1")),
            ..Expectation::default()
        };
        let error = check_expectations(&report, &expect).expect_err("result type differs");
        assert!(matches!(error, GmlToolError::ValueMismatch { .. }));

        expect.result = Some(GmlValue::from(1));
        check_expectations(&report, &expect).expect("result should match");

        expect.globals.insert("v".to_string(), GmlValue::from(3));
        let error = check_expectations(&report, &expect).expect_err("v is an instance var");
        assert!(error.to_string().contains("<missing>"));

        expect.globals.clear();
        expect.error = Some(crate::ExpectedError {
            code: "GML_TYPE_MISMATCH".to_string(),
            line: None,
            column: None,
        });
        let error = check_expectations(&report, &expect).expect_err("no error happened");
        assert!(matches!(error, GmlToolError::UnexpectedSuccess { .. }));
    }

    #[test]
    fn check_expectations_matches_error_code_and_position() {
        let failing = case(
            r#"{
  "schemaVersion": "gml-tool-case.v1",
  "world": {"classes": [{"id": 0, "name": "obj_a"}], "entities": [{"class": "obj_a"}]},
  "entry": "a = 1;\nb = 'x' - 1;"
}"#,
        );
        let report = run_case(&failing).expect("run should produce a report");
        let error = check_expectations(&report, &Expectation::default())
            .expect_err("unexpected error should fail");
        assert!(matches!(error, GmlToolError::UnexpectedError(_)));

        let mut expect = Expectation {
            error: Some(crate::ExpectedError {
                code: "GML_TYPE_MISMATCH".to_string(),
                line: Some(2),
                column: Some(5),
            }),
            ..Expectation::default()
        };
        check_expectations(&report, &expect).expect("error should match");

        if let Some(error) = expect.error.as_mut() {
            error.column = Some(9);
        }
        let error = check_expectations(&report, &expect).expect_err("column differs");
        assert!(matches!(error, GmlToolError::ErrorMismatch { .. }));
    }
}
