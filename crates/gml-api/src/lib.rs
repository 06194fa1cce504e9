//! Host facade: build an interpreter over a world, load scripts and run code.

use std::collections::BTreeMap;

pub mod prelude;
mod rng;

pub use gml_core::{ArgKind, ArgSpec, ErrorKind, GmlError, GmlValue, SourceLocation};
pub use gml_parser::{split_script_library, ScriptSource, StartRule, SyntaxTree};
pub use gml_runtime::{
    BuiltinVar, Completion, EntityId, FunctionDescriptor, FunctionRegistry, HostRequest,
    Interpreter, InterpreterOptions, NativeCall, SimpleWorld, VarStore, World, WorldEvent,
    WorldFixture, DEFAULT_MAX_CALL_DEPTH,
};
pub use prelude::{prelude, DEFAULT_RANDOM_SEED};

#[derive(Default)]
pub struct CreateInterpreterOptions {
    /// Named script sources, registered first and in order.
    pub scripts: Vec<(String, String)>,
    /// `#define` library texts, registered after `scripts`.
    pub script_libraries: Vec<String>,
    /// Natives layered over the prelude; same names replace prelude entries.
    pub functions: Option<FunctionRegistry>,
    pub constants: BTreeMap<String, GmlValue>,
    pub builtins: Vec<BuiltinVar>,
    pub random_seed: Option<u32>,
    pub max_call_depth: Option<usize>,
}

pub fn compile(source: &str) -> Result<SyntaxTree, GmlError> {
    gml_parser::compile(source)
}

pub fn compile_expression(source: &str) -> Result<SyntaxTree, GmlError> {
    gml_parser::compile_with(source, StartRule::Expression)
}

pub fn create_interpreter<W: World>(
    world: W,
    options: CreateInterpreterOptions,
) -> Result<Interpreter<W>, GmlError> {
    let mut functions = prelude(options.random_seed.unwrap_or(DEFAULT_RANDOM_SEED));
    if let Some(extra) = options.functions {
        functions.extend(extra);
    }

    let mut interpreter = Interpreter::new(
        world,
        InterpreterOptions {
            functions,
            constants: options.constants,
            builtins: options.builtins,
            scripts: options.scripts,
            max_call_depth: options.max_call_depth.unwrap_or(DEFAULT_MAX_CALL_DEPTH),
        },
    )?;
    for library in &options.script_libraries {
        register_script_library(&mut interpreter, library)?;
    }
    Ok(interpreter)
}

/// Builds a [`SimpleWorld`] from a fixture; its class names become constants
/// unless the options already define them.
pub fn create_simple_interpreter(
    fixture: &WorldFixture,
    mut options: CreateInterpreterOptions,
) -> Result<Interpreter<SimpleWorld>, GmlError> {
    let world = SimpleWorld::from_fixture(fixture)?;
    for (name, value) in world.class_constants() {
        options.constants.entry(name).or_insert(value);
    }
    create_interpreter(world, options)
}

/// Registers every script of a `#define` library. Syntax errors report
/// lines of the library text, not of the script body.
pub fn register_script_library<W: World>(
    interpreter: &mut Interpreter<W>,
    text: &str,
) -> Result<Vec<usize>, GmlError> {
    let mut ids = Vec::new();
    for script in split_script_library(text)? {
        let id = interpreter
            .register_script(&script.name, &script.body)
            .map_err(|error| shift_lines(error, script.line - 1))?;
        ids.push(id);
    }
    Ok(ids)
}

pub fn execute<W: World>(
    interpreter: &mut Interpreter<W>,
    tree: &SyntaxTree,
    self_id: EntityId,
    other_id: EntityId,
    args: Vec<GmlValue>,
) -> Result<GmlValue, GmlError> {
    interpreter.execute(tree, self_id, other_id, args, false)
}

pub fn execute_string<W: World>(
    interpreter: &mut Interpreter<W>,
    source: &str,
    self_id: EntityId,
    other_id: EntityId,
    args: Vec<GmlValue>,
) -> Result<GmlValue, GmlError> {
    interpreter.execute_string(source, self_id, other_id, args)
}

pub fn dispatch_builtin<W: World>(
    interpreter: &mut Interpreter<W>,
    name: &str,
    self_id: EntityId,
    other_id: EntityId,
    args: Vec<GmlValue>,
) -> Result<GmlValue, GmlError> {
    interpreter.dispatch_builtin(name, self_id, other_id, args, false)
}

/// Runs the entry script as `self_id`; without an explicit name, `main` is used.
pub fn run_entry<W: World>(
    interpreter: &mut Interpreter<W>,
    entry: Option<&str>,
    self_id: EntityId,
    args: Vec<GmlValue>,
) -> Result<GmlValue, GmlError> {
    let id = resolve_entry_script(interpreter, entry)?;
    interpreter.run_script(id, self_id, self_id, args)
}

fn resolve_entry_script<W: World>(
    interpreter: &Interpreter<W>,
    explicit: Option<&str>,
) -> Result<usize, GmlError> {
    if let Some(entry) = explicit {
        return interpreter.script_id(entry).ok_or_else(|| {
            GmlError::resolution(
                "GML_UNKNOWN_SCRIPT",
                format!("Entry script \"{}\" is not registered.", entry),
            )
        });
    }
    interpreter.script_id("main").ok_or_else(|| {
        GmlError::resolution(
            "GML_UNKNOWN_SCRIPT",
            "Expected a script named \"main\" as default entry.",
        )
    })
}

fn shift_lines(mut error: GmlError, lines: usize) -> GmlError {
    if let Some(location) = error.location.as_mut() {
        location.line += lines;
    }
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scripts(entries: &[(&str, &str)]) -> Vec<(String, String)> {
        entries
            .iter()
            .map(|(name, source)| ((*name).to_string(), (*source).to_string()))
            .collect()
    }

    fn fixture() -> WorldFixture {
        serde_json::from_str(
            r#"{
                "classes": [
                    { "id": 0, "name": "obj_enemy" },
                    { "id": 1, "name": "obj_boss", "parent": "obj_enemy" },
                    { "id": 2, "name": "obj_player" }
                ],
                "entities": [
                    { "class": "obj_player", "vars": { "hp": 3 } },
                    { "class": "obj_boss", "vars": { "hp": 50 } }
                ],
                "answers": ["Ada"]
            }"#,
        )
        .expect("fixture json should parse")
    }

    #[test]
    fn compile_rejects_partial_input() {
        compile("a = 1;").expect("compile should pass");
        compile_expression("1 + 2").expect("expression should compile");
        let error = compile("a = 1; )").expect_err("trailing tokens should fail");
        assert_eq!(error.kind, ErrorKind::Syntax);
    }

    #[test]
    fn prelude_natives_are_available() {
        let mut interpreter = create_interpreter(SimpleWorld::new(), CreateInterpreterOptions::default())
            .expect("interpreter should build");
        let value = execute_string(
            &mut interpreter,
            "return string(1.5) + string(2) + string(real('  4kg')) + string(string_length('abc'));",
            0,
            0,
            Vec::new(),
        )
        .expect("run should pass");
        assert_eq!(value, GmlValue::from("1.50243"));

        let value = execute_string(
            &mut interpreter,
            "return string_repeat('ab', 2.7) + string(abs(-2) + floor(1.9)) + string(choose(7, 7));",
            0,
            0,
            Vec::new(),
        )
        .expect("run should pass");
        assert_eq!(value, GmlValue::from("abab37"));
    }

    #[test]
    fn oversized_string_repeat_fails_at_the_call() {
        let mut interpreter = create_interpreter(SimpleWorld::new(), CreateInterpreterOptions::default())
            .expect("interpreter should build");
        let error = execute_string(
            &mut interpreter,
            "x = 1;\nx = string_repeat('ab', 1000000000000000000);",
            0,
            0,
            Vec::new(),
        )
        .expect_err("huge repeat should fail");
        assert_eq!(error.code, "GML_STRING_TOO_LONG");
        assert_eq!(error.location.expect("location should be set").line, 2);
    }

    #[test]
    fn host_requests_reach_the_world() {
        let mut interpreter = create_interpreter(SimpleWorld::new(), CreateInterpreterOptions::default())
            .expect("interpreter should build");
        execute_string(
            &mut interpreter,
            "show_message(12); sleep(250); show_debug_message('done');",
            0,
            0,
            Vec::new(),
        )
        .expect("run should pass");
        assert_eq!(interpreter.world().messages, vec!["12".to_string()]);
        assert_eq!(interpreter.world().slept_millis, 250.0);
    }

    #[test]
    fn nested_execution_uses_scripts_and_strings() {
        let mut interpreter = create_interpreter(
            SimpleWorld::new(),
            CreateInterpreterOptions {
                scripts: scripts(&[("twice", "return argument0 * 2;")]),
                ..CreateInterpreterOptions::default()
            },
        )
        .expect("interpreter should build");
        let value = execute_string(
            &mut interpreter,
            "return script_execute(0, 4) + execute_string('return argument0;', 1);",
            0,
            0,
            Vec::new(),
        )
        .expect("run should pass");
        assert_eq!(value, GmlValue::from(9));

        let error = execute_string(&mut interpreter, "script_execute(-1);", 0, 0, Vec::new())
            .expect_err("negative id should fail");
        assert_eq!(error.code, "GML_UNKNOWN_SCRIPT");
    }

    #[test]
    fn host_functions_override_prelude_entries() {
        let mut functions = FunctionRegistry::new();
        functions.register(FunctionDescriptor::new("string", None, |_, _| {
            Ok(GmlValue::from("custom").into())
        }));
        let mut interpreter = create_interpreter(
            SimpleWorld::new(),
            CreateInterpreterOptions {
                functions: Some(functions),
                ..CreateInterpreterOptions::default()
            },
        )
        .expect("interpreter should build");
        let value = dispatch_builtin(&mut interpreter, "string", 0, 0, vec![GmlValue::from(1)])
            .expect("dispatch should pass");
        assert_eq!(value, GmlValue::from("custom"));
    }

    #[test]
    fn libraries_register_scripts_after_named_sources() {
        let mut interpreter = create_interpreter(
            SimpleWorld::new(),
            CreateInterpreterOptions {
                scripts: scripts(&[("helper", "return 1;")]),
                script_libraries: vec![
                    "#define add\nreturn argument0 + argument1;\n#define main\nreturn add(2, 3) + helper();\n"
                        .to_string(),
                ],
                ..CreateInterpreterOptions::default()
            },
        )
        .expect("interpreter should build");
        assert_eq!(interpreter.script_id("add"), Some(1));
        let value = run_entry(&mut interpreter, None, 0, Vec::new()).expect("main should run");
        assert_eq!(value, GmlValue::from(6));
        let value = run_entry(&mut interpreter, Some("add"), 0, vec![GmlValue::from(1), GmlValue::from(1)])
            .expect("explicit entry should run");
        assert_eq!(value, GmlValue::from(2));
    }

    #[test]
    fn library_syntax_errors_report_library_lines() {
        let mut interpreter = create_interpreter(SimpleWorld::new(), CreateInterpreterOptions::default())
            .expect("interpreter should build");
        let error = register_script_library(&mut interpreter, "#define a\nx = 1;\n#define b\n\ny = ;\n")
            .expect_err("syntax error should fail");
        assert_eq!(error.location.expect("location should be set").line, 5);
    }

    #[test]
    fn entry_resolution_reports_missing_scripts() {
        let mut interpreter = create_interpreter(SimpleWorld::new(), CreateInterpreterOptions::default())
            .expect("interpreter should build");
        let error = run_entry(&mut interpreter, None, 0, Vec::new()).expect_err("no main");
        assert_eq!(error.message, "Expected a script named \"main\" as default entry.");
        let error = run_entry(&mut interpreter, Some("missing"), 0, Vec::new()).expect_err("missing");
        assert_eq!(error.message, "Entry script \"missing\" is not registered.");
    }

    #[test]
    fn simple_interpreter_exposes_fixture_classes() {
        let mut interpreter = create_simple_interpreter(&fixture(), CreateInterpreterOptions::default())
            .expect("interpreter should build");
        let player = interpreter.world().entities()[0];
        let boss = interpreter.world().entities()[1];
        execute_string(
            &mut interpreter,
            "obj_enemy.hp -= 10; name = get_name(); hp += 1;",
            player,
            player,
            Vec::new(),
        )
        .expect_err("get_name is not a native");
        assert_eq!(interpreter.world().var(boss, "hp"), Some(GmlValue::from(40)));

        let tree = compile("hp += 1; return obj_boss;").expect("compile should pass");
        let value = execute(&mut interpreter, &tree, player, player, Vec::new()).expect("run");
        assert_eq!(value, GmlValue::from(1));
        assert_eq!(interpreter.world().var(player, "hp"), Some(GmlValue::from(4)));
    }
}
