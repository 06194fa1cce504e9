use super::*;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time should be monotonic")
        .as_nanos();
    std::env::temp_dir().join(format!("gml-rs-{}-{}", name, nanos))
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("parent should be created");
    }
    fs::write(path, content).expect("file should be written");
}

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("arena")
}

#[test]
fn resolve_scripts_dir_validates_existence_and_directory() {
    let missing = temp_path("missing-dir");
    let missing_err = resolve_scripts_dir(missing.to_string_lossy().as_ref())
        .expect_err("missing path should fail");
    assert_eq!(missing_err.code, "CLI_SOURCE_NOT_FOUND");

    let file_path = temp_path("plain-file");
    write_file(&file_path, "x");
    let file_err = resolve_scripts_dir(file_path.to_string_lossy().as_ref())
        .expect_err("file path should fail");
    assert_eq!(file_err.code, "CLI_SOURCE_NOT_DIR");
}

#[test]
fn read_scripts_from_dir_splits_scripts_and_libraries() {
    let root = temp_path("scripts");
    write_file(&root.join("main.gml"), "return helper(1);");
    write_file(&root.join("nested").join("zeta.gml"), "return 0;");
    write_file(
        &root.join("lib.gml"),
        "\n#define helper\nreturn argument0 + 1;\n",
    );
    write_file(&root.join("notes.txt"), "ignored");

    let loaded = read_scripts_from_dir(&root).expect("scripts should load");
    let names: Vec<&str> = loaded.scripts.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["main", "zeta"]);
    assert_eq!(loaded.libraries.len(), 1);
}

#[test]
fn read_scripts_from_dir_rejects_empty_and_duplicate_sources() {
    let empty = temp_path("empty");
    fs::create_dir_all(&empty).expect("dir should be created");
    let error = read_scripts_from_dir(&empty).expect_err("empty dir should fail");
    assert_eq!(error.code, "CLI_SOURCE_EMPTY");

    let duplicate = temp_path("duplicate");
    write_file(&duplicate.join("a").join("main.gml"), "x = 1;");
    write_file(&duplicate.join("b").join("main.gml"), "x = 2;");
    let error = read_scripts_from_dir(&duplicate).expect_err("duplicate should fail");
    assert_eq!(error.code, "CLI_SOURCE_DUPLICATE");
}

#[test]
fn check_command_succeeds_for_fixture_scripts() {
    let scripts_dir = fixtures_dir().join("scripts").to_string_lossy().to_string();
    let code = run_cli_from_args(["gml", "check", "--scripts-dir", scripts_dir.as_str()]);
    assert_eq!(code, 0);
}

#[test]
fn run_command_executes_entry_against_world() {
    let scripts_dir = fixtures_dir().join("scripts").to_string_lossy().to_string();
    let world = fixtures_dir().join("world.json").to_string_lossy().to_string();
    let code = run_cli_from_args([
        "gml",
        "run",
        "--scripts-dir",
        scripts_dir.as_str(),
        "--world",
        world.as_str(),
    ]);
    assert_eq!(code, 0);
}

#[test]
fn run_command_reports_script_errors() {
    let root = temp_path("failing");
    write_file(&root.join("main.gml"), "x = 1 + 'a';");
    let root = root.to_string_lossy().to_string();
    let code = run_cli_from_args(["gml", "run", "--scripts-dir", root.as_str()]);
    assert_eq!(code, 1);

    let world = temp_path("bad-world.json");
    write_file(&world, "{");
    let world = world.to_string_lossy().to_string();
    let code = run_cli_from_args([
        "gml",
        "run",
        "--scripts-dir",
        root.as_str(),
        "--world",
        world.as_str(),
    ]);
    assert_eq!(code, 1);
}

#[test]
fn invalid_arguments_use_clap_exit_code() {
    assert_eq!(run_cli_from_args(["gml", "unknown"]), 2);
}
