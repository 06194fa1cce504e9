use std::ffi::OsString;

use clap::Parser;
use gml_api::{
    create_interpreter, create_simple_interpreter, run_entry, CreateInterpreterOptions, GmlError,
    SimpleWorld, World, WorldFixture,
};
use tracing::info;

mod cli_args;
mod error_map;
mod logging;
mod models;
mod source_loader;

pub(crate) use cli_args::{CheckArgs, Cli, Mode, RunArgs};
pub(crate) use error_map::{cli_error, emit_error, CliStage};
pub(crate) use logging::init_tracing;
pub(crate) use models::LoadedScripts;
pub(crate) use source_loader::{load_scripts_dir, read_world_fixture};
#[cfg(test)]
pub(crate) use source_loader::{read_scripts_from_dir, resolve_scripts_dir};

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    let verbose = matches!(&cli.command, Mode::Run(args) if args.verbose);
    init_tracing(verbose);
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> Result<i32, GmlError> {
    match cli.command {
        Mode::Check(args) => run_check(args),
        Mode::Run(args) => run_script(args),
    }
}

fn interpreter_options(loaded: LoadedScripts) -> CreateInterpreterOptions {
    CreateInterpreterOptions {
        scripts: loaded.scripts,
        script_libraries: loaded.libraries,
        ..CreateInterpreterOptions::default()
    }
}

fn run_check(args: CheckArgs) -> Result<i32, GmlError> {
    let loaded = load_scripts_dir(&args.scripts_dir)?;
    let interpreter = create_interpreter(SimpleWorld::new(), interpreter_options(loaded))?;

    println!("RESULT:OK");
    println!("SCRIPTS:{}", interpreter.script_count());
    for id in 0..interpreter.script_count() {
        if let Some(name) = interpreter.script_name(id) {
            println!("SCRIPT:{}:{}", id, name);
        }
    }
    Ok(0)
}

fn run_script(args: RunArgs) -> Result<i32, GmlError> {
    let loaded = load_scripts_dir(&args.scripts_dir)?;
    let fixture = match &args.world {
        Some(path) => read_world_fixture(path)?,
        None => WorldFixture::default(),
    };
    let mut interpreter = create_simple_interpreter(&fixture, interpreter_options(loaded))?;

    // The first fixture entity acts as `self`; an empty world runs without one.
    let self_id = interpreter.world().entities().first().copied().unwrap_or(0);
    info!(entry = args.entry.as_deref().unwrap_or("main"), self_id, "running entry script");
    let value = run_entry(&mut interpreter, args.entry.as_deref(), self_id, Vec::new())?;

    for message in &interpreter.world().messages {
        println!("MESSAGE_JSON:{}", to_json(message));
    }
    println!("RESULT:OK");
    println!("VALUE_JSON:{}", to_json(&value));
    Ok(0)
}

fn to_json(value: &impl serde::Serialize) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

#[cfg(test)]
mod tests;
