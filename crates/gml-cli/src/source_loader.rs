use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use gml_api::{GmlError, WorldFixture};
use tracing::debug;
use walkdir::WalkDir;

use crate::{cli_error, CliStage, LoadedScripts};

pub(crate) fn load_scripts_dir(scripts_dir: &str) -> Result<LoadedScripts, GmlError> {
    let root = resolve_scripts_dir(scripts_dir)?;
    read_scripts_from_dir(&root)
}

pub(crate) fn resolve_scripts_dir(scripts_dir: &str) -> Result<PathBuf, GmlError> {
    let path = PathBuf::from(scripts_dir);
    let absolute = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .map_err(|error| cli_error(CliStage::SourcePath, &path, error))?
            .join(&path)
    };

    if !absolute.exists() {
        return Err(GmlError::host(
            "CLI_SOURCE_NOT_FOUND",
            format!("scripts-dir does not exist: {}", absolute.display()),
        ));
    }

    if !absolute.is_dir() {
        return Err(GmlError::host(
            "CLI_SOURCE_NOT_DIR",
            format!("scripts-dir is not a directory: {}", absolute.display()),
        ));
    }

    Ok(absolute)
}

/// Every `.gml` file is one script named after its stem, unless its text
/// starts with `#define`, in which case it is a script library.
pub(crate) fn read_scripts_from_dir(scripts_dir: &Path) -> Result<LoadedScripts, GmlError> {
    let mut loaded = LoadedScripts {
        scripts: Vec::new(),
        libraries: Vec::new(),
    };
    let mut names = BTreeSet::new();

    for entry in WalkDir::new(scripts_dir).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|error| cli_error(CliStage::SourceScan, scripts_dir, error))?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().and_then(|ext| ext.to_str()) != Some("gml") {
            continue;
        }

        let relative = path
            .strip_prefix(scripts_dir)
            .map_err(|error| cli_error(CliStage::SourceScan, scripts_dir, error))?
            .to_string_lossy()
            .replace('\\', "/");
        let content = fs::read_to_string(path)
            .map_err(|error| cli_error(CliStage::SourceRead, path, error))?;

        if content.trim_start().starts_with("#define") {
            debug!(file = %relative, "loaded script library");
            loaded.libraries.push(content);
            continue;
        }

        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
            .to_string();
        if !names.insert(name.clone()) {
            return Err(GmlError::host(
                "CLI_SOURCE_DUPLICATE",
                format!("Script \"{}\" is defined by more than one file ({}).", name, relative),
            ));
        }
        debug!(file = %relative, script = %name, "loaded script");
        loaded.scripts.push((name, content));
    }

    if loaded.scripts.is_empty() && loaded.libraries.is_empty() {
        return Err(GmlError::host(
            "CLI_SOURCE_EMPTY",
            format!("No .gml files under {}", scripts_dir.display()),
        ));
    }

    Ok(loaded)
}

pub(crate) fn read_world_fixture(path: &str) -> Result<WorldFixture, GmlError> {
    let path = Path::new(path);
    let text = fs::read_to_string(path).map_err(|error| cli_error(CliStage::WorldRead, path, error))?;
    serde_json::from_str(&text).map_err(|error| cli_error(CliStage::WorldInvalid, path, error))
}
