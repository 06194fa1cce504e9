use std::collections::BTreeSet;
use std::sync::OnceLock;

use gml_core::{ErrorKind, GmlError};
use regex::Regex;

/// One script cut out of a `#define` library file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptSource {
    pub name: String,
    pub body: String,
    /// 1-based line of the first body line within the library file.
    pub line: usize,
}

/// Splits a library file made of `#define name` sections.
///
/// Blank text before the first directive is ignored; anything else there is
/// rejected, as are duplicate names.
pub fn split_script_library(text: &str) -> Result<Vec<ScriptSource>, GmlError> {
    static DEFINE: OnceLock<Regex> = OnceLock::new();
    let regex = DEFINE.get_or_init(|| {
        Regex::new(r"(?m)^[ \t]*#define[ \t]+([A-Za-z_][A-Za-z0-9_]*)[ \t]*\r?$")
            .expect("define regex must compile")
    });

    let mut headers = Vec::new();
    for caps in regex.captures_iter(text) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        headers.push((whole.start(), whole.end(), name.as_str().to_string()));
    }

    let preamble_end = headers.first().map_or(text.len(), |(start, _, _)| *start);
    if !text[..preamble_end].trim().is_empty() {
        return Err(library_error(
            "Script library text must start with a #define line.",
        ));
    }

    let mut seen = BTreeSet::new();
    let mut scripts = Vec::with_capacity(headers.len());
    for (index, (_, header_end, name)) in headers.iter().enumerate() {
        if !seen.insert(name.clone()) {
            return Err(library_error(format!(
                "Script \"{}\" is defined more than once.",
                name
            )));
        }
        let body_start = (*header_end + 1).min(text.len());
        let body_end = headers
            .get(index + 1)
            .map_or(text.len(), |(start, _, _)| *start);
        let body = text[body_start..body_end.max(body_start)].to_string();
        let line = text[..body_start].matches('\n').count() + 1;
        scripts.push(ScriptSource {
            name: name.clone(),
            body,
            line,
        });
    }
    Ok(scripts)
}

fn library_error(message: impl Into<String>) -> GmlError {
    GmlError::new(ErrorKind::Syntax, "GML_SCRIPT_LIBRARY", message).into_fatal()
}
