/// Script sources found under a scripts directory, in file-name order.
#[derive(Debug, Clone, Default)]
pub(crate) struct LoadedScripts {
    pub(crate) scripts: Vec<(String, String)>,
    pub(crate) libraries: Vec<String>,
}
