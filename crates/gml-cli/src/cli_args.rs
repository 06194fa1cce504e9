use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "gml")]
#[command(about = "GML script checker and runner")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    /// Compile every script under a directory.
    Check(CheckArgs),
    /// Run an entry script against a world fixture.
    Run(RunArgs),
}

#[derive(Debug, Args)]
pub(crate) struct CheckArgs {
    #[arg(long = "scripts-dir")]
    pub(crate) scripts_dir: String,
}

#[derive(Debug, Args)]
pub(crate) struct RunArgs {
    #[arg(long = "scripts-dir")]
    pub(crate) scripts_dir: String,
    #[arg(long = "entry")]
    pub(crate) entry: Option<String>,
    #[arg(long = "world")]
    pub(crate) world: Option<String>,
    #[arg(long = "verbose")]
    pub(crate) verbose: bool,
}
