use crate::shell::Shell;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "whence", version, about = "Find out which package provides a missing command")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
    /// More log output; repeat for more detail
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    /// Read configuration from this file as well
    #[arg(long, global = true, env = "WHENCE_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show which packages provide the given commands
    Which(WhichArgs),
    /// Refresh the executables index from the installed package manager
    #[command(name = "which-update")]
    WhichUpdate(UpdateArgs),
    /// Print the command-not-found hook for the current shell
    Init(InitArgs),
}

#[derive(Debug, Args)]
pub struct WhichArgs {
    #[arg(required = true, value_name = "COMMAND")]
    pub commands: Vec<String>,
    /// Explain how to install a provider instead of listing them
    #[arg(long)]
    pub explain: bool,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Index file to update instead of the configured one
    #[arg(value_name = "INDEX")]
    pub path: Option<PathBuf>,
    /// Print statistics about the index instead of updating it
    #[arg(long, conflicts_with_all = ["commit", "install_missing", "update_existing", "summary_file"])]
    pub stats: bool,
    /// Commit the updated index with git
    #[arg(long)]
    pub commit: bool,
    /// Download archives for packages that aren't indexed yet
    #[arg(long)]
    pub install_missing: bool,
    /// Download archives for indexed packages with a new version
    #[arg(long)]
    pub update_existing: bool,
    /// Stop downloading archives after this many
    #[arg(long, value_name = "N")]
    pub max_downloads: Option<usize>,
    /// Consider every package, not just installed ones
    #[arg(long)]
    pub eval_all: bool,
    /// Append a markdown summary of the changes to this file
    #[arg(long, value_name = "PATH")]
    pub summary_file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Shell to set up; detected from the environment by default
    #[arg(long, value_enum)]
    pub shell: Option<Shell>,
}
