use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "execgate")]
#[command(about = "Decide whether a shell command may run without human approval")]
#[command(version)]
pub struct Cli {
    /// Configuration file to use instead of the workspace config
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Workspace directory to read `execgate.toml` from
    #[arg(long, global = true, value_name = "DIR")]
    pub workspace: Option<PathBuf>,

    /// Override a configuration value, e.g. `-c exec.ask=always`
    #[arg(short = 'c', long = "set", global = true, value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,

    /// Enable debug logging when RUST_LOG is not set
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Evaluate a command against the configured policy
    Check(CheckOptions),

    /// Show the safe-bin usage profiles
    Profiles {
        /// Show a single binary's profile
        binary: Option<String>,
    },

    /// Print the effective merged configuration
    Config,
}

#[derive(Debug, Args)]
pub struct CheckOptions {
    /// Directory the command would run in (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Platform to evaluate for, e.g. `linux`, `darwin`, `win32`
    #[arg(long, value_name = "NAME")]
    pub platform: Option<String>,

    /// Print the evaluation as JSON
    #[arg(long)]
    pub json: bool,

    /// The command text; multiple words are joined with spaces
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

impl CheckOptions {
    pub fn command_text(&self) -> String {
        self.command.join(" ")
    }
}
