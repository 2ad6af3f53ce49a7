//! execgate - decide whether an agent-issued shell command may run unattended.
//!
//! Thin binary entry point that delegates to the CLI handlers.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

mod cli;
mod main_helpers;

use cli::args::{Cli, Commands};

fn main() -> Result<ExitCode> {
    let args = Cli::parse();

    main_helpers::initialize_tracing(args.debug);

    let manager = cli::load_config(&args)?;

    match &args.command {
        Commands::Check(options) => cli::check::handle_check_command(&manager, options),
        Commands::Profiles { binary } => {
            cli::profiles::handle_profiles_command(binary.as_deref());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config => {
            cli::config::handle_config_command(&manager)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
