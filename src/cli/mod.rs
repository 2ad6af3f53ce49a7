use anyhow::{Context, Result, anyhow};
use execgate_config::{ConfigBuilder, ConfigManager, parse_override};

pub mod args;
pub mod check;
pub mod config;
pub mod profiles;

/// Load configuration layers according to the global flags.
pub fn load_config(args: &args::Cli) -> Result<ConfigManager> {
    let overrides = args
        .overrides
        .iter()
        .map(|raw| {
            parse_override(raw)
                .ok_or_else(|| anyhow!("invalid override '{raw}', expected KEY=VALUE"))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut builder = ConfigBuilder::new().cli_overrides(&overrides);
    if let Some(workspace) = &args.workspace {
        builder = builder.workspace(workspace.clone());
    }
    if let Some(config) = &args.config {
        builder = builder.config_file(config.clone());
    }

    builder.build().context("Failed to load configuration")
}
