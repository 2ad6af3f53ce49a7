use anyhow::{Context, Result};
use execgate_config::ConfigManager;

pub fn handle_config_command(manager: &ConfigManager) -> Result<()> {
    match manager.config_path() {
        Some(path) => println!("# effective configuration (last file: {})", path.display()),
        None => println!("# effective configuration (built-in defaults)"),
    }

    let rendered = toml::to_string_pretty(manager.config())
        .context("Failed to serialize effective configuration")?;
    print!("{rendered}");
    Ok(())
}
