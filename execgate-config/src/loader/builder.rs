use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::loader::layers::{ConfigLayerEntry, ConfigLayerSource};
use crate::loader::manager::{ConfigManager, config_path_from_env, default_user_config_path};

/// Builder for a [`ConfigManager`] with custom locations and overrides.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    workspace: Option<PathBuf>,
    config_file: Option<PathBuf>,
    user_config: Option<Option<PathBuf>>,
    cli_overrides: Vec<(String, toml::Value)>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn workspace(mut self, path: PathBuf) -> Self {
        self.workspace = Some(path);
        self
    }

    /// Use a specific file instead of the workspace layers.
    pub fn config_file(mut self, path: PathBuf) -> Self {
        self.config_file = Some(path);
        self
    }

    /// Replace the `~/.execgate/execgate.toml` user layer; `None` skips it.
    pub fn user_config(mut self, path: Option<PathBuf>) -> Self {
        self.user_config = Some(path);
        self
    }

    /// Add a runtime override such as `("exec.ask", "always")`.
    pub fn cli_override(mut self, key: String, value: toml::Value) -> Self {
        self.cli_overrides.push((key, value));
        self
    }

    /// Add overrides from string pairs.
    ///
    /// Values are parsed as TOML. If parsing fails, they are treated as strings.
    pub fn cli_overrides(mut self, overrides: &[(String, String)]) -> Self {
        for (key, value) in overrides {
            self.cli_overrides
                .push((key.clone(), parse_override_value(value)));
        }
        self
    }

    pub fn build(self) -> Result<ConfigManager> {
        let user_config = self.user_config.unwrap_or_else(default_user_config_path);
        let config_file = self.config_file.or_else(config_path_from_env);

        let mut manager = if let Some(config_file) = config_file {
            ConfigManager::load_from_file_with_user(config_file, user_config.as_deref())?
        } else {
            let workspace = match self.workspace {
                Some(workspace) => workspace,
                None => std::env::current_dir().context("Failed to resolve current directory")?,
            };
            ConfigManager::load_from_workspace_with_user(workspace, user_config.as_deref())?
        };

        if !self.cli_overrides.is_empty() {
            let mut runtime_toml = toml::Table::new();
            for (key, value) in self.cli_overrides {
                insert_dotted_key(&mut runtime_toml, &key, value);
            }

            manager.layer_stack.push(ConfigLayerEntry::new(
                ConfigLayerSource::Runtime,
                toml::Value::Table(runtime_toml),
            ));

            manager.config = ConfigManager::resolve(&manager.layer_stack)
                .context("Configuration failed after runtime overrides")?;
        }

        Ok(manager)
    }
}

/// Split a `key=value` override, trimming both sides.
pub fn parse_override(raw: &str) -> Option<(String, String)> {
    let (key, value) = raw.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), value.trim().to_string()))
}

fn parse_override_value(value: &str) -> toml::Value {
    // A bare TOML value is not a document, so parse it as one assignment.
    format!("value = {value}")
        .parse::<toml::Table>()
        .ok()
        .and_then(|mut table| table.remove("value"))
        .unwrap_or_else(|| toml::Value::String(value.to_string()))
}

fn insert_dotted_key(table: &mut toml::Table, key: &str, value: toml::Value) {
    let Some((head, rest)) = key.split_once('.') else {
        table.insert(key.to_string(), value);
        return;
    };

    if !matches!(table.get(head), Some(toml::Value::Table(_))) {
        table.insert(head.to_string(), toml::Value::Table(toml::Table::new()));
    }
    if let Some(toml::Value::Table(child)) = table.get_mut(head) {
        insert_dotted_key(child, rest, value);
    }
}
