use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::loader::config::ExecGateConfig;
use crate::loader::layers::{ConfigLayerEntry, ConfigLayerSource, ConfigLayerStack};

/// File name looked up in the home and workspace config locations.
pub const CONFIG_FILE_NAME: &str = "execgate.toml";
/// Directory holding per-user and per-workspace config.
pub const CONFIG_DIR_NAME: &str = ".execgate";
/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "EXECGATE_CONFIG_PATH";

/// `~/.execgate/execgate.toml`, when a home directory is known.
pub fn default_user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Explicit config file from [`CONFIG_PATH_ENV`], ignoring blank values.
pub fn config_path_from_env() -> Option<PathBuf> {
    let value = std::env::var(CONFIG_PATH_ENV).ok()?;
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
}

/// Loads, merges and validates configuration layers.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    pub(crate) config: ExecGateConfig,
    config_path: Option<PathBuf>,
    workspace_root: Option<PathBuf>,
    pub(crate) layer_stack: ConfigLayerStack,
}

impl ConfigManager {
    /// Load from [`CONFIG_PATH_ENV`] if set, else from the current directory.
    pub fn load() -> Result<Self> {
        if let Some(config_path) = config_path_from_env() {
            return Self::load_from_file(&config_path).with_context(|| {
                format!(
                    "Failed to load configuration from {CONFIG_PATH_ENV}={}",
                    config_path.display()
                )
            });
        }

        Self::load_from_workspace(std::env::current_dir()?)
    }

    /// Load the user layer plus the workspace layers under `workspace`.
    pub fn load_from_workspace(workspace: impl AsRef<Path>) -> Result<Self> {
        Self::load_from_workspace_with_user(workspace, default_user_config_path().as_deref())
    }

    /// Load the user layer plus one explicit file in place of the workspace layers.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_from_file_with_user(path, default_user_config_path().as_deref())
    }

    pub(crate) fn load_from_workspace_with_user(
        workspace: impl AsRef<Path>,
        user_config: Option<&Path>,
    ) -> Result<Self> {
        let workspace_root = workspace.as_ref().to_path_buf();
        let mut layer_stack = ConfigLayerStack::default();
        Self::push_user_layer(&mut layer_stack, user_config)?;

        // .execgate/execgate.toml, then execgate.toml at the root
        let candidates = [
            workspace_root.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME),
            workspace_root.join(CONFIG_FILE_NAME),
        ];
        for file in candidates {
            if file.is_file() {
                let toml = Self::load_toml_from_file(&file)?;
                layer_stack.push(ConfigLayerEntry::new(
                    ConfigLayerSource::Workspace { file },
                    toml,
                ));
            }
        }

        let config =
            Self::resolve(&layer_stack).context("Failed to load workspace configuration")?;

        Ok(Self {
            config,
            config_path: layer_stack.last_file().map(Path::to_path_buf),
            workspace_root: Some(workspace_root),
            layer_stack,
        })
    }

    pub(crate) fn load_from_file_with_user(
        path: impl AsRef<Path>,
        user_config: Option<&Path>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let mut layer_stack = ConfigLayerStack::default();
        Self::push_user_layer(&mut layer_stack, user_config)?;

        let toml = Self::load_toml_from_file(path)?;
        layer_stack.push(ConfigLayerEntry::new(
            ConfigLayerSource::Workspace {
                file: path.to_path_buf(),
            },
            toml,
        ));

        let config = Self::resolve(&layer_stack).with_context(|| {
            format!(
                "Failed to load effective config with file: {}",
                path.display()
            )
        })?;

        Ok(Self {
            config,
            config_path: Some(path.to_path_buf()),
            workspace_root: path.parent().map(Path::to_path_buf),
            layer_stack,
        })
    }

    fn push_user_layer(
        layer_stack: &mut ConfigLayerStack,
        user_config: Option<&Path>,
    ) -> Result<()> {
        let Some(file) = user_config.filter(|file| file.is_file()) else {
            return Ok(());
        };

        let toml = Self::load_toml_from_file(file)?;
        layer_stack.push(ConfigLayerEntry::new(
            ConfigLayerSource::User {
                file: file.to_path_buf(),
            },
            toml,
        ));
        Ok(())
    }

    fn load_toml_from_file(path: &Path) -> Result<toml::Value> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let table: toml::Table = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        debug!(path = %path.display(), "loaded config layer");
        Ok(toml::Value::Table(table))
    }

    /// Deserialize and validate the merged layers.
    pub(crate) fn resolve(layer_stack: &ConfigLayerStack) -> Result<ExecGateConfig> {
        let config: ExecGateConfig = layer_stack
            .effective_config()
            .try_into()
            .context("Failed to deserialize effective configuration")?;

        config
            .validate()
            .context("Configuration failed validation")?;

        Ok(config)
    }

    pub fn config(&self) -> &ExecGateConfig {
        &self.config
    }

    /// File of the highest-precedence file layer, if any.
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    pub fn workspace_root(&self) -> Option<&Path> {
        self.workspace_root.as_deref()
    }

    pub fn layer_stack(&self) -> &ConfigLayerStack {
        &self.layer_stack
    }

    /// Merged TOML of every layer, before deserialization.
    pub fn effective_config(&self) -> toml::Value {
        self.layer_stack.effective_config()
    }
}
