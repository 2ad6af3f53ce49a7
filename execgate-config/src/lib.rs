//! Layered configuration for the execgate approval gate.
//!
//! Settings are read from `~/.execgate/execgate.toml`, then from
//! `.execgate/execgate.toml` and `execgate.toml` in the workspace, then from
//! runtime `key=value` overrides. Later layers win. The merged `[exec]` table
//! converts into [`execgate_core::GateSettings`].
//!
//! ```no_run
//! use execgate_config::ConfigBuilder;
//!
//! let manager = ConfigBuilder::new()
//!     .cli_overrides(&[("exec.ask".into(), "always".into())])
//!     .build()?;
//! let settings = manager.config().exec.to_gate_settings();
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod exec;
pub mod loader;

pub use exec::ExecConfig;
pub use loader::layers::{ConfigLayerEntry, ConfigLayerSource, ConfigLayerStack};
pub use loader::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, CONFIG_PATH_ENV, ConfigBuilder, ConfigManager,
    ExecGateConfig, config_path_from_env, default_user_config_path, merge_toml_values,
    parse_override,
};
