pub mod layers;

mod builder;
mod config;
mod manager;
mod merge;

pub use builder::{ConfigBuilder, parse_override};
pub use config::ExecGateConfig;
pub use manager::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, CONFIG_PATH_ENV, ConfigManager, config_path_from_env,
    default_user_config_path,
};
pub use merge::merge_toml_values;
