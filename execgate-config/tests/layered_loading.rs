use std::fs;
use std::path::Path;

use execgate_config::{ConfigBuilder, ConfigLayerSource};
use execgate_core::{ExecAsk, ExecSecurity};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("failed to create config dir");
    }
    fs::write(path, content).expect("failed to write config");
}

#[test]
fn test_defaults_without_any_file() {
    let workspace = TempDir::new().expect("failed to create workspace");
    let manager = ConfigBuilder::new()
        .workspace(workspace.path().to_path_buf())
        .user_config(None)
        .build()
        .expect("failed to load config");

    assert!(manager.layer_stack().layers().is_empty());
    assert_eq!(manager.config_path(), None);
    assert_eq!(manager.config().exec.security, ExecSecurity::Allowlist);
    assert_eq!(manager.config().exec.ask, ExecAsk::OnMiss);
    assert_eq!(manager.config().exec.safe_bins, None);
}

#[test]
fn test_user_then_workspace_layers() {
    let root = TempDir::new().expect("failed to create temp dir");
    let user_config = root.path().join("home/.execgate/execgate.toml");
    let workspace = root.path().join("project");

    write(
        &user_config,
        "[exec]\nask = \"off\"\nsafe_bin_trusted_dirs = [\"/opt/homebrew/bin\"]\n",
    );
    write(
        &workspace.join(".execgate/execgate.toml"),
        "[exec]\nsafe_bins = [\"jq\"]\n",
    );
    write(
        &workspace.join("execgate.toml"),
        "[exec]\nask = \"always\"\n",
    );

    let manager = ConfigBuilder::new()
        .workspace(workspace.clone())
        .user_config(Some(user_config))
        .build()
        .expect("failed to load config");

    let layers = manager.layer_stack().layers();
    assert_eq!(layers.len(), 3);
    assert!(matches!(layers[0].source, ConfigLayerSource::User { .. }));
    assert!(matches!(layers[1].source, ConfigLayerSource::Workspace { .. }));
    assert!(matches!(layers[2].source, ConfigLayerSource::Workspace { .. }));

    let exec = &manager.config().exec;
    assert_eq!(exec.ask, ExecAsk::Always);
    assert_eq!(exec.safe_bins, Some(Some(vec!["jq".to_string()])));
    assert_eq!(exec.safe_bin_trusted_dirs.len(), 1);
    assert_eq!(
        manager.config_path(),
        Some(workspace.join("execgate.toml").as_path())
    );
}

#[test]
fn test_explicit_file_replaces_workspace_layers() {
    let root = TempDir::new().expect("failed to create temp dir");
    let workspace = root.path().join("project");
    write(&workspace.join("execgate.toml"), "[exec]\nsecurity = \"deny\"\n");
    let explicit = root.path().join("ci.toml");
    write(&explicit, "[exec]\nsecurity = \"full\"\n");

    let manager = ConfigBuilder::new()
        .workspace(workspace)
        .config_file(explicit.clone())
        .user_config(None)
        .build()
        .expect("failed to load config");

    assert_eq!(manager.layer_stack().layers().len(), 1);
    assert_eq!(manager.config().exec.security, ExecSecurity::Full);
    assert_eq!(manager.config_path(), Some(explicit.as_path()));
}

#[test]
fn test_runtime_overrides_win() {
    let workspace = TempDir::new().expect("failed to create workspace");
    write(
        &workspace.path().join("execgate.toml"),
        "[exec]\nask = \"off\"\ndecision_cache_size = 10\n",
    );

    let manager = ConfigBuilder::new()
        .workspace(workspace.path().to_path_buf())
        .user_config(None)
        .cli_overrides(&[
            ("exec.ask".to_string(), "always".to_string()),
            ("exec.safe_bins".to_string(), "[]".to_string()),
            ("exec.auto_allow_skills".to_string(), "true".to_string()),
        ])
        .build()
        .expect("failed to load config");

    let exec = &manager.config().exec;
    assert_eq!(exec.ask, ExecAsk::Always);
    assert_eq!(exec.decision_cache_size, 10);
    assert!(exec.auto_allow_skills);
    assert!(exec.to_gate_settings().safe_bins.is_empty());
    assert!(matches!(
        manager.layer_stack().layers().last().map(|layer| &layer.source),
        Some(ConfigLayerSource::Runtime)
    ));
}

#[test]
fn test_invalid_layers_are_reported() {
    let workspace = TempDir::new().expect("failed to create workspace");
    write(&workspace.path().join("execgate.toml"), "[exec\nask = ");
    let err = ConfigBuilder::new()
        .workspace(workspace.path().to_path_buf())
        .user_config(None)
        .build()
        .expect_err("malformed toml must fail");
    assert!(format!("{err:#}").contains("Failed to parse config file"));

    write(
        &workspace.path().join("execgate.toml"),
        "[exec]\nsafe_bin_trusted_dirs = [\"relative/bin\"]\n",
    );
    let err = ConfigBuilder::new()
        .workspace(workspace.path().to_path_buf())
        .user_config(None)
        .build()
        .expect_err("relative trusted dir must fail");
    assert!(format!("{err:#}").contains("must be absolute"));

    write(&workspace.path().join("execgate.toml"), "[exec]\n");
    let err = ConfigBuilder::new()
        .workspace(workspace.path().to_path_buf())
        .user_config(None)
        .cli_override("exec.decision_cache_size".into(), toml::Value::Integer(0))
        .build()
        .expect_err("overrides are validated too");
    assert!(format!("{err:#}").contains("decision_cache_size"));
}
