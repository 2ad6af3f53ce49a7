use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::exec::ExecConfig;

/// Root of an `execgate.toml` file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct ExecGateConfig {
    /// Command approval policy
    #[serde(default)]
    pub exec: ExecConfig,
}

impl ExecGateConfig {
    pub fn validate(&self) -> Result<()> {
        self.exec
            .validate()
            .context("Invalid exec configuration")?;

        Ok(())
    }
}
