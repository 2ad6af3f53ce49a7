use std::path::PathBuf;

use anyhow::{Result, ensure};
use execgate_core::cache::DEFAULT_DECISION_CACHE_SIZE;
use execgate_core::{
    ExecAllowlistEntry, ExecApprovalGate, ExecAsk, ExecSecurity, GateSettings, TrustedSafeBinDirs,
    normalize_safe_bins, resolve_safe_bins,
};
use serde::{Deserialize, Deserializer, Serialize};

/// `[exec]` table: when shell commands may run without a human in the loop.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExecConfig {
    /// Overall posture: `deny`, `allowlist` or `full`.
    #[serde(default)]
    pub security: ExecSecurity,
    /// When to prompt: `off`, `on-miss` or `always`.
    #[serde(default)]
    pub ask: ExecAsk,
    /// Binaries trusted as stdin filters.
    ///
    /// Absent keeps the built-in list. An empty list, or an explicit `null`
    /// from a JSON host, turns safe-bin approval off.
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub safe_bins: Option<Option<Vec<String>>>,
    /// Directories besides `/bin` and `/usr/bin` a safe bin may live in.
    #[serde(default)]
    pub safe_bin_trusted_dirs: Vec<PathBuf>,
    #[serde(default)]
    pub auto_allow_skills: bool,
    /// Executables shipped by trusted skill bundles.
    #[serde(default)]
    pub skill_bins: Vec<String>,
    /// Explicitly trusted executables, matched by path glob.
    #[serde(default)]
    pub allowlist: Vec<ExecAllowlistEntry>,
    #[serde(default = "ExecConfig::default_decision_cache_size")]
    pub decision_cache_size: usize,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            security: ExecSecurity::default(),
            ask: ExecAsk::default(),
            safe_bins: None,
            safe_bin_trusted_dirs: Vec::new(),
            auto_allow_skills: false,
            skill_bins: Vec::new(),
            allowlist: Vec::new(),
            decision_cache_size: Self::default_decision_cache_size(),
        }
    }
}

impl ExecConfig {
    const fn default_decision_cache_size() -> usize {
        DEFAULT_DECISION_CACHE_SIZE
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.decision_cache_size > 0,
            "decision_cache_size must be greater than zero"
        );

        for dir in &self.safe_bin_trusted_dirs {
            ensure!(
                dir.has_root(),
                "safe_bin_trusted_dirs entry must be absolute: {}",
                dir.display()
            );
        }

        for (index, entry) in self.allowlist.iter().enumerate() {
            ensure!(
                !entry.pattern.trim().is_empty(),
                "allowlist entry {index} has an empty pattern"
            );
        }

        Ok(())
    }

    /// Gate for long-lived hosts, with a decision cache of
    /// `decision_cache_size` entries.
    pub fn build_gate(&self) -> ExecApprovalGate {
        ExecApprovalGate::system(self.to_gate_settings()).with_cache(self.decision_cache_size)
    }

    /// Core gate settings for the host platform.
    pub fn to_gate_settings(&self) -> GateSettings {
        GateSettings {
            security: self.security,
            ask: self.ask,
            allowlist: self.allowlist.clone(),
            safe_bins: resolve_safe_bins(self.safe_bins.as_ref().map(Option::as_ref)),
            trusted_dirs: TrustedSafeBinDirs::with_extra(&self.safe_bin_trusted_dirs),
            skill_bins: normalize_safe_bins(Some(&self.skill_bins)),
            auto_allow_skills: self.auto_allow_skills,
            ..GateSettings::default()
        }
    }
}

/// Wraps whatever is present, `null` included, in `Some` so an explicit null
/// stays distinguishable from a missing key.
fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}
