#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use execgate_core::{
    AllowlistEvaluationParams, CommandEnv, DefaultShellAnalyzer, ExecAllowlistEntry,
    ExecutableResolver, Platform, SafeBinSet, SkillBinSet, TrustedSafeBinDirs,
    normalize_safe_bins,
};

/// Resolves names from a fixed table, independent of the host `PATH`.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    paths: BTreeMap<String, PathBuf>,
}

impl StaticResolver {
    pub fn new(entries: &[(&str, &str)]) -> Self {
        Self {
            paths: entries
                .iter()
                .map(|(name, path)| ((*name).to_string(), PathBuf::from(path)))
                .collect(),
        }
    }

    /// Common filters in `/usr/bin`, plus a few non-filter tools.
    pub fn system() -> Self {
        Self::new(&[
            ("jq", "/usr/bin/jq"),
            ("grep", "/usr/bin/grep"),
            ("cut", "/usr/bin/cut"),
            ("sort", "/usr/bin/sort"),
            ("uniq", "/usr/bin/uniq"),
            ("head", "/usr/bin/head"),
            ("tail", "/usr/bin/tail"),
            ("tr", "/usr/bin/tr"),
            ("wc", "/usr/bin/wc"),
            ("rm", "/bin/rm"),
            ("curl", "/usr/bin/curl"),
            ("cargo", "/home/dev/.cargo/bin/cargo"),
            ("fmt-tool", "/opt/tools/fmt-tool"),
            ("summarize", "/home/dev/.skills/bin/summarize"),
        ])
    }
}

impl ExecutableResolver for StaticResolver {
    fn resolve(
        &self,
        raw: &str,
        _cwd: Option<&Path>,
        _env: Option<&CommandEnv>,
    ) -> Option<PathBuf> {
        self.paths.get(raw).cloned()
    }
}

pub fn analyzer() -> DefaultShellAnalyzer<StaticResolver> {
    DefaultShellAnalyzer::new(StaticResolver::system())
}

/// Owned inputs that [`AllowlistEvaluationParams`] borrows from.
pub struct Policy {
    pub allowlist: Vec<ExecAllowlistEntry>,
    pub safe_bins: SafeBinSet,
    pub trusted_dirs: TrustedSafeBinDirs,
    pub skill_bins: SkillBinSet,
    pub auto_allow_skills: bool,
    pub platform: Platform,
    pub cwd: PathBuf,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            allowlist: Vec::new(),
            safe_bins: execgate_core::safe_bins::default_safe_bins(),
            trusted_dirs: TrustedSafeBinDirs::default(),
            skill_bins: SkillBinSet::new(),
            auto_allow_skills: false,
            platform: Platform::Linux,
            cwd: PathBuf::from("/work"),
        }
    }
}

impl Policy {
    pub fn with_safe_bins(mut self, names: &[&str]) -> Self {
        self.safe_bins = normalize_safe_bins(Some(names));
        self
    }

    pub fn params(&self) -> AllowlistEvaluationParams<'_> {
        AllowlistEvaluationParams {
            allowlist: &self.allowlist,
            safe_bins: &self.safe_bins,
            cwd: Some(self.cwd.as_path()),
            platform: &self.platform,
            trusted_dirs: &self.trusted_dirs,
            skill_bins: &self.skill_bins,
            auto_allow_skills: self.auto_allow_skills,
        }
    }
}
