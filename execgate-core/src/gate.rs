//! Approval gate facade.
//!
//! Owns the policy settings and an analyzer, and turns a raw command into an
//! [`ExecApprovalRequirement`].

use std::path::Path;

use crate::allowlist::ExecAllowlistEntry;
use crate::approval::{ExecApprovalRequirement, ExecAsk, ExecSecurity};
use crate::cache::{CacheStats, DecisionCache, EvaluationKey};
use crate::evaluator::{
    AllowlistEvaluationParams, ExecAllowlistAnalysis, SkillBinSet, evaluate_shell_allowlist,
};
use crate::platform::Platform;
use crate::resolver::CommandEnv;
use crate::safe_bins::{SafeBinSet, default_safe_bins};
use crate::shell_parser::{DefaultShellAnalyzer, ShellAnalyzer};
use crate::trust::TrustedSafeBinDirs;

/// Policy inputs shared by every evaluation the gate performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateSettings {
    pub security: ExecSecurity,
    pub ask: ExecAsk,
    pub allowlist: Vec<ExecAllowlistEntry>,
    pub safe_bins: SafeBinSet,
    pub trusted_dirs: TrustedSafeBinDirs,
    pub skill_bins: SkillBinSet,
    pub auto_allow_skills: bool,
    pub platform: Platform,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            security: ExecSecurity::default(),
            ask: ExecAsk::default(),
            allowlist: Vec::new(),
            safe_bins: default_safe_bins(),
            trusted_dirs: TrustedSafeBinDirs::default(),
            skill_bins: SkillBinSet::new(),
            auto_allow_skills: false,
            platform: Platform::current(),
        }
    }
}

impl GateSettings {
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    fn params<'a>(&'a self, cwd: Option<&'a Path>) -> AllowlistEvaluationParams<'a> {
        AllowlistEvaluationParams {
            allowlist: &self.allowlist,
            safe_bins: &self.safe_bins,
            cwd,
            platform: &self.platform,
            trusted_dirs: &self.trusted_dirs,
            skill_bins: &self.skill_bins,
            auto_allow_skills: self.auto_allow_skills,
        }
    }
}

/// Decides whether tool-initiated shell commands may run unattended.
#[derive(Debug)]
pub struct ExecApprovalGate<A = DefaultShellAnalyzer> {
    settings: GateSettings,
    analyzer: A,
    cache: Option<DecisionCache>,
}

impl ExecApprovalGate<DefaultShellAnalyzer> {
    /// Gate resolving executables through `PATH`.
    pub fn system(settings: GateSettings) -> Self {
        Self::new(settings, DefaultShellAnalyzer::system())
    }
}

impl<A: ShellAnalyzer> ExecApprovalGate<A> {
    pub fn new(settings: GateSettings, analyzer: A) -> Self {
        Self {
            settings,
            analyzer,
            cache: None,
        }
    }

    /// Cache evaluations in an LRU of `capacity` entries.
    pub fn with_cache(mut self, capacity: usize) -> Self {
        self.cache = Some(DecisionCache::new(capacity));
        self
    }

    pub fn settings(&self) -> &GateSettings {
        &self.settings
    }

    pub fn analyzer(&self) -> &A {
        &self.analyzer
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(DecisionCache::stats)
    }

    /// Run the allowlist evaluation for `command`.
    pub fn evaluate(
        &self,
        command: &str,
        cwd: Option<&Path>,
        env: Option<&CommandEnv>,
    ) -> ExecAllowlistAnalysis {
        let params = self.settings.params(cwd);
        let run = || evaluate_shell_allowlist(command, &self.analyzer, env, &params);
        match &self.cache {
            Some(cache) => {
                cache.get_or_insert_with(EvaluationKey::new(command, env, &params), run)
            }
            None => run(),
        }
    }

    /// What must happen before `command` may run.
    pub fn check(
        &self,
        command: &str,
        cwd: Option<&Path>,
        env: Option<&CommandEnv>,
    ) -> ExecApprovalRequirement {
        let analysis = self.evaluate(command, cwd, env);
        let requirement = ExecApprovalRequirement::from_analysis(
            self.settings.security,
            self.settings.ask,
            &analysis,
        );

        match &requirement {
            ExecApprovalRequirement::Skip => {
                tracing::info!(
                    security = %self.settings.security,
                    "command approved without prompt"
                );
            }
            ExecApprovalRequirement::NeedsApproval { reason } => {
                tracing::info!(%reason, "command needs approval");
            }
            ExecApprovalRequirement::Forbidden { reason } => {
                tracing::info!(%reason, "command forbidden");
            }
        }
        requirement
    }
}
