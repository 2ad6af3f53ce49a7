//! Allowlist and safe-bin policy evaluation for tool-initiated shell commands.
//!
//! Given a raw command string, decide whether it may run without a human
//! confirming it first:
//!
//! - the shell analyzer splits it into chain parts and pipeline segments
//!   and fails closed on anything it cannot model;
//! - every segment must match an allowlist entry, qualify as safe-bin usage
//!   (a known stdin filter from a trusted directory with a conforming argv),
//!   or be a trusted skill binary;
//! - the approval policy turns the result into skip / ask / forbid.
//!
//! ```no_run
//! use execgate_core::{ExecApprovalGate, GateSettings};
//!
//! let gate = ExecApprovalGate::system(GateSettings::default());
//! let requirement = gate.check("grep -e TODO | wc -l", None, None);
//! println!("{requirement:?}");
//! ```

pub mod allowlist;
pub mod analysis;
pub mod approval;
pub mod argv;
pub mod cache;
pub mod evaluator;
pub mod gate;
pub mod platform;
pub mod profiles;
pub mod resolver;
pub mod safe_bin_gate;
pub mod safe_bins;
pub mod shell_parser;
pub mod tokens;
pub mod trust;

pub use allowlist::{ExecAllowlistEntry, match_allowlist, resolve_allowlist_candidate_path};
pub use analysis::{AnalysisError, CommandResolution, ExecCommandAnalysis, ExecCommandSegment};
pub use approval::{ExecApprovalRequirement, ExecAsk, ExecSecurity, requires_exec_approval};
pub use argv::validate_safe_bin_argv;
pub use cache::{CacheStats, DecisionCache, EvaluationKey};
pub use evaluator::{
    AllowlistEvaluationParams, DenialReason, ExecAllowlistAnalysis, ExecAllowlistEvaluation,
    SatisfiedBy, SkillBinSet, evaluate_exec_allowlist, evaluate_segments,
    evaluate_shell_allowlist,
};
pub use gate::{ExecApprovalGate, GateSettings};
pub use platform::Platform;
pub use profiles::{
    SafeBinProfile, generic_profile, profile_for, registered_profile, registered_profiles,
};
pub use resolver::{CommandEnv, ExecutableResolver, PathEnvResolver};
pub use safe_bin_gate::{SafeBinDenial, check_safe_bin_usage, is_safe_bin_usage};
pub use safe_bins::{DEFAULT_SAFE_BINS, SafeBinSet, normalize_safe_bins, resolve_safe_bins};
pub use shell_parser::{DefaultShellAnalyzer, ShellAnalyzer, split_command_chain};
pub use tokens::{has_glob_token, is_path_like_token, is_safe_literal_token};
pub use trust::{DEFAULT_SAFE_BIN_TRUSTED_DIRS, TrustedSafeBinDirs, is_trusted_safe_bin_path};
