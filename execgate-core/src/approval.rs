//! Approval requirement derived from an allowlist evaluation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::evaluator::ExecAllowlistAnalysis;

/// How much the host is willing to run without a human in the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecSecurity {
    /// Never run tool-initiated commands.
    Deny,
    /// Run commands the allowlist evaluator approves.
    #[default]
    Allowlist,
    /// Run everything.
    Full,
}

/// When to prompt the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecAsk {
    /// Never prompt; allowlist misses are refused.
    Off,
    /// Prompt only when the allowlist does not cover the command.
    #[default]
    OnMiss,
    /// Prompt for every command.
    Always,
}

impl ExecSecurity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deny => "deny",
            Self::Allowlist => "allowlist",
            Self::Full => "full",
        }
    }
}

impl ExecAsk {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::OnMiss => "on-miss",
            Self::Always => "always",
        }
    }
}

impl fmt::Display for ExecSecurity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ExecAsk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecSecurity {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "deny" => Ok(Self::Deny),
            "allowlist" => Ok(Self::Allowlist),
            "full" => Ok(Self::Full),
            other => Err(format!("unknown exec security mode '{other}'")),
        }
    }
}

impl FromStr for ExecAsk {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "on-miss" | "on_miss" => Ok(Self::OnMiss),
            "always" => Ok(Self::Always),
            other => Err(format!("unknown exec ask mode '{other}'")),
        }
    }
}

/// Whether the user must confirm a command before it runs.
pub fn requires_exec_approval(
    ask: ExecAsk,
    security: ExecSecurity,
    analysis_ok: bool,
    allowlist_satisfied: bool,
) -> bool {
    ask == ExecAsk::Always
        || (ask == ExecAsk::OnMiss
            && security == ExecSecurity::Allowlist
            && (!analysis_ok || !allowlist_satisfied))
}

/// What has to happen before a command may run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ExecApprovalRequirement {
    /// Run without asking.
    Skip,
    /// Ask the user first.
    NeedsApproval { reason: String },
    /// Refuse outright.
    Forbidden { reason: String },
}

impl ExecApprovalRequirement {
    pub fn needs_approval(reason: impl Into<String>) -> Self {
        Self::NeedsApproval {
            reason: reason.into(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    /// Combine the policy with an evaluation result.
    pub fn from_analysis(
        security: ExecSecurity,
        ask: ExecAsk,
        analysis: &ExecAllowlistAnalysis,
    ) -> Self {
        match security {
            ExecSecurity::Deny => Self::forbidden("exec security is set to deny"),
            ExecSecurity::Full if ask == ExecAsk::Always => {
                Self::needs_approval("approval is required for every command")
            }
            ExecSecurity::Full => Self::Skip,
            ExecSecurity::Allowlist => {
                if analysis.is_auto_approvable() {
                    return if requires_exec_approval(ask, security, true, true) {
                        Self::needs_approval("approval is required for every command")
                    } else {
                        Self::Skip
                    };
                }

                let reason = miss_reason(analysis);
                if ask == ExecAsk::Off {
                    Self::forbidden(format!("allowlist miss: {reason}"))
                } else {
                    Self::needs_approval(reason)
                }
            }
        }
    }

    pub fn requires_approval(&self) -> bool {
        matches!(self, Self::NeedsApproval { .. })
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden { .. })
    }

    pub fn can_proceed(&self) -> bool {
        matches!(self, Self::Skip)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Skip => None,
            Self::NeedsApproval { reason } | Self::Forbidden { reason } => Some(reason),
        }
    }
}

fn miss_reason(analysis: &ExecAllowlistAnalysis) -> String {
    match &analysis.denial {
        Some(denial) => denial.to_string(),
        None if !analysis.analysis_ok => "command could not be analyzed".to_string(),
        None => "command is not covered by the allowlist".to_string(),
    }
}
