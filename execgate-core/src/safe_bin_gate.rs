//! Per-segment safe-bin usage gate.
//!
//! The gate is an ordered list of guards. Each guard either passes or names
//! the reason the segment cannot be auto-approved as a safe bin; the first
//! failing guard decides.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::analysis::CommandResolution;
use crate::argv::validate_safe_bin_argv;
use crate::platform::Platform;
use crate::profiles::profile_for;
use crate::safe_bins::SafeBinSet;
use crate::trust::{TrustedSafeBinDirs, is_trusted_safe_bin_path};

/// Why a segment does not qualify as safe-bin usage.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SafeBinDenial {
    #[error("safe-bin auto-approval is disabled on {platform}")]
    PlatformPolicyDenied { platform: String },
    #[error("no safe bins are configured")]
    EmptySafeBins,
    #[error("executable could not be resolved")]
    UnresolvedExecutable,
    #[error("'{name}' is not a configured safe bin")]
    NotASafeBin { name: String },
    #[error("'{}' is outside the trusted safe-bin directories", path.display())]
    UntrustedLocation { path: PathBuf },
    #[error("arguments to '{name}' violate its safe-bin profile")]
    ProfileViolation { name: String },
}

/// Inputs for one safe-bin check.
#[derive(Debug, Clone, Copy)]
pub struct SafeBinCheck<'a> {
    pub argv: &'a [String],
    pub resolution: Option<&'a CommandResolution>,
    pub safe_bins: &'a SafeBinSet,
    pub platform: &'a Platform,
    pub trusted_dirs: &'a TrustedSafeBinDirs,
}

type Guard = fn(&SafeBinCheck<'_>) -> Result<(), SafeBinDenial>;

/// Guards in evaluation order.
pub const SAFE_BIN_GUARDS: &[(&str, Guard)] = &[
    ("platform", platform_guard),
    ("non_empty_set", non_empty_set_guard),
    ("membership", membership_guard),
    ("trusted_location", trusted_location_guard),
    ("profile", profile_guard),
];

/// PowerShell parsing differs too much for safe-bin approval on Windows.
pub fn platform_guard(check: &SafeBinCheck<'_>) -> Result<(), SafeBinDenial> {
    if check.platform.is_windows() {
        return Err(SafeBinDenial::PlatformPolicyDenied {
            platform: check.platform.to_string(),
        });
    }
    Ok(())
}

pub fn non_empty_set_guard(check: &SafeBinCheck<'_>) -> Result<(), SafeBinDenial> {
    if check.safe_bins.is_empty() {
        return Err(SafeBinDenial::EmptySafeBins);
    }
    Ok(())
}

pub fn membership_guard(check: &SafeBinCheck<'_>) -> Result<(), SafeBinDenial> {
    let name = executable_name(check).ok_or(SafeBinDenial::UnresolvedExecutable)?;
    let lowered = name.to_lowercase();
    if check.safe_bins.contains(&lowered) {
        return Ok(());
    }
    if check.platform.is_windows()
        && let Some((stem, _extension)) = lowered.rsplit_once('.')
        && check.safe_bins.contains(stem)
    {
        return Ok(());
    }
    Err(SafeBinDenial::NotASafeBin {
        name: name.to_string(),
    })
}

/// Rejects a same-named binary planted outside the trusted directories.
pub fn trusted_location_guard(check: &SafeBinCheck<'_>) -> Result<(), SafeBinDenial> {
    let path = check
        .resolution
        .and_then(|resolution| resolution.resolved_path.as_deref())
        .ok_or(SafeBinDenial::UnresolvedExecutable)?;
    if !is_trusted_safe_bin_path(path, check.trusted_dirs) {
        return Err(SafeBinDenial::UntrustedLocation {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

pub fn profile_guard(check: &SafeBinCheck<'_>) -> Result<(), SafeBinDenial> {
    let name = executable_name(check).ok_or(SafeBinDenial::UnresolvedExecutable)?;
    let args = check.argv.get(1..).unwrap_or_default();
    if !validate_safe_bin_argv(args, profile_for(name)) {
        return Err(SafeBinDenial::ProfileViolation {
            name: name.to_string(),
        });
    }
    Ok(())
}

fn executable_name<'a>(check: &SafeBinCheck<'a>) -> Option<&'a str> {
    check
        .resolution
        .map(|resolution| resolution.executable_name.as_str())
        .filter(|name| !name.trim().is_empty())
}

/// Run every guard in order; the first denial wins.
pub fn check_safe_bin_usage(check: &SafeBinCheck<'_>) -> Result<(), SafeBinDenial> {
    for (name, guard) in SAFE_BIN_GUARDS {
        if let Err(denial) = guard(check) {
            tracing::trace!(guard = *name, %denial, "safe-bin guard rejected segment");
            return Err(denial);
        }
    }
    Ok(())
}

/// True when the segment qualifies for safe-bin auto-approval.
pub fn is_safe_bin_usage(
    argv: &[String],
    resolution: Option<&CommandResolution>,
    safe_bins: &SafeBinSet,
    platform: &Platform,
    trusted_dirs: &TrustedSafeBinDirs,
) -> bool {
    check_safe_bin_usage(&SafeBinCheck {
        argv,
        resolution,
        safe_bins,
        platform,
        trusted_dirs,
    })
    .is_ok()
}
