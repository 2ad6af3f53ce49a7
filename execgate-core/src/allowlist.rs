//! Explicit allowlist entries and path-pattern matching.

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};

use crate::analysis::CommandResolution;

/// One explicitly trusted executable.
///
/// Only `pattern` takes part in matching. It must contain a path marker
/// (`/`, `\` or `~`); bare names are ignored so an entry can never trust every
/// binary that happens to share a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecAllowlistEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub pattern: String,
}

impl ExecAllowlistEntry {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            id: None,
            pattern: pattern.into(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// First entry whose pattern matches the resolution's path.
pub fn match_allowlist<'a>(
    entries: &'a [ExecAllowlistEntry],
    resolution: Option<&CommandResolution>,
) -> Option<&'a ExecAllowlistEntry> {
    let resolved_path = resolution?.resolved_path.as_deref()?;
    if entries.is_empty() {
        return None;
    }
    let target = normalize_separators(&resolved_path.to_string_lossy());

    entries.iter().find(|entry| {
        let pattern = entry.pattern.trim();
        !pattern.is_empty() && has_path_marker(pattern) && matches_pattern(pattern, &target)
    })
}

fn has_path_marker(pattern: &str) -> bool {
    pattern.contains(['/', '\\', '~'])
}

fn matches_pattern(pattern: &str, target: &str) -> bool {
    let expanded = expand_home(pattern);
    let normalized = normalize_separators(&expanded);
    match Pattern::new(&normalized) {
        Ok(compiled) => compiled.matches_with(target, MATCH_OPTIONS),
        Err(error) => {
            tracing::debug!(pattern, %error, "ignoring malformed allowlist pattern");
            false
        }
    }
}

fn normalize_separators(value: &str) -> String {
    value.replace('\\', "/")
}

/// Expand a leading `~` or `~/` to the home directory.
pub(crate) fn expand_home(value: &str) -> String {
    let Some(rest) = value.strip_prefix('~') else {
        return value.to_string();
    };
    if !(rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\')) {
        return value.to_string();
    }
    match dirs::home_dir() {
        Some(home) => format!("{}{}", home.to_string_lossy(), rest),
        None => value.to_string(),
    }
}

/// Path to test against the allowlist for a segment.
///
/// Uses the resolved path when there is one. Otherwise an argv[0] that names a
/// path explicitly is made absolute against `cwd`, falling back to the process
/// working directory. Bare names yield `None`.
pub fn resolve_allowlist_candidate_path(
    resolution: Option<&CommandResolution>,
    cwd: Option<&Path>,
) -> Option<PathBuf> {
    let resolution = resolution?;
    if let Some(resolved) = &resolution.resolved_path {
        return Some(resolved.clone());
    }

    let raw = resolution.raw_executable.trim();
    if raw.is_empty() {
        return None;
    }
    let expanded = expand_home(raw);
    if !expanded.contains(['/', '\\']) {
        return None;
    }

    let candidate = PathBuf::from(&expanded);
    if candidate.is_absolute() {
        return Some(candidate);
    }

    let base = match cwd {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => std::env::current_dir().ok()?,
    };
    Some(crate::trust::normalize_path(&base.join(candidate)))
}
