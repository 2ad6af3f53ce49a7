//! Executable-path resolution.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::allowlist::expand_home;
use crate::trust::normalize_path;

/// Environment passed alongside a command. Ordered so it can take part in
/// cache keys.
pub type CommandEnv = BTreeMap<String, String>;

/// Turns argv[0] into an absolute path to the binary that would run.
pub trait ExecutableResolver: Send + Sync {
    fn resolve(&self, raw: &str, cwd: Option<&Path>, env: Option<&CommandEnv>) -> Option<PathBuf>;
}

/// Resolves bare names through `PATH` and explicit paths against the cwd.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathEnvResolver;

impl PathEnvResolver {
    pub fn new() -> Self {
        Self
    }

    fn search_path(env: Option<&CommandEnv>) -> Option<OsString> {
        let from_env = env.and_then(|vars| {
            vars.iter()
                .find(|(key, _)| key.eq_ignore_ascii_case("PATH"))
                .map(|(_, value)| OsString::from(value))
        });
        from_env.or_else(|| std::env::var_os("PATH"))
    }
}

impl ExecutableResolver for PathEnvResolver {
    fn resolve(&self, raw: &str, cwd: Option<&Path>, env: Option<&CommandEnv>) -> Option<PathBuf> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let base = match cwd {
            Some(dir) => dir.to_path_buf(),
            None => std::env::current_dir().ok()?,
        };

        let expanded = expand_home(raw);
        if expanded.contains(['/', '\\']) {
            let candidate = PathBuf::from(&expanded);
            let candidate = if candidate.is_absolute() {
                candidate
            } else {
                base.join(candidate)
            };
            let candidate = normalize_path(&candidate);
            return candidate.is_file().then_some(candidate);
        }

        match which::which_in(raw, Self::search_path(env), &base) {
            Ok(path) => Some(path),
            Err(error) => {
                tracing::trace!(executable = raw, %error, "executable not found on PATH");
                None
            }
        }
    }
}

impl<R: ExecutableResolver + ?Sized> ExecutableResolver for &R {
    fn resolve(&self, raw: &str, cwd: Option<&Path>, env: Option<&CommandEnv>) -> Option<PathBuf> {
        (**self).resolve(raw, cwd, env)
    }
}
