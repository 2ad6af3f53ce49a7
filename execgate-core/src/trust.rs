//! Trust boundary for resolved safe-bin locations.
//!
//! A binary named `grep` is only treated as the system `grep` when it lives
//! directly inside one of the trusted directories. This keeps a same-named
//! binary planted earlier on `PATH` from inheriting safe-bin approval.

use std::path::{Component, Path, PathBuf};

/// Directories trusted by default to contain genuine system filters.
pub const DEFAULT_SAFE_BIN_TRUSTED_DIRS: &[&str] = &["/bin", "/usr/bin"];

/// Set of directories a resolved safe bin must reside in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrustedSafeBinDirs {
    dirs: Vec<PathBuf>,
}

impl TrustedSafeBinDirs {
    /// Build from explicit directories. Relative entries are ignored.
    pub fn new<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut normalized: Vec<PathBuf> = dirs
            .into_iter()
            .map(|dir| normalize_path(dir.as_ref()))
            .filter(|dir| dir.has_root())
            .collect();
        normalized.sort();
        normalized.dedup();
        Self { dirs: normalized }
    }

    /// Default directories plus `extra`.
    pub fn with_extra<I, P>(extra: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let defaults = DEFAULT_SAFE_BIN_TRUSTED_DIRS.iter().map(PathBuf::from);
        let extra = extra.into_iter().map(|dir| dir.as_ref().to_path_buf());
        Self::new(defaults.chain(extra))
    }

    pub fn contains_dir(&self, dir: &Path) -> bool {
        let dir = normalize_path(dir);
        self.dirs.iter().any(|trusted| *trusted == dir)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.dirs.iter().map(PathBuf::as_path)
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }
}

impl Default for TrustedSafeBinDirs {
    fn default() -> Self {
        Self::new(DEFAULT_SAFE_BIN_TRUSTED_DIRS)
    }
}

/// True when `resolved_path` sits directly inside a trusted directory.
pub fn is_trusted_safe_bin_path(resolved_path: &Path, trusted_dirs: &TrustedSafeBinDirs) -> bool {
    if !resolved_path.has_root() {
        return false;
    }
    let normalized = normalize_path(resolved_path);
    normalized
        .parent()
        .is_some_and(|parent| trusted_dirs.contains_dir(parent))
}

/// Resolve `.` and `..` components lexically.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                normalized.pop();
            }
            Component::CurDir => {}
            Component::Prefix(prefix) => normalized.push(prefix.as_os_str()),
            Component::RootDir => normalized.push(component.as_os_str()),
            Component::Normal(part) => normalized.push(part),
        }
    }
    normalized
}
