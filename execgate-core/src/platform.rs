//! Host platform identification.
//!
//! Safe-bin auto-approval is a POSIX-only feature; on Windows only explicit
//! allowlist entries are honored, so the evaluator needs to know which
//! platform the command will run on. The platform is always an explicit input
//! so that evaluation stays a pure function of its arguments.

use std::fmt;
use std::str::FromStr;

/// Platform a command is evaluated for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
    /// Any other POSIX-like platform, identified by name.
    Other(String),
}

impl Platform {
    /// Platform of the running process.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else {
            Self::Other(std::env::consts::OS.to_string())
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, Self::Windows)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Linux => "linux",
            Self::MacOs => "macos",
            Self::Windows => "windows",
            Self::Other(name) => name.as_str(),
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Ok(match normalized.as_str() {
            "linux" => Self::Linux,
            "macos" | "darwin" | "osx" => Self::MacOs,
            "windows" | "win32" | "win" => Self::Windows,
            _ => Self::Other(normalized),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_node_style_platform_names() {
        assert_eq!("win32".parse::<Platform>().unwrap(), Platform::Windows);
        assert_eq!("darwin".parse::<Platform>().unwrap(), Platform::MacOs);
        assert_eq!(" Linux ".parse::<Platform>().unwrap(), Platform::Linux);
        assert_eq!(
            "freebsd".parse::<Platform>().unwrap(),
            Platform::Other("freebsd".to_string())
        );
    }

    #[test]
    fn only_windows_reports_windows() {
        assert!(Platform::Windows.is_windows());
        assert!(!Platform::Linux.is_windows());
        assert!(!Platform::Other("windows-like".to_string()).is_windows());
    }
}
