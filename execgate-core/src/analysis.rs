//! Parsed shape of a shell command, as produced by a [`ShellAnalyzer`].
//!
//! [`ShellAnalyzer`]: crate::shell_parser::ShellAnalyzer

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

/// How the executable of one segment was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CommandResolution {
    /// argv[0] exactly as written.
    pub raw_executable: String,
    /// File name of the resolved binary (or of argv[0] when unresolved).
    /// Case is preserved; safe-bin matching lowercases it.
    pub executable_name: String,
    /// Absolute path of the binary, when it could be found.
    pub resolved_path: Option<PathBuf>,
}

impl CommandResolution {
    pub fn new(raw_executable: impl Into<String>, resolved_path: Option<PathBuf>) -> Self {
        let raw_executable = raw_executable.into();
        let executable_name = resolved_path
            .as_deref()
            .and_then(file_name)
            .or_else(|| file_name(Path::new(&raw_executable)))
            .unwrap_or_else(|| raw_executable.clone());
        Self {
            raw_executable,
            executable_name,
            resolved_path,
        }
    }
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(ToOwned::to_owned)
}

/// One pipeline stage: a single executable invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ExecCommandSegment {
    /// The raw text of the stage.
    pub raw: String,
    pub argv: Vec<String>,
    pub resolution: Option<CommandResolution>,
}

impl ExecCommandSegment {
    pub fn executable_name(&self) -> Option<&str> {
        self.resolution
            .as_ref()
            .map(|resolution| resolution.executable_name.as_str())
    }
}

/// Why the analyzer refused to model a command.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisError {
    #[error("command is empty")]
    Empty,
    #[error("unsupported shell construct '{construct}'")]
    UnsupportedConstruct { construct: String },
    #[error("unterminated {quote} quote")]
    UnterminatedQuote { quote: &'static str },
    #[error("empty pipeline segment")]
    EmptySegment,
    #[error("failed to tokenize segment: {message}")]
    Tokenize { message: String },
}

impl AnalysisError {
    pub(crate) fn unsupported(construct: impl Into<String>) -> Self {
        Self::UnsupportedConstruct {
            construct: construct.into(),
        }
    }
}

/// Result of analyzing one command string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecCommandAnalysis {
    /// The analyzer could not safely model the command.
    Failed(AnalysisError),
    /// A single pipeline.
    Simple(Vec<ExecCommandSegment>),
    /// Top-level `&&` / `||` / `;` parts, each a pipeline.
    Chained(Vec<Vec<ExecCommandSegment>>),
}

impl ExecCommandAnalysis {
    pub fn is_ok(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }

    pub fn error(&self) -> Option<&AnalysisError> {
        match self {
            Self::Failed(error) => Some(error),
            Self::Simple(_) | Self::Chained(_) => None,
        }
    }

    /// All segments across every chain part, in order.
    pub fn segments(&self) -> Vec<&ExecCommandSegment> {
        match self {
            Self::Failed(_) => Vec::new(),
            Self::Simple(segments) => segments.iter().collect(),
            Self::Chained(chains) => chains.iter().flatten().collect(),
        }
    }

    pub fn into_segments(self) -> Vec<ExecCommandSegment> {
        match self {
            Self::Failed(_) => Vec::new(),
            Self::Simple(segments) => segments,
            Self::Chained(chains) => chains.into_iter().flatten().collect(),
        }
    }

    pub fn segment_count(&self) -> usize {
        match self {
            Self::Failed(_) => 0,
            Self::Simple(segments) => segments.len(),
            Self::Chained(chains) => chains.iter().map(Vec::len).sum(),
        }
    }
}

impl From<Result<Vec<ExecCommandSegment>, AnalysisError>> for ExecCommandAnalysis {
    fn from(result: Result<Vec<ExecCommandSegment>, AnalysisError>) -> Self {
        match result {
            Ok(segments) => Self::Simple(segments),
            Err(error) => Self::Failed(error),
        }
    }
}
