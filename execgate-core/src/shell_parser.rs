//! Shell command analysis for allowlist evaluation.
//!
//! Splits a command line into top-level chain parts and pipeline stages:
//! ```text
//! Input:  "git status | head -n 5 && wc -l"
//! Chains: [["git", "status"], ["head", "-n", "5"]], [["wc", "-l"]]
//! ```
//!
//! The analyzer only models plain pipelines. Anything that could run hidden
//! code or touch files outside argv (substitution, expansion, redirection,
//! subshells, background jobs) makes the analysis fail.

use std::path::Path;

use crate::analysis::{AnalysisError, CommandResolution, ExecCommandAnalysis, ExecCommandSegment};
use crate::platform::Platform;
use crate::resolver::{CommandEnv, ExecutableResolver, PathEnvResolver};

/// Parses command text into segments with resolved executables.
pub trait ShellAnalyzer: Send + Sync {
    fn analyze(
        &self,
        command: &str,
        cwd: Option<&Path>,
        env: Option<&CommandEnv>,
        platform: &Platform,
    ) -> ExecCommandAnalysis;

    /// Top-level `&&` / `||` / `;` parts, or `None` when splitting does not
    /// apply.
    fn split_chain(&self, command: &str) -> Option<Vec<String>> {
        split_command_chain(command)
    }
}

/// POSIX-style pipeline analyzer backed by an [`ExecutableResolver`].
#[derive(Debug, Clone, Default)]
pub struct DefaultShellAnalyzer<R = PathEnvResolver> {
    resolver: R,
}

impl DefaultShellAnalyzer<PathEnvResolver> {
    /// Analyzer that resolves executables through the process or command `PATH`.
    pub fn system() -> Self {
        Self::new(PathEnvResolver)
    }
}

impl<R: ExecutableResolver> DefaultShellAnalyzer<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    fn build_segments(
        &self,
        stages: Vec<(String, Vec<String>)>,
        cwd: Option<&Path>,
        env: Option<&CommandEnv>,
    ) -> Vec<ExecCommandSegment> {
        stages
            .into_iter()
            .map(|(raw, argv)| {
                let resolution = argv.first().map(|program| {
                    let resolved = self.resolver.resolve(program, cwd, env);
                    CommandResolution::new(program.clone(), resolved)
                });
                ExecCommandSegment {
                    raw,
                    argv,
                    resolution,
                }
            })
            .collect()
    }

    fn analyze_posix(
        &self,
        command: &str,
        cwd: Option<&Path>,
        env: Option<&CommandEnv>,
    ) -> ExecCommandAnalysis {
        if let Some(parts) = split_command_chain(command) {
            let mut chains = Vec::with_capacity(parts.len());
            for part in &parts {
                match parse_posix_pipeline(part) {
                    Ok(stages) => chains.push(self.build_segments(stages, cwd, env)),
                    Err(error) => return ExecCommandAnalysis::Failed(error),
                }
            }
            return ExecCommandAnalysis::Chained(chains);
        }

        parse_posix_pipeline(command)
            .map(|stages| self.build_segments(stages, cwd, env))
            .into()
    }
}

impl<R: ExecutableResolver> ShellAnalyzer for DefaultShellAnalyzer<R> {
    fn analyze(
        &self,
        command: &str,
        cwd: Option<&Path>,
        env: Option<&CommandEnv>,
        platform: &Platform,
    ) -> ExecCommandAnalysis {
        if command.trim().is_empty() {
            return ExecCommandAnalysis::Failed(AnalysisError::Empty);
        }

        let analysis: ExecCommandAnalysis = if platform.is_windows() {
            parse_windows_command(command)
                .map(|stage| self.build_segments(vec![stage], cwd, env))
                .into()
        } else {
            self.analyze_posix(command, cwd, env)
        };

        if let ExecCommandAnalysis::Failed(error) = &analysis {
            tracing::debug!(%error, "shell analysis failed");
        }
        analysis
    }
}

/// Split on top-level `&&`, `||` and `;`, respecting quotes and escapes.
///
/// Returns `None` when the command has no chain operator or when any part
/// would be empty.
pub fn split_command_chain(command: &str) -> Option<Vec<String>> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut found_operator = false;
    let mut chars = command.chars().peekable();

    while let Some(ch) = chars.next() {
        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }

        match quote {
            Some('\'') => {
                if ch == '\'' {
                    quote = None;
                }
                current.push(ch);
                continue;
            }
            Some(_) => {
                match ch {
                    '\\' => escaped = true,
                    '"' => quote = None,
                    _ => {}
                }
                current.push(ch);
                continue;
            }
            None => {}
        }

        let operator = match ch {
            '\\' => {
                escaped = true;
                current.push(ch);
                continue;
            }
            '\'' | '"' => {
                quote = Some(ch);
                current.push(ch);
                continue;
            }
            ';' => true,
            '&' | '|' if chars.peek() == Some(&ch) => {
                chars.next();
                true
            }
            _ => false,
        };

        if operator {
            found_operator = true;
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    parts.push(current);

    if !found_operator {
        return None;
    }

    let parts: Vec<String> = parts.iter().map(|part| part.trim().to_string()).collect();
    if parts.iter().any(String::is_empty) {
        return None;
    }
    Some(parts)
}

type Stage = (String, Vec<String>);

/// Split one chain part into `|` stages and tokenize each.
fn parse_posix_pipeline(command: &str) -> Result<Vec<Stage>, AnalysisError> {
    let raw_stages = scan_posix_stages(command)?;

    raw_stages
        .into_iter()
        .map(|raw| {
            let raw = raw.trim().to_string();
            if raw.is_empty() {
                return Err(AnalysisError::EmptySegment);
            }
            let argv = shell_words::split(&raw)
                .map_err(|error| AnalysisError::Tokenize {
                    message: error.to_string(),
                })?;
            if argv.is_empty() {
                return Err(AnalysisError::EmptySegment);
            }
            Ok((raw, argv))
        })
        .collect()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Quote {
    None,
    Single,
    Double,
}

fn scan_posix_stages(command: &str) -> Result<Vec<String>, AnalysisError> {
    let mut stages = Vec::new();
    let mut current = String::new();
    let mut quote = Quote::None;
    // Unquoted `{` not yet closed; a `,` or `..` inside one is brace expansion.
    let mut brace_depth = 0usize;
    let mut chars = command.chars().peekable();

    while let Some(ch) = chars.next() {
        if matches!(ch, '\n' | '\r') {
            return Err(AnalysisError::unsupported("newline"));
        }

        match quote {
            Quote::Single => {
                if ch == '\'' {
                    quote = Quote::None;
                }
                current.push(ch);
                continue;
            }
            Quote::Double => {
                match ch {
                    '"' => quote = Quote::None,
                    '\\' => {
                        current.push(ch);
                        match chars.next() {
                            Some('\n' | '\r') => {
                                return Err(AnalysisError::unsupported("newline"));
                            }
                            Some(next) => current.push(next),
                            None => {}
                        }
                        continue;
                    }
                    '`' => return Err(AnalysisError::unsupported("`")),
                    '$' => check_dollar(chars.peek().copied())?,
                    _ => {}
                }
                current.push(ch);
                continue;
            }
            Quote::None => {}
        }

        match ch {
            '\\' => {
                current.push(ch);
                match chars.next() {
                    Some('\n' | '\r') => return Err(AnalysisError::unsupported("newline")),
                    Some(next) => current.push(next),
                    None => {}
                }
            }
            '\'' => {
                quote = Quote::Single;
                current.push(ch);
            }
            '"' => {
                quote = Quote::Double;
                current.push(ch);
            }
            '|' => match chars.peek() {
                Some('|') => return Err(AnalysisError::unsupported("||")),
                Some('&') => return Err(AnalysisError::unsupported("|&")),
                _ => stages.push(std::mem::take(&mut current)),
            },
            '&' | ';' | '<' | '>' | '(' | ')' | '`' => {
                return Err(AnalysisError::unsupported(ch.to_string()));
            }
            '$' => {
                check_dollar(chars.peek().copied())?;
                current.push(ch);
            }
            '{' => {
                brace_depth += 1;
                current.push(ch);
            }
            '}' => {
                brace_depth = brace_depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if brace_depth > 0 => return Err(AnalysisError::unsupported("{,}")),
            '.' if brace_depth > 0 && chars.peek() == Some(&'.') => {
                return Err(AnalysisError::unsupported("{..}"));
            }
            _ => current.push(ch),
        }
    }

    match quote {
        Quote::None => {}
        Quote::Single => return Err(AnalysisError::UnterminatedQuote { quote: "single" }),
        Quote::Double => return Err(AnalysisError::UnterminatedQuote { quote: "double" }),
    }

    stages.push(current);
    Ok(stages)
}

/// `$` is literal only when nothing expandable follows it.
fn check_dollar(next: Option<char>) -> Result<(), AnalysisError> {
    match next {
        Some('(') => Err(AnalysisError::unsupported("$(")),
        Some('{') => Err(AnalysisError::unsupported("${")),
        Some('[') => Err(AnalysisError::unsupported("$[")),
        Some('\'') => Err(AnalysisError::unsupported("$'")),
        Some(c)
            if c.is_ascii_alphanumeric()
                || matches!(c, '_' | '?' | '!' | '#' | '@' | '*' | '-' | '$') =>
        {
            Err(AnalysisError::unsupported(format!("${c}")))
        }
        _ => Ok(()),
    }
}

/// Single-segment analysis for `cmd.exe`/PowerShell style command lines.
fn parse_windows_command(command: &str) -> Result<Stage, AnalysisError> {
    let mut argv = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut in_quotes = false;

    for ch in command.chars() {
        if matches!(ch, '\n' | '\r') {
            return Err(AnalysisError::unsupported("newline"));
        }
        if in_quotes {
            if ch == '"' {
                in_quotes = false;
            } else {
                current.push(ch);
            }
            continue;
        }
        match ch {
            '"' => {
                in_quotes = true;
                in_word = true;
            }
            '&' | '|' | '<' | '>' | '^' | '(' | ')' | '%' | '!' | '`' => {
                return Err(AnalysisError::unsupported(ch.to_string()));
            }
            c if c.is_whitespace() => {
                if in_word {
                    argv.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            _ => {
                current.push(ch);
                in_word = true;
            }
        }
    }

    if in_quotes {
        return Err(AnalysisError::UnterminatedQuote { quote: "double" });
    }
    if in_word {
        argv.push(current);
    }
    if argv.is_empty() {
        return Err(AnalysisError::Empty);
    }
    Ok((command.trim().to_string(), argv))
}
