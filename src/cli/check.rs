use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use execgate_config::ConfigManager;
use execgate_core::{ExecAllowlistAnalysis, ExecApprovalGate, ExecApprovalRequirement, Platform};
use serde::Serialize;

use super::args::CheckOptions;

#[derive(Debug, Serialize)]
struct CheckReport<'a> {
    command: &'a str,
    cwd: &'a Path,
    platform: String,
    #[serde(flatten)]
    analysis: &'a ExecAllowlistAnalysis,
    requirement: &'a ExecApprovalRequirement,
}

/// Evaluate one command. Exits 0 only when it may run without approval.
pub fn handle_check_command(manager: &ConfigManager, options: &CheckOptions) -> Result<ExitCode> {
    let command = options.command_text();
    let cwd = match &options.cwd {
        Some(cwd) => cwd.clone(),
        None => std::env::current_dir().context("Failed to resolve current directory")?,
    };

    let mut settings = manager.config().exec.to_gate_settings();
    if let Some(name) = &options.platform {
        settings = settings.with_platform(parse_platform(name));
    }
    let (security, ask) = (settings.security, settings.ask);
    let platform = settings.platform.to_string();

    let gate = ExecApprovalGate::system(settings);
    let analysis = gate.evaluate(&command, Some(cwd.as_path()), None);
    let requirement = ExecApprovalRequirement::from_analysis(security, ask, &analysis);

    if options.json {
        let report = CheckReport {
            command: &command,
            cwd: &cwd,
            platform,
            analysis: &analysis,
            requirement: &requirement,
        };
        let json =
            serde_json::to_string_pretty(&report).context("Failed to serialize check report")?;
        println!("{json}");
    } else {
        print_report(&command, &cwd, &analysis, &requirement);
    }

    Ok(if requirement.can_proceed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn parse_platform(name: &str) -> Platform {
    name.parse::<Platform>().unwrap_or_else(|never| match never {})
}

fn print_report(
    command: &str,
    cwd: &Path,
    analysis: &ExecAllowlistAnalysis,
    requirement: &ExecApprovalRequirement,
) {
    println!("command:   {command}");
    println!("cwd:       {}", cwd.display());
    println!(
        "analysis:  {}",
        if analysis.analysis_ok { "ok" } else { "failed" }
    );
    println!(
        "allowlist: {}",
        if analysis.allowlist_satisfied {
            "satisfied"
        } else {
            "not satisfied"
        }
    );

    for (index, segment) in analysis.segments.iter().enumerate() {
        let attribution = match analysis.segment_satisfied_by.get(index) {
            Some(Some(by)) => by.as_str(),
            Some(None) => "denied",
            None => "not evaluated",
        };
        let resolved = segment
            .resolution
            .as_ref()
            .and_then(|resolution| resolution.resolved_path.as_ref())
            .map_or_else(|| "unresolved".to_string(), |path| path.display().to_string());
        println!("  [{index}] {} -> {attribution} ({resolved})", segment.raw);
    }

    if let Some(denial) = &analysis.denial {
        println!("denial:    {denial}");
    }

    match requirement {
        ExecApprovalRequirement::Skip => println!("decision:  run without approval"),
        ExecApprovalRequirement::NeedsApproval { reason } => {
            println!("decision:  needs approval ({reason})");
        }
        ExecApprovalRequirement::Forbidden { reason } => {
            println!("decision:  forbidden ({reason})");
        }
    }
}
