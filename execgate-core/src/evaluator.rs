//! Segment and chain evaluation.
//!
//! Every pipeline segment of every chain part must be satisfied by an
//! allowlist entry, by safe-bin usage, or by a skill bin. One unsatisfied
//! segment denies the whole command.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::allowlist::{ExecAllowlistEntry, match_allowlist, resolve_allowlist_candidate_path};
use crate::analysis::{AnalysisError, CommandResolution, ExecCommandAnalysis, ExecCommandSegment};
use crate::platform::Platform;
use crate::resolver::CommandEnv;
use crate::safe_bin_gate::{SafeBinCheck, SafeBinDenial, check_safe_bin_usage};
use crate::safe_bins::SafeBinSet;
use crate::shell_parser::ShellAnalyzer;
use crate::trust::TrustedSafeBinDirs;

/// Lowercase names of binaries shipped by trusted skills.
pub type SkillBinSet = BTreeSet<String>;

/// What allowed a segment to run without approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SatisfiedBy {
    Allowlist,
    SafeBins,
    Skills,
}

impl SatisfiedBy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Allowlist => "allowlist",
            Self::SafeBins => "safe_bins",
            Self::Skills => "skills",
        }
    }
}

impl fmt::Display for SatisfiedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First reason a command was not auto-approved.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DenialReason {
    #[error("analysis failed: {error}")]
    AnalysisFailure { error: AnalysisError },
    #[error("command has no segments")]
    NoSegments,
    #[error("segment {index} ('{executable}') is not allowed: {reason}")]
    SegmentDenied {
        index: usize,
        executable: String,
        reason: SafeBinDenial,
    },
}

/// Caller-supplied policy for one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct AllowlistEvaluationParams<'a> {
    pub allowlist: &'a [ExecAllowlistEntry],
    pub safe_bins: &'a SafeBinSet,
    pub cwd: Option<&'a Path>,
    pub platform: &'a Platform,
    pub trusted_dirs: &'a TrustedSafeBinDirs,
    pub skill_bins: &'a SkillBinSet,
    pub auto_allow_skills: bool,
}

/// Outcome of evaluating an analyzed command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecAllowlistEvaluation {
    pub allowlist_satisfied: bool,
    pub allowlist_matches: Vec<ExecAllowlistEntry>,
    /// One entry per evaluated segment; `None` marks the unsatisfied one.
    pub segment_satisfied_by: Vec<Option<SatisfiedBy>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denial: Option<DenialReason>,
}

impl ExecAllowlistEvaluation {
    fn denied(denial: DenialReason) -> Self {
        Self {
            denial: Some(denial),
            ..Self::default()
        }
    }
}

/// Evaluation of a raw command string, with the analyzed segments attached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecAllowlistAnalysis {
    pub analysis_ok: bool,
    pub allowlist_satisfied: bool,
    pub allowlist_matches: Vec<ExecAllowlistEntry>,
    pub segments: Vec<ExecCommandSegment>,
    pub segment_satisfied_by: Vec<Option<SatisfiedBy>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denial: Option<DenialReason>,
}

impl ExecAllowlistAnalysis {
    /// True when the command may run without human confirmation under an
    /// allowlist policy.
    pub fn is_auto_approvable(&self) -> bool {
        self.analysis_ok && self.allowlist_satisfied
    }
}

/// Evaluate one pipeline. Stops at the first unsatisfied segment.
pub fn evaluate_segments(
    segments: &[ExecCommandSegment],
    params: &AllowlistEvaluationParams<'_>,
) -> ExecAllowlistEvaluation {
    evaluate_segments_from(segments, params, 0)
}

fn evaluate_segments_from(
    segments: &[ExecCommandSegment],
    params: &AllowlistEvaluationParams<'_>,
    offset: usize,
) -> ExecAllowlistEvaluation {
    let mut evaluation = ExecAllowlistEvaluation {
        allowlist_satisfied: true,
        ..ExecAllowlistEvaluation::default()
    };

    for (position, segment) in segments.iter().enumerate() {
        let index = offset + position;
        match satisfy_segment(segment, params) {
            Ok((by, matched)) => {
                tracing::debug!(
                    index,
                    executable = ?segment.executable_name(),
                    satisfied_by = %by,
                    "segment satisfied"
                );
                evaluation.allowlist_matches.extend(matched);
                evaluation.segment_satisfied_by.push(Some(by));
            }
            Err(reason) => {
                let executable = segment
                    .executable_name()
                    .or_else(|| segment.argv.first().map(String::as_str))
                    .unwrap_or_default()
                    .to_string();
                tracing::debug!(index, %executable, %reason, "segment not satisfied");
                evaluation.segment_satisfied_by.push(None);
                evaluation.allowlist_satisfied = false;
                evaluation.denial = Some(DenialReason::SegmentDenied {
                    index,
                    executable,
                    reason,
                });
                break;
            }
        }
    }

    evaluation
}

/// Allowlist first, then safe bins, then skill bins.
fn satisfy_segment(
    segment: &ExecCommandSegment,
    params: &AllowlistEvaluationParams<'_>,
) -> Result<(SatisfiedBy, Option<ExecAllowlistEntry>), SafeBinDenial> {
    let resolution = segment.resolution.as_ref();

    let candidate = resolve_allowlist_candidate_path(resolution, params.cwd);
    let candidate_resolution = resolution.map(|resolution| CommandResolution {
        resolved_path: candidate,
        ..resolution.clone()
    });
    if let Some(entry) = match_allowlist(params.allowlist, candidate_resolution.as_ref()) {
        return Ok((SatisfiedBy::Allowlist, Some(entry.clone())));
    }

    let safe_bin = check_safe_bin_usage(&SafeBinCheck {
        argv: &segment.argv,
        resolution,
        safe_bins: params.safe_bins,
        platform: params.platform,
        trusted_dirs: params.trusted_dirs,
    });
    let denial = match safe_bin {
        Ok(()) => return Ok((SatisfiedBy::SafeBins, None)),
        Err(denial) => denial,
    };

    if is_skill_bin(resolution, params) {
        return Ok((SatisfiedBy::Skills, None));
    }

    Err(denial)
}

fn is_skill_bin(
    resolution: Option<&CommandResolution>,
    params: &AllowlistEvaluationParams<'_>,
) -> bool {
    if !params.auto_allow_skills || params.skill_bins.is_empty() {
        return false;
    }
    resolution
        .map(|resolution| resolution.executable_name.trim().to_lowercase())
        .is_some_and(|name| !name.is_empty() && params.skill_bins.contains(&name))
}

/// Evaluate an analyzed command.
///
/// For a chained command every part is evaluated independently; the first
/// unsatisfied part denies the whole command and discards everything the
/// earlier parts matched.
pub fn evaluate_exec_allowlist(
    analysis: &ExecCommandAnalysis,
    params: &AllowlistEvaluationParams<'_>,
) -> ExecAllowlistEvaluation {
    match analysis {
        ExecCommandAnalysis::Failed(error) => {
            ExecAllowlistEvaluation::denied(DenialReason::AnalysisFailure {
                error: error.clone(),
            })
        }
        _ if analysis.segment_count() == 0 => {
            ExecAllowlistEvaluation::denied(DenialReason::NoSegments)
        }
        ExecCommandAnalysis::Simple(segments) => evaluate_segments(segments, params),
        ExecCommandAnalysis::Chained(chains) => {
            let mut combined = ExecAllowlistEvaluation {
                allowlist_satisfied: true,
                ..ExecAllowlistEvaluation::default()
            };
            let mut offset = 0;
            for (part, chain) in chains.iter().enumerate() {
                let evaluation = evaluate_segments_from(chain, params, offset);
                if !evaluation.allowlist_satisfied || chain.is_empty() {
                    tracing::debug!(part, "chain part not satisfied");
                    return ExecAllowlistEvaluation::denied(
                        evaluation.denial.unwrap_or(DenialReason::NoSegments),
                    );
                }
                offset += chain.len();
                combined.allowlist_matches.extend(evaluation.allowlist_matches);
                combined
                    .segment_satisfied_by
                    .extend(evaluation.segment_satisfied_by);
            }
            combined
        }
    }
}

/// Evaluate a raw command string.
///
/// Chain parts are analyzed one by one. The first part that fails analysis or
/// is not satisfied ends the evaluation; what was collected up to that point is
/// still returned, so `segment_satisfied_by[i]` always describes `segments[i]`.
pub fn evaluate_shell_allowlist<A: ShellAnalyzer + ?Sized>(
    command: &str,
    analyzer: &A,
    env: Option<&CommandEnv>,
    params: &AllowlistEvaluationParams<'_>,
) -> ExecAllowlistAnalysis {
    let chain_parts = if params.platform.is_windows() {
        None
    } else {
        analyzer.split_chain(command)
    };

    let Some(parts) = chain_parts else {
        let analysis = analyzer.analyze(command, params.cwd, env, params.platform);
        let evaluation = evaluate_exec_allowlist(&analysis, params);
        return ExecAllowlistAnalysis {
            analysis_ok: analysis.is_ok(),
            allowlist_satisfied: analysis.is_ok() && evaluation.allowlist_satisfied,
            allowlist_matches: evaluation.allowlist_matches,
            segments: analysis.into_segments(),
            segment_satisfied_by: evaluation.segment_satisfied_by,
            denial: evaluation.denial,
        };
    };

    let mut result = ExecAllowlistAnalysis {
        analysis_ok: true,
        allowlist_satisfied: true,
        ..ExecAllowlistAnalysis::default()
    };

    for (part_index, part) in parts.iter().enumerate() {
        let analysis = analyzer.analyze(part, params.cwd, env, params.platform);
        if let ExecCommandAnalysis::Failed(error) = &analysis {
            tracing::debug!(part = part_index, %error, "chain part failed analysis");
            result.analysis_ok = false;
            result.allowlist_satisfied = false;
            if result.denial.is_none() {
                result.denial = Some(DenialReason::AnalysisFailure {
                    error: error.clone(),
                });
            }
            return result;
        }

        let evaluation = evaluate_exec_allowlist(&analysis, params);
        result.allowlist_matches.extend(evaluation.allowlist_matches);
        result
            .segment_satisfied_by
            .extend(evaluation.segment_satisfied_by);
        result.segments.extend(analysis.into_segments());
        if !evaluation.allowlist_satisfied {
            tracing::debug!(part = part_index, "chain part not satisfied");
            result.allowlist_satisfied = false;
            result.denial = evaluation.denial;
            return result;
        }
    }

    result
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::safe_bins::default_safe_bins;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn segment(argv: &[&str], resolved: Option<&str>) -> ExecCommandSegment {
        let argv: Vec<String> = argv.iter().map(|arg| (*arg).to_string()).collect();
        let resolution = CommandResolution::new(argv[0].clone(), resolved.map(PathBuf::from));
        ExecCommandSegment {
            raw: argv.join(" "),
            argv,
            resolution: Some(resolution),
        }
    }

    struct Fixture {
        allowlist: Vec<ExecAllowlistEntry>,
        safe_bins: SafeBinSet,
        trusted: TrustedSafeBinDirs,
        skills: SkillBinSet,
        platform: Platform,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                allowlist: Vec::new(),
                safe_bins: default_safe_bins(),
                trusted: TrustedSafeBinDirs::default(),
                skills: SkillBinSet::new(),
                platform: Platform::Linux,
            }
        }

        fn params(&self, auto_allow_skills: bool) -> AllowlistEvaluationParams<'_> {
            AllowlistEvaluationParams {
                allowlist: &self.allowlist,
                safe_bins: &self.safe_bins,
                cwd: Some(Path::new("/work")),
                platform: &self.platform,
                trusted_dirs: &self.trusted,
                skill_bins: &self.skills,
                auto_allow_skills,
            }
        }
    }

    #[test]
    fn attributes_each_segment_in_priority_order() {
        let mut fixture = Fixture::new();
        fixture
            .allowlist
            .push(ExecAllowlistEntry::new("/opt/tools/fmt").with_id("fmt"));
        fixture.skills.insert("summarize".into());
        let segments = vec![
            segment(&["fmt"], Some("/opt/tools/fmt")),
            segment(&["grep", "-e", "foo"], Some("/usr/bin/grep")),
            segment(&["summarize"], Some("/home/u/.skills/summarize")),
        ];

        let evaluation = evaluate_segments(&segments, &fixture.params(true));
        assert!(evaluation.allowlist_satisfied);
        assert_eq!(
            evaluation.segment_satisfied_by,
            vec![
                Some(SatisfiedBy::Allowlist),
                Some(SatisfiedBy::SafeBins),
                Some(SatisfiedBy::Skills)
            ]
        );
        assert_eq!(evaluation.allowlist_matches.len(), 1);
        assert_eq!(evaluation.denial, None);
    }

    #[test]
    fn allowlist_wins_over_safe_bins() {
        let mut fixture = Fixture::new();
        fixture.allowlist.push(ExecAllowlistEntry::new("/usr/bin/*"));
        let segments = vec![segment(&["grep", "foo"], Some("/usr/bin/grep"))];

        let evaluation = evaluate_segments(&segments, &fixture.params(false));
        assert_eq!(
            evaluation.segment_satisfied_by,
            vec![Some(SatisfiedBy::Allowlist)]
        );
    }

    #[test]
    fn skills_require_the_auto_allow_flag() {
        let mut fixture = Fixture::new();
        fixture.skills.insert("summarize".into());
        let segments = vec![segment(&["Summarize"], Some("/home/u/.skills/Summarize"))];

        assert!(evaluate_segments(&segments, &fixture.params(true)).allowlist_satisfied);
        let evaluation = evaluate_segments(&segments, &fixture.params(false));
        assert!(!evaluation.allowlist_satisfied);
        assert_eq!(evaluation.segment_satisfied_by, vec![None]);
    }

    #[test]
    fn stops_at_first_unsatisfied_segment() {
        let fixture = Fixture::new();
        let segments = vec![
            segment(&["grep", "foo"], Some("/usr/bin/grep")),
            segment(&["curl", "evil.example"], Some("/usr/bin/curl")),
            segment(&["wc", "-l"], Some("/usr/bin/wc")),
        ];

        let evaluation = evaluate_segments(&segments, &fixture.params(false));
        assert!(!evaluation.allowlist_satisfied);
        assert_eq!(
            evaluation.segment_satisfied_by,
            vec![Some(SatisfiedBy::SafeBins), None]
        );
        assert_eq!(
            evaluation.denial,
            Some(DenialReason::SegmentDenied {
                index: 1,
                executable: "curl".into(),
                reason: SafeBinDenial::NotASafeBin {
                    name: "curl".into()
                },
            })
        );
    }

    #[test]
    fn failed_or_empty_analysis_denies_with_nothing_attributed() {
        let fixture = Fixture::new();
        let failed = ExecCommandAnalysis::Failed(AnalysisError::unsupported("$("));
        let evaluation = evaluate_exec_allowlist(&failed, &fixture.params(false));
        assert!(!evaluation.allowlist_satisfied);
        assert!(evaluation.segment_satisfied_by.is_empty());

        let empty = ExecCommandAnalysis::Simple(Vec::new());
        let evaluation = evaluate_exec_allowlist(&empty, &fixture.params(false));
        assert_eq!(evaluation.denial, Some(DenialReason::NoSegments));
    }

    #[test]
    fn unsatisfied_chain_part_discards_earlier_matches() {
        let mut fixture = Fixture::new();
        fixture.allowlist.push(ExecAllowlistEntry::new("/opt/tools/*"));
        let analysis = ExecCommandAnalysis::Chained(vec![
            vec![segment(&["fmt"], Some("/opt/tools/fmt"))],
            vec![segment(&["rm", "-rf", "/tmp/x"], Some("/usr/bin/rm"))],
        ]);

        let evaluation = evaluate_exec_allowlist(&analysis, &fixture.params(false));
        assert!(!evaluation.allowlist_satisfied);
        assert!(evaluation.allowlist_matches.is_empty());
        assert!(evaluation.segment_satisfied_by.is_empty());
        assert!(matches!(
            evaluation.denial,
            Some(DenialReason::SegmentDenied { index: 1, .. })
        ));
    }

    #[test]
    fn satisfied_chain_accumulates_every_part() {
        let mut fixture = Fixture::new();
        fixture.allowlist.push(ExecAllowlistEntry::new("/opt/tools/*"));
        let analysis = ExecCommandAnalysis::Chained(vec![
            vec![segment(&["fmt"], Some("/opt/tools/fmt"))],
            vec![segment(&["head", "-n", "3"], Some("/usr/bin/head"))],
        ]);

        let evaluation = evaluate_exec_allowlist(&analysis, &fixture.params(false));
        assert!(evaluation.allowlist_satisfied);
        assert_eq!(evaluation.allowlist_matches.len(), 1);
        assert_eq!(
            evaluation.segment_satisfied_by,
            vec![Some(SatisfiedBy::Allowlist), Some(SatisfiedBy::SafeBins)]
        );
    }

    #[test]
    fn windows_honors_only_the_allowlist() {
        let mut fixture = Fixture::new();
        fixture.platform = Platform::Windows;
        let segments = vec![segment(&["grep", "foo"], Some("/usr/bin/grep"))];
        assert!(!evaluate_segments(&segments, &fixture.params(false)).allowlist_satisfied);

        fixture.allowlist.push(ExecAllowlistEntry::new("/usr/bin/grep"));
        assert!(evaluate_segments(&segments, &fixture.params(false)).allowlist_satisfied);
    }

    #[test]
    fn shell_attributions_stay_aligned_after_a_denied_part() {
        struct Table;

        impl crate::resolver::ExecutableResolver for Table {
            fn resolve(
                &self,
                raw: &str,
                _cwd: Option<&Path>,
                _env: Option<&CommandEnv>,
            ) -> Option<PathBuf> {
                Some(PathBuf::from("/usr/bin").join(raw))
            }
        }

        let fixture = Fixture::new();
        let analyzer = crate::shell_parser::DefaultShellAnalyzer::new(Table);
        let result = evaluate_shell_allowlist(
            "grep foo | curl x | wc -l; head -n 1",
            &analyzer,
            None,
            &fixture.params(false),
        );

        assert!(result.analysis_ok);
        assert!(!result.allowlist_satisfied);
        assert_eq!(
            result.segment_satisfied_by,
            vec![Some(SatisfiedBy::SafeBins), None]
        );
        let executables: Vec<_> = result
            .segments
            .iter()
            .filter_map(ExecCommandSegment::executable_name)
            .collect();
        assert_eq!(executables, vec!["grep", "curl", "wc"]);
        assert!(matches!(
            result.denial,
            Some(DenialReason::SegmentDenied { index: 1, .. })
        ));
    }

    #[test]
    fn relative_executables_match_allowlist_through_cwd() {
        let mut fixture = Fixture::new();
        fixture
            .allowlist
            .push(ExecAllowlistEntry::new("/work/scripts/*"));
        let segments = vec![segment(&["./scripts/build"], None)];
        let evaluation = evaluate_segments(&segments, &fixture.params(false));
        assert_eq!(
            evaluation.segment_satisfied_by,
            vec![Some(SatisfiedBy::Allowlist)]
        );
    }
}
