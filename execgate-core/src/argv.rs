//! Argument-vector validation against a [`SafeBinProfile`].

use crate::profiles::SafeBinProfile;
use crate::tokens::{has_glob_token, is_safe_literal_token};

/// Validate the arguments of one safe-bin invocation (argv without argv[0]).
///
/// Returns true only when no token is rejected and the positional count stays
/// within the profile bounds.
pub fn validate_safe_bin_argv<S: AsRef<str>>(args: &[S], profile: &SafeBinProfile) -> bool {
    let mut positional = 0usize;
    let mut index = 0usize;

    while let Some(token) = args.get(index).map(AsRef::as_ref) {
        index += 1;

        if token == "--" {
            for rest in args.iter().skip(index).map(AsRef::as_ref) {
                if rest == "-" {
                    continue;
                }
                if !is_safe_literal_token(rest) {
                    return false;
                }
                positional += 1;
            }
            break;
        }

        if token == "-" {
            continue;
        }

        if !token.starts_with('-') {
            if !is_safe_literal_token(token) {
                return false;
            }
            positional += 1;
            continue;
        }

        if let Some(long) = token.strip_prefix("--") {
            let (name, inline_value) = match long.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (long, None),
            };
            let flag = format!("--{name}");
            if profile.is_blocked_flag(&flag) {
                return false;
            }
            match inline_value {
                Some(value) => {
                    if !is_safe_literal_token(value) {
                        return false;
                    }
                }
                None if profile.is_value_flag(&flag) => {
                    if !next_value_is_safe(args, index) {
                        return false;
                    }
                    index += 1;
                }
                None => {}
            }
            continue;
        }

        match check_short_cluster(token, profile) {
            ShortCluster::Rejected => return false,
            ShortCluster::InlineValue => {}
            ShortCluster::NeedsNextValue => {
                if !next_value_is_safe(args, index) {
                    return false;
                }
                index += 1;
            }
            ShortCluster::FlagsOnly => {
                if has_glob_token(token) {
                    return false;
                }
            }
        }
    }

    if positional < profile.min_positional {
        return false;
    }
    profile
        .max_positional
        .is_none_or(|max_positional| positional <= max_positional)
}

fn next_value_is_safe<S: AsRef<str>>(args: &[S], index: usize) -> bool {
    args.get(index)
        .map(AsRef::as_ref)
        .is_some_and(is_safe_literal_token)
}

enum ShortCluster {
    Rejected,
    /// A value flag consumed the rest of the cluster.
    InlineValue,
    /// A value flag ended the cluster; its value is the next token.
    NeedsNextValue,
    /// No value flag in the cluster.
    FlagsOnly,
}

/// Walk a `-abc` cluster one character at a time. The first value flag ends
/// the walk and claims either the remainder of the cluster or the next token.
fn check_short_cluster(token: &str, profile: &SafeBinProfile) -> ShortCluster {
    let body = token.strip_prefix('-').unwrap_or(token);

    for (offset, ch) in body.char_indices() {
        let flag = format!("-{ch}");
        if profile.is_blocked_flag(&flag) {
            return ShortCluster::Rejected;
        }
        if profile.is_value_flag(&flag) {
            let remainder = body.get(offset + ch.len_utf8()..).unwrap_or_default();
            if remainder.is_empty() {
                return ShortCluster::NeedsNextValue;
            }
            if !is_safe_literal_token(remainder) {
                return ShortCluster::Rejected;
            }
            return ShortCluster::InlineValue;
        }
    }

    ShortCluster::FlagsOnly
}
