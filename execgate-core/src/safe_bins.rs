//! Canonical safe-bin sets built from configuration input.

use std::collections::BTreeSet;

/// Binaries trusted as stdin filters when no explicit list is configured.
pub const DEFAULT_SAFE_BINS: &[&str] = &[
    "jq", "grep", "cut", "sort", "uniq", "head", "tail", "tr", "wc",
];

/// Lowercase, trimmed, non-empty binary names.
pub type SafeBinSet = BTreeSet<String>;

/// Normalize configured names: trim, lowercase, and drop empties.
///
/// `None` stands for absent or non-list input and yields an empty set.
pub fn normalize_safe_bins<I, S>(entries: Option<I>) -> SafeBinSet
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let Some(entries) = entries else {
        return SafeBinSet::new();
    };

    entries
        .into_iter()
        .map(|entry| entry.as_ref().trim().to_lowercase())
        .filter(|entry| !entry.is_empty())
        .collect()
}

/// Resolve the effective safe-bin set from a possibly-unset setting.
///
/// The outer `Option` is whether the setting was given at all: `None` falls
/// back to [`DEFAULT_SAFE_BINS`]. `Some(None)` is an explicit null and opts out
/// to an empty set, and `Some(Some(list))` normalizes the list as given.
pub fn resolve_safe_bins<I, S>(entries: Option<Option<I>>) -> SafeBinSet
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    match entries {
        None => normalize_safe_bins(Some(DEFAULT_SAFE_BINS)),
        Some(value) => normalize_safe_bins(value),
    }
}

/// Safe-bin set used when the host supplies nothing.
pub fn default_safe_bins() -> SafeBinSet {
    normalize_safe_bins(Some(DEFAULT_SAFE_BINS))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> SafeBinSet {
        names.iter().map(|name| (*name).to_string()).collect()
    }

    #[test]
    fn normalizes_case_whitespace_and_empties() {
        let normalized = normalize_safe_bins(Some(["JQ", " grep ", ""]));
        assert_eq!(normalized, set(&["jq", "grep"]));
    }

    #[test]
    fn absent_input_normalizes_to_empty() {
        assert!(normalize_safe_bins(None::<Vec<String>>).is_empty());
    }

    #[test]
    fn unset_falls_back_to_defaults() {
        let resolved = resolve_safe_bins(None::<Option<Vec<String>>>);
        assert_eq!(resolved, normalize_safe_bins(Some(DEFAULT_SAFE_BINS)));
        assert_eq!(resolved, default_safe_bins());
        assert_eq!(resolved.len(), 9);
    }

    #[test]
    fn explicit_null_opts_out() {
        assert!(resolve_safe_bins(Some(None::<Vec<String>>)).is_empty());
    }

    #[test]
    fn explicit_empty_list_opts_out() {
        assert!(resolve_safe_bins(Some(Some(Vec::<String>::new()))).is_empty());
    }

    #[test]
    fn explicit_list_replaces_defaults() {
        let resolved = resolve_safe_bins(Some(Some(vec!["Sed".to_string()])));
        assert_eq!(resolved, set(&["sed"]));
    }
}
