//! Usage profiles for the well-known filtering binaries.
//!
//! Every profile either forbids or tightly bounds the ways a "pure filter"
//! could be coerced into reading or writing files instead of stdin. The table
//! is built once per process and never mutated afterwards.

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

/// Argument shape a safe bin is allowed to be invoked with.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SafeBinProfile {
    /// Minimum number of positional arguments.
    pub min_positional: usize,
    /// Maximum number of positional arguments, `None` when unbounded.
    pub max_positional: Option<usize>,
    /// Flags that consume the following token as their value.
    pub value_flags: HashSet<&'static str>,
    /// Flags that unconditionally fail validation.
    pub blocked_flags: HashSet<&'static str>,
}

impl SafeBinProfile {
    fn new(
        min_positional: usize,
        max_positional: Option<usize>,
        value_flags: &[&'static str],
        blocked_flags: &[&'static str],
    ) -> Self {
        Self {
            min_positional,
            max_positional,
            value_flags: value_flags.iter().copied().collect(),
            blocked_flags: blocked_flags.iter().copied().collect(),
        }
    }

    pub fn is_value_flag(&self, flag: &str) -> bool {
        self.value_flags.contains(flag)
    }

    pub fn is_blocked_flag(&self, flag: &str) -> bool {
        self.blocked_flags.contains(flag)
    }
}

static SAFE_BIN_PROFILES: LazyLock<BTreeMap<&'static str, SafeBinProfile>> =
    LazyLock::new(build_profiles);

static GENERIC_PROFILE: LazyLock<SafeBinProfile> = LazyLock::new(SafeBinProfile::default);

fn build_profiles() -> BTreeMap<&'static str, SafeBinProfile> {
    let mut profiles = BTreeMap::new();

    profiles.insert(
        "jq",
        SafeBinProfile::new(
            0,
            Some(1),
            &[
                "--arg",
                "--argjson",
                "--argstr",
                "--argfile",
                "--rawfile",
                "--slurpfile",
                "--from-file",
                "--library-path",
                "-L",
                "-f",
            ],
            &[
                "--argfile",
                "--rawfile",
                "--slurpfile",
                "--from-file",
                "--library-path",
                "-L",
                "-f",
            ],
        ),
    );

    profiles.insert(
        "grep",
        SafeBinProfile::new(
            0,
            Some(1),
            &[
                "--regexp",
                "--file",
                "--max-count",
                "--after-context",
                "--before-context",
                "--context",
                "--devices",
                "--directories",
                "--binary-files",
                "--exclude",
                "--exclude-from",
                "--include",
                "--label",
                "-e",
                "-f",
                "-m",
                "-A",
                "-B",
                "-C",
                "-D",
                "-d",
            ],
            &[
                "--file",
                "--exclude-from",
                "--dereference-recursive",
                "--directories",
                "--recursive",
                "-f",
                "-d",
                "-r",
                "-R",
            ],
        ),
    );

    profiles.insert(
        "cut",
        SafeBinProfile::new(
            0,
            Some(0),
            &[
                "--bytes",
                "--characters",
                "--fields",
                "--delimiter",
                "--output-delimiter",
                "-b",
                "-c",
                "-f",
                "-d",
            ],
            &[],
        ),
    );

    profiles.insert(
        "sort",
        SafeBinProfile::new(
            0,
            Some(0),
            &[
                "--key",
                "--field-separator",
                "--buffer-size",
                "--temporary-directory",
                "--compress-program",
                "--parallel",
                "--batch-size",
                "--random-source",
                "--files0-from",
                "--output",
                "-k",
                "-t",
                "-S",
                "-T",
                "-o",
            ],
            &["--files0-from", "--output", "-o"],
        ),
    );

    profiles.insert(
        "uniq",
        SafeBinProfile::new(
            0,
            Some(0),
            &[
                "--skip-fields",
                "--skip-chars",
                "--check-chars",
                "--group",
                "-f",
                "-s",
                "-w",
            ],
            &[],
        ),
    );

    profiles.insert(
        "head",
        SafeBinProfile::new(0, Some(0), &["--lines", "--bytes", "-n", "-c"], &[]),
    );

    profiles.insert(
        "tail",
        SafeBinProfile::new(
            0,
            Some(0),
            &[
                "--lines",
                "--bytes",
                "--sleep-interval",
                "--max-unchanged-stats",
                "--pid",
                "-n",
                "-c",
            ],
            &[],
        ),
    );

    profiles.insert("tr", SafeBinProfile::new(1, Some(2), &[], &[]));

    profiles.insert(
        "wc",
        SafeBinProfile::new(0, Some(0), &["--files0-from"], &["--files0-from"]),
    );

    profiles
}

/// Profile registered for `name`, if any. Lookup is case-insensitive.
pub fn registered_profile(name: &str) -> Option<&'static SafeBinProfile> {
    SAFE_BIN_PROFILES.get(name.to_ascii_lowercase().as_str())
}

/// Profile for `name`, falling back to the permissive generic profile.
pub fn profile_for(name: &str) -> &'static SafeBinProfile {
    registered_profile(name).unwrap_or_else(generic_profile)
}

/// Profile applied to safe bins without a dedicated entry: no flag
/// restrictions and no positional bound.
pub fn generic_profile() -> &'static SafeBinProfile {
    &GENERIC_PROFILE
}

/// Registered profiles in name order.
pub fn registered_profiles() -> impl Iterator<Item = (&'static str, &'static SafeBinProfile)> {
    SAFE_BIN_PROFILES
        .iter()
        .map(|(name, profile)| (*name, profile))
}
