mod common;

use common::{Policy, analyzer};
use execgate_core::{
    ExecApprovalGate, GateSettings, Platform, evaluate_shell_allowlist, is_safe_literal_token,
    profile_for, validate_safe_bin_argv,
};
use proptest::prelude::*;

fn word() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("grep".to_string()),
        Just("jq".to_string()),
        Just("head".to_string()),
        Just("wc".to_string()),
        Just("rm".to_string()),
        Just("-n".to_string()),
        Just("-e".to_string()),
        Just("-r".to_string()),
        Just("--lines=5".to_string()),
        Just("*.txt".to_string()),
        Just("./x".to_string()),
        Just("5".to_string()),
        "[a-z]{1,6}",
    ]
}

fn separator() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just(" "),
        Just(" | "),
        Just(" && "),
        Just(" || "),
        Just("; "),
        Just(" > "),
        Just(" $("),
        Just(" '"),
    ]
}

fn command() -> impl Strategy<Value = String> {
    (word(), prop::collection::vec((separator(), word()), 0..6)).prop_map(|(first, rest)| {
        let mut command = first;
        for (separator, word) in rest {
            command.push_str(separator);
            command.push_str(&word);
        }
        command
    })
}

proptest! {
    #[test]
    fn shell_evaluation_is_deterministic(command in command()) {
        let policy = Policy::default();
        let analyzer = analyzer();
        let first = evaluate_shell_allowlist(&command, &analyzer, None, &policy.params());
        let second = evaluate_shell_allowlist(&command, &analyzer, None, &policy.params());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn cached_gate_matches_uncached_gate(command in command()) {
        let settings = GateSettings::default().with_platform(Platform::Linux);
        let uncached = ExecApprovalGate::new(settings.clone(), analyzer());
        let cached = ExecApprovalGate::new(settings, analyzer()).with_cache(16);

        let expected = uncached.evaluate(&command, None, None);
        prop_assert_eq!(cached.evaluate(&command, None, None), expected.clone());
        prop_assert_eq!(cached.evaluate(&command, None, None), expected);
    }

    #[test]
    fn approval_implies_every_segment_is_attributed(command in command()) {
        let policy = Policy::default();
        let result = evaluate_shell_allowlist(&command, &analyzer(), None, &policy.params());
        if result.allowlist_satisfied {
            prop_assert!(result.analysis_ok);
            prop_assert_eq!(result.segment_satisfied_by.len(), result.segments.len());
            prop_assert!(result.segment_satisfied_by.iter().all(Option::is_some));
        }
    }

    #[test]
    fn argv_with_unsafe_positional_never_validates(
        prefix in prop::collection::vec("-[a-z]", 0..3),
        positional in prop_oneof!["/[a-z]{1,8}", "\\./[a-z]{1,8}", "[a-z]{1,4}\\*"],
    ) {
        prop_assume!(!is_safe_literal_token(&positional));
        let mut args = prefix;
        args.push("--".to_string());
        args.push(positional);
        prop_assert!(!validate_safe_bin_argv(&args, profile_for("awk")));
    }
}
