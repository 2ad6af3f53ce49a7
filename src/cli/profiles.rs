use execgate_core::{SafeBinProfile, profile_for, registered_profile, registered_profiles};

pub fn handle_profiles_command(binary: Option<&str>) {
    match binary {
        Some(name) => {
            let normalized = name.trim().to_lowercase();
            if registered_profile(&normalized).is_none() {
                println!("{normalized} has no registered profile; the generic profile applies");
            }
            print_profile(&normalized, profile_for(&normalized));
        }
        None => {
            for (name, profile) in registered_profiles() {
                print_profile(name, profile);
            }
        }
    }
}

fn print_profile(name: &str, profile: &SafeBinProfile) {
    let max = profile
        .max_positional
        .map_or_else(|| "unbounded".to_string(), |max| max.to_string());
    println!("{name}");
    println!("  positional:   {}..{max}", profile.min_positional);
    println!("  value flags:  {}", sorted_flags(&profile.value_flags));
    println!("  blocked:      {}", sorted_flags(&profile.blocked_flags));
}

fn sorted_flags(flags: &std::collections::HashSet<&'static str>) -> String {
    if flags.is_empty() {
        return "-".to_string();
    }
    let mut flags: Vec<&str> = flags.iter().copied().collect();
    flags.sort_unstable();
    flags.join(" ")
}
