//! Token classification for safe-bin arguments.
//!
//! Safe bins are only meant to filter stdin. Any argument that could make one
//! of them open a file (a path) or make the shell expand into file names (a
//! glob) disqualifies the invocation from auto-approval.

const GLOB_CHARS: [char; 4] = ['*', '?', '[', ']'];

/// Returns true when the token looks like an explicit filesystem path.
///
/// Only tokens with an explicit relative or absolute prefix are recognized.
/// Bare names such as `notes.txt` are not classified as paths.
pub fn is_path_like_token(token: &str) -> bool {
    let trimmed = token.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return false;
    }

    if trimmed.starts_with("./")
        || trimmed.starts_with("../")
        || trimmed.starts_with('~')
        || trimmed.starts_with('/')
    {
        return true;
    }

    has_windows_drive_prefix(trimmed)
}

/// `C:\` or `c:/` style prefix.
fn has_windows_drive_prefix(token: &str) -> bool {
    let mut chars = token.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(letter), Some(':'), Some('/' | '\\')) if letter.is_ascii_alphabetic()
    )
}

/// Returns true when the token contains a shell glob metacharacter.
pub fn has_glob_token(token: &str) -> bool {
    token.contains(GLOB_CHARS)
}

/// Admissibility test for positional arguments and flag values.
///
/// Empty tokens and the stdin placeholder `-` are always admissible; anything
/// else must be neither glob-like nor path-like.
pub fn is_safe_literal_token(token: &str) -> bool {
    if token.is_empty() || token == "-" {
        return true;
    }
    !has_glob_token(token) && !is_path_like_token(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_explicit_path_prefixes() {
        for token in ["./a", "../etc/passwd", "~", "~/notes", "/etc/shadow", " /tmp "] {
            assert!(is_path_like_token(token), "{token} should be path-like");
        }
    }

    #[test]
    fn recognizes_windows_drive_prefixes() {
        assert!(is_path_like_token("C:\\Windows"));
        assert!(is_path_like_token("d:/data"));
        assert!(!is_path_like_token("C:"));
        assert!(!is_path_like_token("1:/x"));
    }

    #[test]
    fn bare_names_are_not_path_like() {
        assert!(!is_path_like_token("notes.txt"));
        assert!(!is_path_like_token("dir/file"));
        assert!(!is_path_like_token("-"));
        assert!(!is_path_like_token("   "));
    }

    #[test]
    fn detects_glob_characters() {
        assert!(has_glob_token("a*.txt"));
        assert!(has_glob_token("file?"));
        assert!(has_glob_token("[abc]"));
        assert!(has_glob_token("x]"));
        assert!(!has_glob_token(".foo | .bar"));
    }

    #[test]
    fn safe_literals() {
        assert!(is_safe_literal_token(""));
        assert!(is_safe_literal_token("-"));
        assert!(is_safe_literal_token("foo"));
        assert!(is_safe_literal_token("secret.txt"));
        assert!(!is_safe_literal_token("*.rs"));
        assert!(!is_safe_literal_token("./etc/passwd"));
        assert!(!is_safe_literal_token("~root"));
    }
}
