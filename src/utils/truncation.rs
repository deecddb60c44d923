const MAX_SNIPPET_LENGTH: usize = 1_200;
const MAX_ERROR_LENGTH: usize = 2_000;

/// Truncate a code snippet before it goes into a translation prompt.
/// Keeps the head of the snippet; the opening lines carry the pattern.
pub fn truncate_snippet(snippet: &str) -> String {
    if snippet.len() <= MAX_SNIPPET_LENGTH {
        snippet.to_string()
    } else {
        let mut cut = MAX_SNIPPET_LENGTH;
        while !snippet.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}\n... [truncated {} chars]", &snippet[..cut], snippet.len() - cut)
    }
}

pub fn truncate_error(error: &str) -> String {
    if error.len() <= MAX_ERROR_LENGTH {
        error.to_string()
    } else {
        let mut cut = MAX_ERROR_LENGTH;
        while !error.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}...", &error[..cut])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_snippet_unchanged() {
        assert_eq!(truncate_snippet("let x = 1;"), "let x = 1;");
    }

    #[test]
    fn test_long_snippet_truncated() {
        let long = "x".repeat(5_000);
        let out = truncate_snippet(&long);
        assert!(out.len() < long.len());
        assert!(out.contains("[truncated"));
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        let long = "é".repeat(3_000);
        let out = truncate_snippet(&long);
        assert!(out.contains("[truncated"));
    }

    #[test]
    fn test_long_error_truncated() {
        let long = "e".repeat(3_000);
        let out = truncate_error(&long);
        assert!(out.ends_with("..."));
        assert!(out.len() <= 2_003);
    }
}
