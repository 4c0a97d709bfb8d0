/// Truncates `value` to at most `max_chars` characters, ending with `...` when cut.
pub fn truncate_ellipsis(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    if max_chars <= 3 {
        return "...".to_string();
    }

    let mut out: String = value.chars().take(max_chars - 3).collect();
    out.push_str("...");
    out
}

/// Keeps the first `max_chars` characters and appends `...` when the value was longer.
pub fn shorten(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &value[..cut]),
        None => value.to_string(),
    }
}

pub fn is_null_like(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") || trimmed.eq_ignore_ascii_case("nil")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_ellipsis("héllo wörld", 8), "héllo...");
        assert_eq!(truncate_ellipsis("short", 8), "short");
        assert_eq!(truncate_ellipsis("abcdef", 2), "...");
        assert_eq!(shorten("Zürich, Switzerland", 6), "Zürich...");
        assert_eq!(shorten("Bern", 6), "Bern");
    }

    #[test]
    fn null_like_values() {
        assert!(is_null_like("  "));
        assert!(is_null_like("NULL"));
        assert!(is_null_like("nil"));
        assert!(!is_null_like("0"));
    }
}
