/// Rough characters-per-token ratio used for context budgeting.
pub const CHARS_PER_TOKEN: usize = 4;

/// Truncate for display, appending `...` when the input is cut.
pub fn truncate(s: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }

    let char_count = s.chars().count();
    if char_count <= max {
        return s.to_string();
    }

    if max <= 3 {
        return s.chars().take(max).collect();
    }

    let truncated: String = s.chars().take(max - 3).collect();
    format!("{}...", truncated)
}

/// Borrow at most `max_chars` characters from the start of `s` (Unicode-safe).
pub fn prefix_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Length in characters, not bytes.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Approximate token count for a piece of text.
pub fn estimate_tokens(s: &str) -> usize {
    char_len(s) / CHARS_PER_TOKEN
}

/// Strip a leading byte-order mark, either decoded (U+FEFF) or mis-decoded
/// as Latin-1 (`ï»¿`).
pub fn strip_bom(s: &str) -> &str {
    s.strip_prefix('\u{feff}')
        .or_else(|| s.strip_prefix("ï»¿"))
        .unwrap_or(s)
}
