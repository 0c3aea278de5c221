/// Strip markdown code fences from a response
pub fn strip_markdown_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let clean = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let clean = clean.strip_suffix("```").unwrap_or(clean);
    clean.trim()
}

/// Extract a JSON fragment between the first `open` and the last `close`
pub fn extract_json_fragment(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    if start <= end {
        Some(&text[start..=end])
    } else {
        None
    }
}

/// Try to fix common JSON issues from LLM responses
pub fn fix_json_issues(json: &str) -> String {
    let mut fixed = json.to_string();

    fixed = fixed.replace(",]", "]");
    fixed = fixed.replace(",}", "}");

    fixed = fixed.replace(['\u{201C}', '\u{201D}'], "\"");
    fixed = fixed.replace(['\u{2018}', '\u{2019}'], "'");

    fixed
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

/// Parse a JSON array of strings out of free-form model output.
///
/// Chatter before or after the array is ignored. Non-string elements are
/// dropped. Returns `None` when no array can be recovered.
pub fn parse_string_array(response: &str) -> Option<Vec<String>> {
    let clean = strip_markdown_fences(response);
    let fragment = extract_json_fragment(clean, '[', ']')?;

    let values: Vec<serde_json::Value> = serde_json::from_str(fragment)
        .or_else(|_| serde_json::from_str(&fix_json_issues(fragment)))
        .ok()?;

    Some(
        values
            .into_iter()
            .filter_map(|v| v.as_str().map(|s| s.trim().to_string()))
            .filter(|s| !s.is_empty())
            .collect(),
    )
}
