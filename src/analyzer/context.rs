//! Character-budgeted context assembly for the analysis prompt
//!
//! All lengths are counted in characters, not bytes.

use super::select::error_keywords;
use super::RelevantFile;
use crate::util::{char_len, prefix_chars, CHARS_PER_TOKEN};

/// Token budget reserved for the error and code context.
pub const MAX_CONTEXT_TOKENS: usize = 100_000;
pub const MAX_CONTEXT_CHARS: usize = MAX_CONTEXT_TOKENS * CHARS_PER_TOKEN;
/// Largest single file section before smart truncation kicks in.
pub const MAX_SECTION_CHARS: usize = 8_000;
/// Cap applied to file bodies as they are fetched.
pub const MAX_FETCHED_FILE_CHARS: usize = 10_000;
/// Cap applied to files found by the error-mention search.
pub const MAX_FALLBACK_FILE_CHARS: usize = 5_000;

/// Leading lines always kept by smart truncation.
const HEAD_LINES: usize = 20;
/// Stop adding scored lines once an append leaves less room than this.
const MIN_REMAINING_CHARS: usize = 100;

const CODE_PATTERNS: &[&str] = &[
    "public", "private", "class", "method", "function", "sub ", "dim ", "if ", "try", "catch",
    "throw",
];
const DECLARATION_PATTERNS: &[&str] = &[
    "config",
    "connection",
    "setting",
    "import",
    "using",
    "namespace",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextBudget {
    pub max_chars: usize,
    pub max_section_chars: usize,
}

impl Default for ContextBudget {
    fn default() -> Self {
        Self {
            max_chars: MAX_CONTEXT_CHARS,
            max_section_chars: MAX_SECTION_CHARS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BuiltContext {
    pub text: String,
    pub files_included: usize,
    pub omitted: Vec<String>,
}

impl BuiltContext {
    pub fn char_count(&self) -> usize {
        char_len(&self.text)
    }
}

/// Cut a fetched file body to `max_chars`, noting the original size.
pub fn cap_content(content: &str, max_chars: usize) -> String {
    let len = char_len(content);
    if len <= max_chars {
        return content.to_string();
    }
    format!(
        "{}\n... (file truncated, original size: {} characters)",
        prefix_chars(content, max_chars),
        len
    )
}

fn score_line(line: &str, keywords: &[String]) -> u32 {
    let lower = line.to_lowercase();
    let mut score = 0;

    for keyword in keywords {
        if lower.contains(keyword.as_str()) {
            score += 10;
        }
    }
    if CODE_PATTERNS.iter().any(|p| lower.contains(p)) {
        score += 3;
    }
    if DECLARATION_PATTERNS.iter().any(|p| lower.contains(p)) {
        score += 2;
    }

    score
}

/// Shrink `content` to at most `max_chars`, keeping what matters.
///
/// The first 20 lines are always kept (clipped if they alone overflow).
/// After them come the highest-scoring later lines, best first, each
/// preceded by a `... (line N) ...` marker, until the budget is spent.
pub fn smart_truncate(content: &str, max_chars: usize, error_message: &str) -> String {
    if char_len(content) <= max_chars {
        return content.to_string();
    }

    let lines: Vec<&str> = content.split('\n').collect();
    let keywords = error_keywords(&error_message.to_lowercase());

    let mut out = String::new();
    let mut used = 0;

    for (i, line) in lines.iter().take(HEAD_LINES).enumerate() {
        let sep = usize::from(i > 0);
        let need = sep + char_len(line);
        if used + need > max_chars {
            let room = max_chars - used;
            if room > sep {
                if sep == 1 {
                    out.push('\n');
                }
                out.push_str(prefix_chars(line, room - sep));
            }
            return out;
        }
        if sep == 1 {
            out.push('\n');
        }
        out.push_str(line);
        used += need;
    }

    let mut scored: Vec<(usize, &str, u32)> = lines
        .iter()
        .enumerate()
        .skip(HEAD_LINES)
        .map(|(idx, line)| (idx, *line, score_line(line, &keywords)))
        .filter(|(_, _, score)| *score > 0)
        .collect();
    scored.sort_by(|a, b| b.2.cmp(&a.2));

    for (idx, line, _) in scored {
        let piece = format!("\n... (line {}) ...\n{}", idx + 1, line);
        let need = char_len(&piece);
        if used + need <= max_chars {
            out.push_str(&piece);
            used += need;
            if max_chars - used < MIN_REMAINING_CHARS {
                break;
            }
        }
    }

    out
}

/// Pack the error and file bodies into a single prompt context.
///
/// Each file gets an even share of what's left (capped at
/// `max_section_chars`); larger files are smart-truncated. Once a section no
/// longer fits the overall budget, the remaining files are listed as omitted.
pub fn build_context(error_message: &str, files: &[RelevantFile], budget: ContextBudget) -> BuiltContext {
    let mut text = format!("ERROR MESSAGE:\n{}\n\nRELEVANT CODE FILES:\n", error_message);
    let mut current = char_len(&text);
    let mut files_included = 0;
    let mut omitted = Vec::new();

    for (i, file) in files.iter().enumerate() {
        let remaining_files = (files.len() - i).max(1);
        let share = budget.max_chars.saturating_sub(current) / remaining_files;
        let max_file_chars = budget.max_section_chars.min(share);

        let content_len = char_len(&file.content);
        let section = if content_len > max_file_chars {
            let truncated = smart_truncate(&file.content, max_file_chars, error_message);
            format!(
                "\n--- FILE: {} (TRUNCATED - {} chars total) ---\n{}\n[... content truncated for token limit ...]\n\n",
                file.path, content_len, truncated
            )
        } else {
            format!("\n--- FILE: {} ---\n{}\n\n", file.path, file.content)
        };

        let section_len = char_len(&section);
        if current + section_len > budget.max_chars {
            omitted = files[i..].iter().map(|f| f.path.clone()).collect();
            text.push_str(&format!(
                "\n--- ADDITIONAL FILES OMITTED DUE TO TOKEN LIMIT ---\n{} more files were analyzed but omitted from context to stay within token limits.\nFiles omitted: {}\n\n",
                omitted.len(),
                omitted.join(", ")
            ));
            break;
        }

        text.push_str(&section);
        current += section_len;
        files_included += 1;
    }

    BuiltContext {
        text,
        files_included,
        omitted,
    }
}
