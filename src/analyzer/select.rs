//! Relevance ranking of candidate files against an error message
//!
//! The LLM gets the first pick. Keyword scoring is the fallback whenever the
//! model is unavailable or returns nothing usable.

use crate::devops::ChangedFile;
use crate::llm::parse::parse_string_array;
use crate::llm::prompts::{file_selection_prompt, FILE_SELECTION_SYSTEM};
use crate::llm::LlmClient;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Only this many candidates are listed in the selection prompt.
pub const MAX_PROMPT_CANDIDATES: usize = 50;
const SELECTION_TEMPERATURE: f32 = 0.1;

static IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-zA-Z_][a-zA-Z0-9_]*\b").expect("static pattern"));
static PASCAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z][a-zA-Z0-9]*\b").expect("static pattern"));
static MENTIONED_FILE_RES: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        // Windows paths
        Regex::new(r"(?i)\\([^\\/\s:]+\.(?:cs|vb|aspx|ascx|config|json|xml))").expect("static pattern"),
        // Unix paths
        Regex::new(r"(?i)/([^/\\\s:]+\.(?:cs|vb|aspx|ascx|config|json|xml))").expect("static pattern"),
        // Bare file names
        Regex::new(r"(?i)([A-Za-z][A-Za-z0-9_]*\.(?:cs|vb|aspx|ascx|config|json|xml))")
            .expect("static pattern"),
    ]
});

const STOP_WORDS: &[&str] = &[
    "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "from", "up",
    "about", "into", "through", "during", "before", "after", "above", "below", "between",
    "among", "against", "within", "without", "throughout", "error", "exception", "null",
    "reference",
];

/// Identifier-like tokens of `text`, longer than three characters.
/// Duplicates are kept: a word repeated in the error weighs more.
pub fn error_keywords(text: &str) -> Vec<String> {
    IDENT_RE
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|w| w.chars().count() > 3)
        .map(str::to_string)
        .collect()
}

fn scoring_keywords(error_lower: &str) -> Vec<String> {
    error_keywords(error_lower)
        .into_iter()
        .filter(|k| !STOP_WORDS.contains(&k.as_str()))
        .collect()
}

fn class_names(error_message: &str) -> Vec<String> {
    PASCAL_RE
        .find_iter(error_message)
        .map(|m| m.as_str())
        .filter(|w| w.chars().count() > 3)
        .map(str::to_lowercase)
        .collect()
}

/// Heuristic relevance score of one file against the error.
pub fn score_file(path: &str, name: &str, error_message: &str) -> u32 {
    let error_lower = error_message.to_lowercase();
    score_with(
        &path.to_lowercase(),
        &name.to_lowercase(),
        &error_lower,
        &scoring_keywords(&error_lower),
        &class_names(error_message),
    )
}

fn score_with(
    path: &str,
    name: &str,
    error_lower: &str,
    keywords: &[String],
    classes: &[String],
) -> u32 {
    let mut score = 0;

    for keyword in keywords {
        if name.contains(keyword.as_str()) {
            score += 20;
        } else if path.contains(keyword.as_str()) {
            score += 10;
        }
    }

    for class in classes {
        if name.contains(class.as_str()) {
            score += 15;
        } else if path.contains(class.as_str()) {
            score += 8;
        }
    }

    if (error_lower.contains("sqlexception") || error_lower.contains("database"))
        && ["data", "repository", "dbcontext", "sql"]
            .iter()
            .any(|p| path.contains(p))
    {
        score += 12;
    }

    if (error_lower.contains("configuration") || error_lower.contains("config"))
        && [".config", ".json", ".xml"].iter().any(|ext| name.ends_with(ext))
    {
        score += 15;
    }

    if (error_lower.contains("startup") || error_lower.contains("program"))
        && ["startup", "program", "main"].iter().any(|p| name.contains(p))
    {
        score += 15;
    }

    if score > 0 && (name.ends_with(".cs") || name.ends_with(".vb")) {
        score += 2;
    }

    score
}

/// Rank candidates by keyword score and return the top `max_files` paths.
///
/// Files scoring zero are dropped; ties keep candidate order.
pub fn keyword_rank(files: &[ChangedFile], error_message: &str, max_files: usize) -> Vec<String> {
    let error_lower = error_message.to_lowercase();
    let keywords = scoring_keywords(&error_lower);
    let classes = class_names(error_message);

    let mut scored: Vec<(&str, u32)> = files
        .iter()
        .map(|f| {
            let score = score_with(
                &f.path.to_lowercase(),
                &f.name.to_lowercase(),
                &error_lower,
                &keywords,
                &classes,
            );
            (f.path.as_str(), score)
        })
        .filter(|(_, score)| *score > 0)
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored
        .into_iter()
        .take(max_files)
        .map(|(path, _)| path.to_string())
        .collect()
}

/// Keep LLM-chosen paths that are real candidates, in the model's order.
fn validate_selection(selected: Vec<String>, files: &[ChangedFile], max_files: usize) -> Vec<String> {
    let known: HashSet<&str> = files.iter().map(|f| f.path.as_str()).collect();
    let mut seen = HashSet::new();
    selected
        .into_iter()
        .filter(|p| known.contains(p.as_str()))
        .filter(|p| seen.insert(p.clone()))
        .take(max_files)
        .collect()
}

async fn ask_llm(
    llm: &LlmClient,
    files: &[ChangedFile],
    error_message: &str,
    max_files: usize,
) -> anyhow::Result<Option<Vec<String>>> {
    let file_list = files
        .iter()
        .take(MAX_PROMPT_CANDIDATES)
        .map(|f| format!("- {}", f.path))
        .collect::<Vec<_>>()
        .join("\n");
    let prompt = file_selection_prompt(error_message, &file_list, max_files);

    let response = llm
        .complete(FILE_SELECTION_SYSTEM, &prompt, Some(SELECTION_TEMPERATURE))
        .await?;

    Ok(parse_string_array(&response))
}

/// Pick up to `max_files` candidate paths most relevant to the error.
pub async fn select_relevant(
    llm: &LlmClient,
    files: &[ChangedFile],
    error_message: &str,
    max_files: usize,
) -> Vec<String> {
    if files.is_empty() || max_files == 0 {
        return Vec::new();
    }

    if llm.is_configured() {
        match ask_llm(llm, files, error_message, max_files).await {
            Ok(Some(selected)) => {
                let valid = validate_selection(selected, files, max_files);
                if !valid.is_empty() {
                    tracing::info!(count = valid.len(), "llm selected relevant files");
                    return valid;
                }
                tracing::warn!("llm selected no known files; using keyword ranking");
            }
            Ok(None) => tracing::warn!("llm file selection was not a JSON array; using keyword ranking"),
            Err(err) => tracing::warn!(error = %err, "llm file selection failed; using keyword ranking"),
        }
    } else {
        tracing::debug!("llm not configured; using keyword ranking");
    }

    keyword_rank(files, error_message, max_files)
}

/// File names the error message refers to, deduplicated ignoring case.
pub fn mentioned_file_names(error_message: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for re in MENTIONED_FILE_RES.iter() {
        for caps in re.captures_iter(error_message) {
            let name = caps[1].to_string();
            if seen.insert(name.to_lowercase()) {
                names.push(name);
            }
        }
    }
    names
}
