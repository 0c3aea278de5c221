//! Error analysis pipeline
//!
//! Parse the repository URL, gather recently changed files, pick the ones
//! that look related to the error, pack them into a bounded context and ask
//! the model for a root-cause report. Every external step degrades: no model
//! means keyword ranking and a template report, no recent changes means a
//! search for files the error names.

pub mod context;
pub mod fallback;
pub mod samples;
pub mod select;

pub use context::{build_context, smart_truncate, BuiltContext, ContextBudget};
pub use samples::{SampleRepo, SAMPLE_ERRORS, SAMPLE_REPOS};
pub use select::{keyword_rank, mentioned_file_names, select_relevant};

use crate::config::{Config, DEFAULT_LOOKBACK_DAYS, DEFAULT_MAX_FILES};
use crate::devops::{is_supported_host, parse_repo_url, ChangedFile, DevOpsClient, RepoEntry, RepoRef};
use crate::llm::prompts::{analysis_prompt, ANALYSIS_SYSTEM};
use crate::llm::LlmClient;
use crate::util::{estimate_tokens, prefix_chars};
use chrono::Local;
use context::{cap_content, MAX_CONTEXT_TOKENS, MAX_FALLBACK_FILE_CHARS, MAX_FETCHED_FILE_CHARS};
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;

const ANALYSIS_TEMPERATURE: f32 = 0.2;
/// How deep the mentioned-file search descends into the tree.
const MAX_SEARCH_DEPTH: usize = 4;
const PLATFORM: &str = "azure";

#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub error_message: String,
    pub repo_url: String,
    pub days: u32,
    pub max_files: usize,
}

impl AnalysisRequest {
    pub fn new(error_message: impl Into<String>, repo_url: impl Into<String>) -> Self {
        Self {
            error_message: error_message.into(),
            repo_url: repo_url.into(),
            days: DEFAULT_LOOKBACK_DAYS,
            max_files: DEFAULT_MAX_FILES,
        }
    }

    pub fn with_days(mut self, days: u32) -> Self {
        self.days = days;
        self
    }

    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }
}

/// Most recent commit touching an analyzed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitInfo {
    pub path: String,
    pub last_commit_id: String,
    pub last_commit_message: String,
    pub last_commit_date: String,
    pub change_type: String,
}

/// A file whose content goes into the analysis context.
#[derive(Debug, Clone)]
pub struct RelevantFile {
    pub path: String,
    pub name: String,
    pub content: String,
    pub size: u64,
    /// Absent for files found by the mentioned-file search.
    pub commit: Option<CommitInfo>,
}

impl RelevantFile {
    fn from_changed(file: &ChangedFile, content: String) -> Self {
        Self {
            path: file.path.clone(),
            name: file.name.clone(),
            content,
            size: file.size,
            commit: Some(CommitInfo {
                path: file.path.clone(),
                last_commit_id: file.last_commit_id.clone(),
                last_commit_message: file.last_commit_message.clone(),
                last_commit_date: file.last_commit_date.clone(),
                change_type: file.change_type.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub analysis: String,
    pub files_analyzed: Vec<String>,
    pub repo_info: String,
    pub platform: String,
    pub analysis_scope: String,
    pub commit_info: Vec<CommitInfo>,
    /// The analysis text came from the model rather than the template.
    pub ai_powered: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("Please provide an error message to analyze.")]
    MissingErrorMessage,
    #[error("Please provide a repository URL.")]
    MissingRepoUrl,
    #[error("Currently only Azure DevOps repositories are supported.")]
    UnsupportedHost,
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisFailure {
    #[error("Invalid repository URL. Please provide a valid Azure DevOps repository URL.")]
    InvalidRepoUrl,
    #[error(
        "No relevant files found in the repository from the past {days} days or repository is inaccessible. Please check permissions and repository URL."
    )]
    NoRelevantFiles { days: u32 },
}

pub fn validate_inputs(error_message: &str, repo_url: &str) -> Result<(), InputError> {
    if error_message.trim().is_empty() {
        return Err(InputError::MissingErrorMessage);
    }
    if repo_url.trim().is_empty() {
        return Err(InputError::MissingRepoUrl);
    }
    if !is_supported_host(repo_url) {
        return Err(InputError::UnsupportedHost);
    }
    Ok(())
}

type SearchFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

pub struct Analyzer {
    devops: DevOpsClient,
    llm: LlmClient,
}

impl Analyzer {
    pub fn new(devops: DevOpsClient, llm: LlmClient) -> Self {
        Self { devops, llm }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(
            DevOpsClient::new(&config.devops_base_url, config.devops_token())?,
            LlmClient::from_config(config)?,
        ))
    }

    pub fn llm(&self) -> &LlmClient {
        &self.llm
    }

    /// Run the full pipeline, reporting each stage through `progress`.
    pub async fn analyze<P>(
        &self,
        request: &AnalysisRequest,
        mut progress: P,
    ) -> Result<AnalysisReport, AnalysisFailure>
    where
        P: FnMut(&str) + Send,
    {
        progress("🔍 Parsing repository URL...");
        let repo = parse_repo_url(&request.repo_url).ok_or(AnalysisFailure::InvalidRepoUrl)?;

        progress(&format!("📂 Analyzing Azure DevOps repository: {}", repo));
        progress(&format!(
            "🔎 Extracting files changed in the past {} days...",
            request.days
        ));

        let files = self.gather_files(&repo, request, &mut progress).await;
        if files.is_empty() {
            return Err(AnalysisFailure::NoRelevantFiles { days: request.days });
        }
        progress(&format!(
            "📋 Found {} relevant files from recent changes",
            files.len()
        ));

        let built = build_context(&request.error_message, &files, ContextBudget::default());
        let tokens = estimate_tokens(&built.text);
        tracing::info!(
            chars = built.char_count(),
            tokens,
            included = built.files_included,
            omitted = built.omitted.len(),
            "context prepared"
        );
        if tokens > MAX_CONTEXT_TOKENS {
            tracing::warn!(tokens, "context may be approaching token limits");
        }

        progress("🤖 Performing AI-powered root cause analysis...");
        let (analysis, ai_powered) = self.root_cause(&built.text).await;

        Ok(AnalysisReport {
            analysis,
            files_analyzed: files.iter().map(|f| f.path.clone()).collect(),
            repo_info: repo.to_string(),
            platform: PLATFORM.to_string(),
            analysis_scope: format!("Files changed in the past {} days", request.days),
            commit_info: files
                .into_iter()
                .filter_map(|f| f.commit)
                .filter(|c| !c.last_commit_id.is_empty())
                .collect(),
            ai_powered,
        })
    }

    /// Validate, analyze and render the whole markdown transcript.
    pub async fn transcript<P>(&self, request: &AnalysisRequest, progress: P) -> String
    where
        P: FnMut(&str) + Send,
    {
        if let Err(err) = validate_inputs(&request.error_message, &request.repo_url) {
            return format!("❌ Validation Error: {}", err);
        }

        let mut out = transcript_header(request.days);
        match self.analyze(request, progress).await {
            Ok(report) => out.push_str(&render_report(&report)),
            Err(err) => out.push_str(&format!("❌ Repository Analysis Failed: {}\n\n", err)),
        }
        out
    }

    async fn gather_files<P>(
        &self,
        repo: &RepoRef,
        request: &AnalysisRequest,
        progress: &mut P,
    ) -> Vec<RelevantFile>
    where
        P: FnMut(&str) + Send,
    {
        let changed = match self.devops.recently_changed_files(repo, request.days).await {
            Ok(changed) => changed,
            Err(err) => {
                tracing::warn!(%repo, error = %err, "could not list recent changes");
                progress(&format!("⚠️ Could not list recent changes: {}", err));
                Vec::new()
            }
        };

        if changed.is_empty() {
            progress("⚠️ No recently changed files found, searching for files named in the error...");
            return self
                .search_mentioned_files(repo, &request.error_message, request.max_files)
                .await;
        }
        tracing::info!(count = changed.len(), "recently changed files");

        let selected =
            select_relevant(&self.llm, &changed, &request.error_message, request.max_files).await;

        let mut files = Vec::with_capacity(selected.len());
        for path in selected {
            let Some(meta) = changed.iter().find(|f| f.path == path) else {
                continue;
            };
            match self.devops.file_content(repo, &path).await {
                Ok(content) if !content.is_empty() => {
                    files.push(RelevantFile::from_changed(
                        meta,
                        cap_content(&content, MAX_FETCHED_FILE_CHARS),
                    ));
                }
                Ok(_) => tracing::debug!(%path, "skipping empty file"),
                Err(err) => tracing::warn!(%path, error = %err, "skipping unreadable file"),
            }
        }
        files
    }

    async fn search_mentioned_files(
        &self,
        repo: &RepoRef,
        error_message: &str,
        max_files: usize,
    ) -> Vec<RelevantFile> {
        let mentioned: Vec<String> = mentioned_file_names(error_message)
            .iter()
            .map(|name| name.to_lowercase())
            .collect();
        tracing::info!(?mentioned, "files mentioned in error");

        let mut found = Vec::new();
        if !mentioned.is_empty() && max_files > 0 {
            self.search_dir(repo, String::new(), 0, &mentioned, max_files, &mut found)
                .await;
        }
        tracing::info!(count = found.len(), "mentioned files found");
        found
    }

    /// Depth-first walk, one listing per directory. The listing includes the
    /// scope folder itself, which is not re-entered.
    fn search_dir<'a>(
        &'a self,
        repo: &'a RepoRef,
        path: String,
        depth: usize,
        mentioned: &'a [String],
        max_files: usize,
        found: &'a mut Vec<RelevantFile>,
    ) -> SearchFuture<'a> {
        Box::pin(async move {
            if depth > MAX_SEARCH_DEPTH || found.len() >= max_files {
                return;
            }

            let entries = match self.devops.list_items(repo, &path).await {
                Ok(entries) => entries,
                Err(err) => {
                    tracing::warn!(%repo, path = %path, error = %err, "could not list directory");
                    return;
                }
            };

            for entry in entries {
                if found.len() >= max_files {
                    break;
                }
                match entry {
                    RepoEntry::File { name, path: file_path, size, .. } => {
                        let lower = name.to_lowercase();
                        let Some(pattern) = mentioned.iter().find(|m| lower.contains(m.as_str()))
                        else {
                            continue;
                        };
                        if found.iter().any(|f| f.path == file_path) {
                            continue;
                        }
                        match self.devops.file_content(repo, &file_path).await {
                            Ok(content) if !content.is_empty() => {
                                tracing::debug!(path = %file_path, %pattern, "matched mentioned file");
                                found.push(RelevantFile {
                                    content: prefix_chars(&content, MAX_FALLBACK_FILE_CHARS)
                                        .to_string(),
                                    path: file_path,
                                    name,
                                    size,
                                    commit: None,
                                });
                            }
                            Ok(_) => {}
                            Err(err) => {
                                tracing::warn!(path = %file_path, error = %err, "skipping unreadable file")
                            }
                        }
                    }
                    RepoEntry::Dir { path: dir_path, .. } => {
                        if depth < MAX_SEARCH_DEPTH && dir_path != path {
                            self.search_dir(repo, dir_path, depth + 1, mentioned, max_files, found)
                                .await;
                        }
                    }
                }
            }
        })
    }

    /// Model-written analysis with a metadata footer, or the template.
    async fn root_cause(&self, context: &str) -> (String, bool) {
        if !self.llm.is_configured() {
            tracing::info!("llm not configured; using template analysis");
            return (fallback::template_analysis(context), false);
        }

        match self
            .llm
            .complete(ANALYSIS_SYSTEM, &analysis_prompt(context), Some(ANALYSIS_TEMPERATURE))
            .await
        {
            Ok(text) => (
                format!("{}{}", text, fallback::metadata_footer(Local::now())),
                true,
            ),
            Err(err) => {
                tracing::warn!(error = %err, "llm analysis failed; using template analysis");
                (fallback::template_analysis(context), false)
            }
        }
    }
}

pub fn transcript_header(days: u32) -> String {
    format!(
        "🚀 Starting error analysis with recent changes focus...\n\n\
         🔍 Analyzing files changed in the past {} days\n\n\
         📂 Analyzing repository structure and extracting relevant files from recent commits...\n\n",
        days
    )
}

/// Markdown summary of a finished analysis.
pub fn render_report(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let files = &report.files_analyzed;

    out.push_str("✅ Repository Analysis Complete!\n\n");
    out.push_str(&format!("   📋 Analyzed repository: {}\n\n", report.repo_info));
    out.push_str(&format!("   📅 Analysis scope: {}\n\n", report.analysis_scope));
    out.push_str(&format!("   📁 Files examined: {}\n\n", files.len()));

    if !report.commit_info.is_empty() {
        out.push_str("   📝 Recent commit information:\n\n");
        for info in report.commit_info.iter().take(3) {
            out.push_str(&format!(
                "      • {} (Commit: {})\n\n",
                info.path,
                prefix_chars(&info.last_commit_id, 8)
            ));
            out.push_str(&format!(
                "        └─ {}...\n\n",
                prefix_chars(&info.last_commit_message, 60)
            ));
        }
        if report.commit_info.len() > 3 {
            out.push_str(&format!(
                "      ... and {} more recent changes\n\n",
                report.commit_info.len() - 3
            ));
        }
    }

    out.push_str("   📄 Relevant files found:\n\n");
    for path in files.iter().take(5) {
        out.push_str(&format!("      • {}\n\n", path));
    }
    if files.len() > 5 {
        out.push_str(&format!("      ... and {} more files\n\n", files.len() - 5));
    }

    out.push_str("\n\n🤖 Performing AI-powered root cause analysis...\n\n");
    out.push_str("✅ AI Analysis Complete!\n\n");
    out.push_str("📊 **Root Cause Analysis Results:**\n\n");
    out.push_str(&report.analysis);

    out.push_str("\n\n---\n\n**Analysis Summary:**\n\n");
    out.push_str(&format!("- Repository: {}\n\n", report.repo_info));
    out.push_str(&format!("- Scope: {}\n\n", report.analysis_scope));
    out.push_str(&format!("- Files analyzed: {}\n\n", files.len()));
    out.push_str(&format!(
        "- AI-powered: {}\n\n",
        if report.ai_powered { "✅" } else { "❌" }
    ));

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};

    const REPO_URL: &str = "https://dev.azure.com/contoso/Billing/_git/Search";
    const ITEMS: &str = "/contoso/Billing/_apis/git/repositories/Search/items";
    const COMMITS: &str = "/contoso/Billing/_apis/git/repositories/Search/commits";

    fn analyzer(devops: &ServerGuard, llm_url: Option<String>) -> Analyzer {
        Analyzer::new(
            DevOpsClient::new(&devops.url(), Some("pat".to_string())).unwrap(),
            LlmClient::new(llm_url, Some("key".to_string())).unwrap(),
        )
    }

    async fn mock_recent_changes(server: &mut ServerGuard) -> Vec<mockito::Mock> {
        let commits = server
            .mock("GET", COMMITS)
            .match_query(Matcher::Any)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"value":[{"commitId":"0123456789abcdef","comment":"Refactor invoice totals","author":{"date":"2026-10-12T09:00:00Z"}}]}"#,
            )
            .create_async()
            .await;
        let changes = server
            .mock("GET", format!("{}/0123456789abcdef/changes", COMMITS).as_str())
            .match_query(Matcher::Any)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"changes":[
                    {"item":{"path":"/src/InvoiceService.cs","gitObjectType":"blob","size":64},"changeType":"edit"},
                    {"item":{"path":"/src/Util.cs","gitObjectType":"blob","size":10},"changeType":"edit"}
                ]}"#,
            )
            .create_async()
            .await;
        let content = server
            .mock("GET", ITEMS)
            .match_query(Matcher::UrlEncoded("path".into(), "/src/InvoiceService.cs".into()))
            .with_header("content-type", "text/plain")
            .with_body("public class InvoiceService { decimal Total() => items.Sum(); }")
            .create_async()
            .await;
        vec![commits, changes, content]
    }

    #[test]
    fn test_validate_inputs() {
        assert_eq!(validate_inputs("  ", REPO_URL), Err(InputError::MissingErrorMessage));
        assert_eq!(validate_inputs("boom", ""), Err(InputError::MissingRepoUrl));
        assert_eq!(
            validate_inputs("boom", "https://github.com/a/b"),
            Err(InputError::UnsupportedHost)
        );
        assert_eq!(validate_inputs("boom", REPO_URL), Ok(()));
        assert_eq!(
            validate_inputs("boom", "https://contoso.VisualStudio.com/Billing/_git/Search"),
            Ok(())
        );
    }

    #[tokio::test]
    async fn test_analyze_rejects_unparsable_url() {
        let devops = Server::new_async().await;
        let analyzer = analyzer(&devops, None);
        let request = AnalysisRequest::new("boom", "https://dev.azure.com/contoso");

        let err = analyzer.analyze(&request, |_| {}).await.unwrap_err();
        assert!(matches!(err, AnalysisFailure::InvalidRepoUrl));
    }

    #[tokio::test]
    async fn test_analyze_without_llm_uses_keywords_and_template() {
        let mut devops = Server::new_async().await;
        let _mocks = mock_recent_changes(&mut devops).await;
        let analyzer = analyzer(&devops, None);
        let request = AnalysisRequest::new("InvoiceService threw NullReferenceException", REPO_URL);

        let mut lines = Vec::new();
        let report = analyzer
            .analyze(&request, |line| lines.push(line.to_string()))
            .await
            .unwrap();

        assert_eq!(report.files_analyzed, vec!["src/InvoiceService.cs"]);
        assert_eq!(report.repo_info, "contoso/Billing/Search");
        assert_eq!(report.platform, "azure");
        assert_eq!(report.analysis_scope, "Files changed in the past 14 days");
        assert_eq!(report.commit_info.len(), 1);
        assert_eq!(report.commit_info[0].last_commit_id, "0123456789abcdef");
        assert!(!report.ai_powered);
        assert!(report.analysis.contains("generated using fallback templates"));
        assert!(report.analysis.contains("ERROR MESSAGE:\nInvoiceService threw"));
        assert_eq!(lines.first().map(String::as_str), Some("🔍 Parsing repository URL..."));
        assert!(lines.iter().any(|l| l.contains("Found 1 relevant files")));
    }

    #[tokio::test]
    async fn test_analyze_with_llm_appends_metadata() {
        let mut devops = Server::new_async().await;
        let _mocks = mock_recent_changes(&mut devops).await;

        let mut llm = Server::new_async().await;
        let _selection = llm
            .mock("POST", "/chat")
            .match_body(Matcher::PartialJsonString(r#"{"temperature":0.1}"#.to_string()))
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"content":"[\"src/InvoiceService.cs\"]"}}]}"#)
            .create_async()
            .await;
        let _analysis = llm
            .mock("POST", "/chat")
            .match_body(Matcher::PartialJsonString(r#"{"temperature":0.2}"#.to_string()))
            .with_header("content-type", "application/json")
            .with_body(r##"{"choices":[{"message":{"content":"# Root Cause Analysis\nTotals overflow."}}]}"##)
            .create_async()
            .await;

        let analyzer = analyzer(&devops, Some(format!("{}/chat", llm.url())));
        let request = AnalysisRequest::new("Invoice total wrong", REPO_URL).with_days(7);
        let report = analyzer.analyze(&request, |_| {}).await.unwrap();

        assert!(report.ai_powered);
        assert!(report.analysis.starts_with("# Root Cause Analysis\nTotals overflow."));
        assert!(report.analysis.contains("**Analysis Metadata:**"));
        assert_eq!(report.analysis_scope, "Files changed in the past 7 days");
    }

    #[tokio::test]
    async fn test_analyze_llm_failure_falls_back_to_template() {
        let mut devops = Server::new_async().await;
        let _mocks = mock_recent_changes(&mut devops).await;

        let mut llm = Server::new_async().await;
        let _down = llm
            .mock("POST", "/chat")
            .with_status(500)
            .with_body("upstream down")
            .create_async()
            .await;

        let analyzer = analyzer(&devops, Some(format!("{}/chat", llm.url())));
        let request = AnalysisRequest::new("InvoiceService failed", REPO_URL);
        let report = analyzer.analyze(&request, |_| {}).await.unwrap();

        assert!(!report.ai_powered);
        assert_eq!(report.files_analyzed, vec!["src/InvoiceService.cs"]);
        assert!(report.analysis.contains("# Root Cause Analysis (.NET Focus)"));
    }

    #[tokio::test]
    async fn test_analyze_searches_mentioned_files_without_recent_changes() {
        let mut devops = Server::new_async().await;
        let _commits = devops
            .mock("GET", COMMITS)
            .match_query(Matcher::Any)
            .with_header("content-type", "application/json")
            .with_body(r#"{"value":[]}"#)
            .create_async()
            .await;
        let _root = devops
            .mock("GET", ITEMS)
            .match_query(Matcher::UrlEncoded("scopePath".into(), "/".into()))
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"value":[
                    {"path":"/","gitObjectType":"tree"},
                    {"path":"/src","gitObjectType":"tree"},
                    {"path":"/README.md","gitObjectType":"blob","size":5}
                ]}"#,
            )
            .create_async()
            .await;
        let _src = devops
            .mock("GET", ITEMS)
            .match_query(Matcher::UrlEncoded("scopePath".into(), "/src".into()))
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"value":[
                    {"path":"/src","gitObjectType":"tree"},
                    {"path":"/src/Startup.cs","gitObjectType":"blob","size":7000}
                ]}"#,
            )
            .create_async()
            .await;
        let _content = devops
            .mock("GET", ITEMS)
            .match_query(Matcher::UrlEncoded("path".into(), "/src/Startup.cs".into()))
            .with_header("content-type", "text/plain")
            .with_body("s".repeat(7000))
            .create_async()
            .await;

        let analyzer = analyzer(&devops, None);
        let request = AnalysisRequest::new(r"boom in C:\build\src\Startup.cs:line 42", REPO_URL);
        let report = analyzer.analyze(&request, |_| {}).await.unwrap();

        assert_eq!(report.files_analyzed, vec!["src/Startup.cs"]);
        assert!(report.commit_info.is_empty());
        // content capped at 5 000 chars, so it fits a section untruncated
        assert!(report.analysis.contains("--- FILE: src/Startup.cs ---"));
    }

    #[tokio::test]
    async fn test_analyze_reports_empty_window() {
        let mut devops = Server::new_async().await;
        let _commits = devops
            .mock("GET", COMMITS)
            .match_query(Matcher::Any)
            .with_status(401)
            .create_async()
            .await;

        let analyzer = analyzer(&devops, None);
        let request = AnalysisRequest::new("no file names here", REPO_URL).with_days(3);
        let err = analyzer.analyze(&request, |_| {}).await.unwrap_err();

        assert!(matches!(err, AnalysisFailure::NoRelevantFiles { days: 3 }));
        assert!(err.to_string().contains("from the past 3 days"));
    }

    #[tokio::test]
    async fn test_analyze_huge_lookback_fails_cleanly() {
        let devops = Server::new_async().await;
        let analyzer = analyzer(&devops, None);
        let request = AnalysisRequest::new("no file names here", REPO_URL).with_days(u32::MAX);

        let mut lines = Vec::new();
        let err = analyzer
            .analyze(&request, |line| lines.push(line.to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, AnalysisFailure::NoRelevantFiles { days: u32::MAX }));
        assert!(lines.iter().any(|l| l.contains("out of range")));
    }

    #[tokio::test]
    async fn test_transcript_validation_and_failure_lines() {
        let devops = Server::new_async().await;
        let analyzer = analyzer(&devops, None);

        let invalid = AnalysisRequest::new("boom", "https://github.com/a/b");
        assert_eq!(
            analyzer.transcript(&invalid, |_| {}).await,
            "❌ Validation Error: Currently only Azure DevOps repositories are supported."
        );

        let bad_url = AnalysisRequest::new("boom", "https://dev.azure.com/contoso");
        let text = analyzer.transcript(&bad_url, |_| {}).await;
        assert!(text.starts_with("🚀 Starting error analysis"));
        assert!(text.ends_with("❌ Repository Analysis Failed: Invalid repository URL. Please provide a valid Azure DevOps repository URL.\n\n"));
    }

    #[test]
    fn test_render_report_limits_listings() {
        let report = AnalysisReport {
            analysis: "ANALYSIS BODY".to_string(),
            files_analyzed: (0..7).map(|i| format!("src/F{}.cs", i)).collect(),
            repo_info: "contoso/Billing/Search".to_string(),
            platform: PLATFORM.to_string(),
            analysis_scope: "Files changed in the past 14 days".to_string(),
            commit_info: (0..4)
                .map(|i| CommitInfo {
                    path: format!("src/F{}.cs", i),
                    last_commit_id: "abcdef0123456789".to_string(),
                    last_commit_message: "m".repeat(80),
                    last_commit_date: String::new(),
                    change_type: "edit".to_string(),
                })
                .collect(),
            ai_powered: true,
        };

        let text = render_report(&report);
        assert!(text.contains("      • src/F0.cs (Commit: abcdef01)\n\n"));
        assert!(text.contains(&format!("        └─ {}...\n\n", "m".repeat(60))));
        assert!(text.contains("      ... and 1 more recent changes\n\n"));
        assert!(text.contains("      • src/F4.cs\n\n"));
        assert!(!text.contains("      • src/F5.cs\n\n"));
        assert!(text.contains("      ... and 2 more files\n\n"));
        assert!(text.contains("📊 **Root Cause Analysis Results:**\n\nANALYSIS BODY"));
        assert!(text.ends_with("- AI-powered: ✅\n\n"));
    }
}
