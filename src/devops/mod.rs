//! Azure DevOps-style source-control REST client
//!
//! Read-only: directory listings, file contents, recent commits and the
//! files each commit touched. Authentication is a personal access token sent
//! as HTTP Basic with an empty user name.

mod repo_url;

pub use repo_url::{is_supported_host, parse_repo_url, RepoRef};

use crate::util::{strip_bom, truncate};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

const API_VERSION: &str = "7.0";
const API_TIMEOUT_SECS: u64 = 60;
/// Upper bound on commits pulled for one lookback window.
const MAX_RECENT_COMMITS: u32 = 100;
const MAX_ERROR_BODY_LEN: usize = 200;

/// File extensions worth reading when analyzing an error.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    ".js", ".ts", ".cs", ".vb", ".aspx", ".ascx", ".xml", ".config", ".json", ".csproj",
    ".vbproj", ".sln", ".sql",
];

pub fn has_supported_extension(file_name: &str) -> bool {
    SUPPORTED_EXTENSIONS
        .iter()
        .any(|ext| file_name.ends_with(ext))
}

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("not found (404): {url}")]
    NotFound { url: String },
    #[error("unauthorized (401): check the Azure DevOps token")]
    Unauthorized,
    #[error("access denied (403): check repository permissions")]
    Forbidden,
    #[error("source-control host returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("lookback of {days} days is out of range")]
    LookbackOutOfRange { days: u32 },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// One entry of a single-level directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoEntry {
    Dir {
        name: String,
        path: String,
    },
    File {
        name: String,
        path: String,
        size: u64,
        url: String,
    },
}

impl RepoEntry {
    pub fn name(&self) -> &str {
        match self {
            RepoEntry::Dir { name, .. } | RepoEntry::File { name, .. } => name,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            RepoEntry::Dir { path, .. } | RepoEntry::File { path, .. } => path,
        }
    }
}

/// A file touched inside the lookback window, with its most recent commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangedFile {
    pub path: String,
    pub name: String,
    pub size: u64,
    pub last_commit_id: String,
    pub last_commit_message: String,
    pub last_commit_date: String,
    pub change_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitSummary {
    #[serde(rename = "commitId", default)]
    pub commit_id: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    author: Option<CommitAuthor>,
}

impl CommitSummary {
    pub fn date(&self) -> &str {
        self.author
            .as_ref()
            .and_then(|a| a.date.as_deref())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Deserialize)]
struct CommitAuthor {
    date: Option<String>,
}

#[derive(Deserialize)]
struct ValueList<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct GitItem {
    path: String,
    git_object_type: Option<String>,
    size: Option<u64>,
    url: Option<String>,
    content: Option<String>,
    content_metadata: Option<ContentMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ContentMetadata {
    encoding: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommitChange {
    item: GitItem,
    change_type: Option<String>,
}

#[derive(Deserialize)]
struct ChangesResponse {
    #[serde(default)]
    changes: Vec<CommitChange>,
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// `Basic base64(":" + token)`
fn basic_auth_header(token: &str) -> String {
    format!("Basic {}", BASE64.encode(format!(":{}", token)))
}

pub struct DevOpsClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl DevOpsClient {
    pub fn new(base_url: &str, token: Option<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(API_TIMEOUT_SECS))
            .user_agent(concat!("faultline/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn repo_api(&self, repo: &RepoRef, tail: &str) -> String {
        format!(
            "{}/{}/{}/_apis/git/repositories/{}/{}",
            self.base_url, repo.organization, repo.project, repo.repository, tail
        )
    }

    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<reqwest::Response, HostError> {
        let mut request = self
            .http
            .get(url)
            .query(&[("api-version", API_VERSION)])
            .query(query);
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, basic_auth_header(token));
        }

        let response = request.send().await?;
        let status = response.status();
        match status {
            StatusCode::NOT_FOUND => Err(HostError::NotFound {
                url: response.url().to_string(),
            }),
            StatusCode::UNAUTHORIZED => Err(HostError::Unauthorized),
            StatusCode::FORBIDDEN => Err(HostError::Forbidden),
            s if !s.is_success() => {
                let body = response.text().await.unwrap_or_default();
                Err(HostError::Status {
                    status: s.as_u16(),
                    body: truncate(&body, MAX_ERROR_BODY_LEN),
                })
            }
            _ => Ok(response),
        }
    }

    /// List the immediate children of `path` (repository root when empty).
    pub async fn list_items(&self, repo: &RepoRef, path: &str) -> Result<Vec<RepoEntry>, HostError> {
        let scope = if path.is_empty() {
            "/".to_string()
        } else {
            format!("/{}", path.trim_start_matches('/'))
        };
        tracing::debug!(%repo, scope = %scope, "listing repository items");

        let response = self
            .get(
                &self.repo_api(repo, "items"),
                &[
                    ("scopePath", scope),
                    ("recursionLevel", "OneLevel".to_string()),
                ],
            )
            .await?;
        let listing: ValueList<GitItem> = response.json().await?;

        let entries: Vec<RepoEntry> = listing
            .value
            .into_iter()
            .filter_map(|item| {
                let path = item.path.trim_start_matches('/').to_string();
                let name = last_segment(&item.path).to_string();
                match item.git_object_type.as_deref() {
                    Some("tree") => Some(RepoEntry::Dir { name, path }),
                    Some("blob") => Some(RepoEntry::File {
                        name,
                        path,
                        size: item.size.unwrap_or(0),
                        url: item.url.unwrap_or_default(),
                    }),
                    _ => None,
                }
            })
            .collect();

        tracing::debug!(count = entries.len(), "repository items found");
        Ok(entries)
    }

    /// Fetch a file's text. JSON envelopes and raw bodies are both handled.
    pub async fn file_content(&self, repo: &RepoRef, file_path: &str) -> Result<String, HostError> {
        let response = self
            .get(
                &self.repo_api(repo, "items"),
                &[
                    ("path", format!("/{}", file_path.trim_start_matches('/'))),
                    ("includeContent", "true".to_string()),
                ],
            )
            .await?;

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_lowercase().contains("application/json"))
            .unwrap_or(false);

        if is_json {
            let item: GitItem = response.json().await?;
            let content = item.content.unwrap_or_default();
            let is_base64 = item
                .content_metadata
                .and_then(|m| m.encoding)
                .map(|e| e.as_str() == Some("base64"))
                .unwrap_or(false);
            if is_base64 {
                return Ok(match BASE64.decode(content.trim()) {
                    Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                    Err(err) => {
                        tracing::warn!(file = file_path, error = %err, "base64 content did not decode");
                        String::new()
                    }
                });
            }
            return Ok(content);
        }

        let text = response.text().await?;
        Ok(strip_bom(&text).to_string())
    }

    /// Commits newer than `days` ago, newest first as returned by the host.
    pub async fn recent_commits(&self, repo: &RepoRef, days: u32) -> Result<Vec<CommitSummary>, HostError> {
        let since = ChronoDuration::try_days(i64::from(days))
            .and_then(|window| Utc::now().checked_sub_signed(window))
            .ok_or(HostError::LookbackOutOfRange { days })?
            .to_rfc3339_opts(SecondsFormat::Secs, true);

        let response = self
            .get(
                &self.repo_api(repo, "commits"),
                &[
                    ("searchCriteria.fromDate", since),
                    ("$top", MAX_RECENT_COMMITS.to_string()),
                ],
            )
            .await?;
        let commits: ValueList<CommitSummary> = response.json().await?;
        Ok(commits.value)
    }

    pub async fn commit_changes(&self, repo: &RepoRef, commit_id: &str) -> Result<Vec<CommitChange>, HostError> {
        let response = self
            .get(&self.repo_api(repo, &format!("commits/{}/changes", commit_id)), &[])
            .await?;
        let changes: ChangesResponse = response.json().await?;
        Ok(changes.changes)
    }

    /// Files with a supported extension changed within the last `days`.
    ///
    /// Each path appears once, attributed to the first commit that mentions
    /// it (the most recent one). A commit whose changes can't be fetched is
    /// skipped.
    pub async fn recently_changed_files(&self, repo: &RepoRef, days: u32) -> Result<Vec<ChangedFile>, HostError> {
        tracing::info!(%repo, days, "fetching recent commits");
        let commits = self.recent_commits(repo, days).await?;
        if commits.is_empty() {
            tracing::info!("no recent commits found");
            return Ok(Vec::new());
        }
        tracing::info!(count = commits.len(), "recent commits found");

        let mut seen = HashSet::new();
        let mut files = Vec::new();

        for commit in &commits {
            let changes = match self.commit_changes(repo, &commit.commit_id).await {
                Ok(changes) => changes,
                Err(err) => {
                    tracing::warn!(commit = %commit.commit_id, error = %err, "skipping commit changes");
                    continue;
                }
            };
            collect_changed_files(commit, changes, &mut seen, &mut files);
        }

        tracing::info!(count = files.len(), days, "unique changed files found");
        Ok(files)
    }
}

fn collect_changed_files(
    commit: &CommitSummary,
    changes: Vec<CommitChange>,
    seen: &mut HashSet<String>,
    files: &mut Vec<ChangedFile>,
) {
    for change in changes {
        if change.item.git_object_type.as_deref() != Some("blob") {
            continue;
        }
        let path = change.item.path.trim_start_matches('/').to_string();
        let name = last_segment(&path).to_string();
        if name.is_empty() || !has_supported_extension(&name) {
            continue;
        }
        if !seen.insert(path.clone()) {
            continue;
        }
        files.push(ChangedFile {
            path,
            name,
            size: change.item.size.unwrap_or(0),
            last_commit_id: commit.commit_id.clone(),
            last_commit_message: commit.comment.clone(),
            last_commit_date: commit.date().to_string(),
            change_type: change.change_type.unwrap_or_else(|| "unknown".to_string()),
        });
    }
}
