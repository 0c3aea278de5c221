use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// `dev.azure.com/{organization}/{project}/_git/{repository}`
static DEV_AZURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)dev\.azure\.com/([\w\-.]+)/([\w\-.]+)/_git/([\w\-.]+)/?$")
        .expect("static pattern")
});

/// `{organization}.visualstudio.com/{project}/_git/{repository}`
static VISUALSTUDIO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([\w\-.]+)\.visualstudio\.com/([\w\-.]+)/_git/([\w\-.]+)/?$")
        .expect("static pattern")
});

/// A repository on the source-control host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub organization: String,
    pub project: String,
    pub repository: String,
}

impl RepoRef {
    pub fn new(
        organization: impl Into<String>,
        project: impl Into<String>,
        repository: impl Into<String>,
    ) -> Self {
        Self {
            organization: organization.into(),
            project: project.into(),
            repository: repository.into(),
        }
    }

    /// `project/repository`
    pub fn project_repo(&self) -> String {
        format!("{}/{}", self.project, self.repository)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.organization, self.project, self.repository)
    }
}

/// Extract organization, project and repository from a repository URL.
///
/// Supports:
/// - https://dev.azure.com/org/project/_git/repo
/// - https://org.visualstudio.com/project/_git/repo
///
/// Segment case is preserved; only the host match is case-insensitive.
pub fn parse_repo_url(url: &str) -> Option<RepoRef> {
    let url = url.trim();
    for re in [&*DEV_AZURE_RE, &*VISUALSTUDIO_RE] {
        if let Some(caps) = re.captures(url) {
            return Some(RepoRef::new(&caps[1], &caps[2], &caps[3]));
        }
    }
    None
}

/// Whether the URL points at a host this tool knows how to talk to.
pub fn is_supported_host(url: &str) -> bool {
    let lower = url.to_lowercase();
    lower.contains("dev.azure.com") || lower.contains("visualstudio.com")
}
