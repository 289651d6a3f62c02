use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Language recorded for repositories whose metadata is unavailable.
pub const UNKNOWN_LANGUAGE: &str = "Unknown";

/// Repository full identifier, rendered as "owner/name".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Raw body of the issue search endpoint.
/// Items stay untyped here so a single malformed entry can be skipped
/// without rejecting the whole page.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub total_count: u64,
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
}

/// A pull request as returned by the search API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchItem {
    /// PR number within its repository
    pub number: u64,
    /// PR title
    pub title: String,
    /// Browser URL of the PR
    pub html_url: String,
    /// API URL of the owning repository, e.g. https://api.github.com/repos/org/repo
    #[serde(default)]
    pub repository_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated result of one search call.
#[derive(Debug, Clone, Default)]
pub struct SearchResult {
    /// Total reported by the API, which may exceed `items.len()`
    pub total_count: u64,
    pub items: Vec<SearchItem>,
}

/// Subset of the repository details endpoint this tool cares about.
#[derive(Debug, Deserialize)]
pub struct RepositoryResponse {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub topics: Option<Vec<String>>,
}

/// Language and topics of a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryMetadata {
    pub language: String,
    pub topics: Vec<String>,
}

impl Default for RepositoryMetadata {
    fn default() -> Self {
        Self {
            language: UNKNOWN_LANGUAGE.to_string(),
            topics: Vec::new(),
        }
    }
}

impl From<RepositoryResponse> for RepositoryMetadata {
    fn from(response: RepositoryResponse) -> Self {
        Self {
            language: response
                .language
                .filter(|lang| !lang.is_empty())
                .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string()),
            topics: response.topics.unwrap_or_default(),
        }
    }
}
