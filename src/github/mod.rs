pub mod types;

pub use types::{RepoId, RepositoryMetadata, SearchItem, SearchResult};

use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use types::{RepositoryResponse, SearchResponse};

/// Repository metadata keyed by "owner/name".
pub type MetadataMap = HashMap<String, RepositoryMetadata>;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("GitHub API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("GitHub API error: {status}")]
    Api { status: u16 },

    #[error("Failed to parse GitHub API response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid repository reference: {0}")]
    InvalidRepository(String),
}

/// Extract the repository identifier from an API repository URL.
///
/// Takes the last two path segments, so both
/// `https://api.github.com/repos/org/repo` and `https://github.com/org/repo`
/// yield `org/repo`.
pub fn parse_repo_url(url: &str) -> Result<RepoId, FetchError> {
    let parsed =
        reqwest::Url::parse(url).map_err(|_| FetchError::InvalidRepository(url.to_string()))?;

    let segments: Vec<_> = parsed
        .path_segments()
        .ok_or_else(|| FetchError::InvalidRepository(url.to_string()))?
        .filter(|segment| !segment.is_empty())
        .collect();

    match segments.as_slice() {
        [.., owner, name] => Ok(RepoId {
            owner: owner.to_string(),
            name: name.to_string(),
        }),
        _ => Err(FetchError::InvalidRepository(url.to_string())),
    }
}

/// Build the search query for open PRs by `author` in non-archived repos of `org`.
pub fn search_path(org: &str, author: &str, per_page: u8) -> String {
    format!(
        "/search/issues?q=org:{}+author:{}+is:pull-request+is:open+archived:false&per_page={}",
        org, author, per_page
    )
}

/// Source of repository details. Implemented by [`GitHubClient`]; tests
/// substitute canned responses.
#[async_trait]
pub trait RepositorySource: Send + Sync {
    async fn fetch_repository(&self, repo: &RepoId) -> Result<RepositoryMetadata, FetchError>;
}

/// Thin GitHub REST client. One instance is shared by every call of a run.
pub struct GitHubClient {
    http: reqwest::Client,
    base_url: String,
    user_agent: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(base_url: impl Into<String>, user_agent: impl Into<String>, token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_agent: user_agent.into(),
            token,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.api_url(),
            config.user_agent(),
            config.github_token(),
        )
    }

    /// GET `path` relative to the API host and parse the body as JSON.
    /// Anything other than 200 is an [`FetchError::Api`].
    #[instrument(skip(self))]
    pub async fn get_json(&self, path: &str) -> Result<serde_json::Value, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .http
            .get(&url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            debug!(status = status.as_u16(), "non-success status");
            return Err(FetchError::Api {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        debug!(body_bytes = body.len(), "received response");
        Ok(serde_json::from_str(&body)?)
    }

    /// Search open PRs authored by `author` across `org`, one page only.
    #[instrument(skip(self))]
    pub async fn search_pull_requests(
        &self,
        org: &str,
        author: &str,
        per_page: u8,
    ) -> Result<SearchResult, FetchError> {
        let value = self.get_json(&search_path(org, author, per_page)).await?;
        let response: SearchResponse = serde_json::from_value(value)?;
        Ok(validate_search(response))
    }
}

#[async_trait]
impl RepositorySource for GitHubClient {
    #[instrument(skip(self, repo), fields(repo = %repo))]
    async fn fetch_repository(&self, repo: &RepoId) -> Result<RepositoryMetadata, FetchError> {
        let value = self
            .get_json(&format!("/repos/{}/{}", repo.owner, repo.name))
            .await?;
        let response: RepositoryResponse = serde_json::from_value(value)?;
        Ok(response.into())
    }
}

/// Convert raw search items into typed records, dropping the ones that
/// don't carry the required fields.
pub fn validate_search(response: SearchResponse) -> SearchResult {
    let mut items = Vec::with_capacity(response.items.len());
    for (index, raw) in response.items.into_iter().enumerate() {
        match serde_json::from_value::<SearchItem>(raw) {
            Ok(item) => items.push(item),
            Err(err) => warn!(index, error = %err, "skipping malformed search item"),
        }
    }
    SearchResult {
        total_count: response.total_count,
        items,
    }
}

/// Distinct repositories referenced by `items`, in first-seen order.
/// Items with an unusable repository reference are left out here; the
/// aggregator reports them.
pub fn distinct_repositories(items: &[SearchItem]) -> Vec<RepoId> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter_map(|item| item.repository_url.as_deref())
        .filter_map(|url| parse_repo_url(url).ok())
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

/// Fetch metadata for each repository one at a time.
///
/// A failed fetch is logged and recorded with the default metadata so the
/// run can continue.
pub async fn fetch_metadata<S>(source: &S, repos: &[RepoId]) -> MetadataMap
where
    S: RepositorySource + ?Sized,
{
    info!(repositories = repos.len(), "fetching repository details");
    let mut metadata = MetadataMap::with_capacity(repos.len());
    for repo in repos {
        let details = match source.fetch_repository(repo).await {
            Ok(details) => {
                debug!(repo = %repo, language = %details.language, topics = details.topics.len(), "fetched repository details");
                details
            }
            Err(err) => {
                warn!(repo = %repo, error = %err, "could not fetch repository details");
                RepositoryMetadata::default()
            }
        };
        metadata.insert(repo.full_name(), details);
    }
    metadata
}
