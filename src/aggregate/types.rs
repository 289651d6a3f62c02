use chrono::{DateTime, Utc};
use serde::Serialize;

/// A pull request as shown in the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PullRequestRecord {
    pub number: u64,
    pub title: String,
    /// Browser URL of the PR
    pub url: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// All open PRs of one repository plus its metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryGroup {
    /// "owner/name"
    pub full_name: String,
    /// Final path segment of the repository reference
    pub name: String,
    /// Canonical web URL
    pub url: String,
    pub language: String,
    pub topics: Vec<String>,
    /// PRs in arrival order
    pub prs: Vec<PullRequestRecord>,
}

impl RepositoryGroup {
    pub fn pr_count(&self) -> usize {
        self.prs.len()
    }
}

/// Sorted, deduplicated values used to populate the filter controls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Facets {
    pub languages: Vec<String>,
    pub topics: Vec<String>,
}

/// Output of the aggregation stage.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    /// Groups ordered by descending PR count, ties in first-seen order
    pub groups: Vec<RepositoryGroup>,
    pub facets: Facets,
    /// Search items dropped because their repository reference was unusable
    pub skipped: usize,
}

impl Aggregation {
    /// Number of PRs that made it into a group.
    pub fn grouped_pr_count(&self) -> usize {
        self.groups.iter().map(RepositoryGroup::pr_count).sum()
    }
}
