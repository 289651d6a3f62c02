pub mod types;

pub use types::{Aggregation, Facets, PullRequestRecord, RepositoryGroup};

use std::collections::{BTreeSet, HashMap};
use tracing::{debug, instrument, warn};

use crate::github::{parse_repo_url, MetadataMap, RepositoryMetadata, SearchItem};

/// Group search items by repository, attach metadata and compute facets.
///
/// Metadata is looked up once, when a repository is first seen. Repositories
/// absent from `metadata` get the "Unknown" language and no topics. Items
/// whose repository reference can't be parsed are counted in
/// [`Aggregation::skipped`] instead of failing the run.
#[instrument(skip_all, fields(items = items.len()))]
pub fn aggregate(items: &[SearchItem], metadata: &MetadataMap) -> Aggregation {
    let mut groups: Vec<RepositoryGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut skipped = 0;

    for item in items {
        let repo = match item.repository_url.as_deref().map(parse_repo_url) {
            Some(Ok(repo)) => repo,
            Some(Err(err)) => {
                warn!(pr = item.number, error = %err, "skipping PR with malformed repository reference");
                skipped += 1;
                continue;
            }
            None => {
                warn!(pr = item.number, "skipping PR without repository reference");
                skipped += 1;
                continue;
            }
        };

        let full_name = repo.full_name();
        let slot = *index.entry(full_name.clone()).or_insert_with(|| {
            let details = metadata.get(&full_name).cloned().unwrap_or_default();
            groups.push(new_group(&full_name, &repo.name, details));
            groups.len() - 1
        });

        groups[slot].prs.push(PullRequestRecord {
            number: item.number,
            title: item.title.clone(),
            url: item.html_url.clone(),
            created: item.created_at,
            updated: item.updated_at,
        });
    }

    // sort_by is stable, so equal counts keep first-seen order.
    groups.sort_by(|a, b| b.pr_count().cmp(&a.pr_count()));

    let facets = compute_facets(&groups);
    debug!(
        groups = groups.len(),
        languages = facets.languages.len(),
        topics = facets.topics.len(),
        skipped,
        "aggregated pull requests"
    );

    Aggregation {
        groups,
        facets,
        skipped,
    }
}

fn new_group(full_name: &str, name: &str, details: RepositoryMetadata) -> RepositoryGroup {
    RepositoryGroup {
        full_name: full_name.to_string(),
        name: name.to_string(),
        url: format!("https://github.com/{}", full_name),
        language: details.language,
        topics: details.topics,
        prs: Vec::new(),
    }
}

/// Distinct languages and topics across `groups`, sorted lexicographically.
pub fn compute_facets(groups: &[RepositoryGroup]) -> Facets {
    let languages: BTreeSet<&str> = groups.iter().map(|g| g.language.as_str()).collect();
    let topics: BTreeSet<&str> = groups
        .iter()
        .flat_map(|g| g.topics.iter().map(String::as_str))
        .collect();

    Facets {
        languages: languages.into_iter().map(str::to_string).collect(),
        topics: topics.into_iter().map(str::to_string).collect(),
    }
}
