use std::collections::BTreeSet;

use crate::aggregate::{Aggregation, RepositoryGroup};

/// Language and topic selection applied to the repository cards.
///
/// The same rule runs in the browser; this copy decides the
/// server-rendered initial view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    /// Exact language match, None for all languages
    pub language: Option<String>,
    /// A repository matches when it carries any of these; empty for all
    pub topics: BTreeSet<String>,
}

impl Filter {
    pub fn new(language: Option<String>, topics: impl IntoIterator<Item = String>) -> Self {
        Self {
            language: language.filter(|lang| !lang.is_empty()),
            topics: topics.into_iter().filter(|t| !t.is_empty()).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.language.is_none() && self.topics.is_empty()
    }

    pub fn matches(&self, group: &RepositoryGroup) -> bool {
        let language_match = self
            .language
            .as_deref()
            .map_or(true, |lang| group.language == lang);
        let topic_match =
            self.topics.is_empty() || group.topics.iter().any(|t| self.topics.contains(t));
        language_match && topic_match
    }

    /// Count the repositories and PRs that remain visible under this filter.
    pub fn summarize(&self, groups: &[RepositoryGroup]) -> Summary {
        groups
            .iter()
            .filter(|g| self.matches(g))
            .fold(Summary::default(), |acc, g| Summary {
                repositories: acc.repositories + 1,
                pull_requests: acc.pull_requests + g.pr_count() as u64,
            })
    }
}

/// Counts shown in the report header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub repositories: usize,
    pub pull_requests: u64,
}

/// Everything the renderer needs for one document.
#[derive(Debug, Clone)]
pub struct ReportInput {
    pub title: String,
    /// Total reported by the search API
    pub total_count: u64,
    pub aggregation: Aggregation,
    /// Filter pre-applied to the initial view
    pub filter: Filter,
}

impl ReportInput {
    /// Header counts: the API total and all groups when unfiltered,
    /// otherwise what the filter leaves visible.
    pub fn summary(&self) -> Summary {
        if self.filter.is_empty() {
            Summary {
                repositories: self.aggregation.groups.len(),
                pull_requests: self.total_count,
            }
        } else {
            self.filter.summarize(&self.aggregation.groups)
        }
    }

    /// True when the search page cap or skipped items hid some PRs.
    pub fn is_truncated(&self) -> bool {
        self.total_count > self.aggregation.grouped_pr_count() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::aggregate::tests::meta;
    use crate::github::tests::test_item;
    use crate::github::MetadataMap;

    /// A: Go {infra}, B: Go {}, C: Python {infra, web}
    fn fixture() -> Vec<RepositoryGroup> {
        let items = vec![
            test_item(1, "org/a"),
            test_item(2, "org/b"),
            test_item(3, "org/c"),
        ];
        let mut metadata = MetadataMap::new();
        metadata.insert("org/a".to_string(), meta("Go", &["infra"]));
        metadata.insert("org/b".to_string(), meta("Go", &[]));
        metadata.insert("org/c".to_string(), meta("Python", &["infra", "web"]));
        aggregate(&items, &metadata).groups
    }

    fn visible(filter: &Filter, groups: &[RepositoryGroup]) -> Vec<String> {
        groups
            .iter()
            .filter(|g| filter.matches(g))
            .map(|g| g.name.clone())
            .collect()
    }

    fn topics(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_no_filter_shows_everything() {
        let groups = fixture();
        let filter = Filter::default();
        assert!(filter.is_empty());
        assert_eq!(visible(&filter, &groups), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_language_filter() {
        let groups = fixture();
        let filter = Filter::new(Some("Go".to_string()), topics(&[]));
        assert_eq!(visible(&filter, &groups), vec!["a", "b"]);
    }

    #[test]
    fn test_topic_filter() {
        let groups = fixture();
        let filter = Filter::new(None, topics(&["web"]));
        assert_eq!(visible(&filter, &groups), vec!["c"]);
    }

    #[test]
    fn test_language_and_topic_filter() {
        let groups = fixture();
        let filter = Filter::new(Some("Go".to_string()), topics(&["infra"]));
        assert_eq!(visible(&filter, &groups), vec!["a"]);
    }

    #[test]
    fn test_topic_filter_is_any_of() {
        let groups = fixture();
        let filter = Filter::new(None, topics(&["web", "infra"]));
        assert_eq!(visible(&filter, &groups), vec!["a", "c"]);
    }

    #[test]
    fn test_empty_values_mean_no_filter() {
        let filter = Filter::new(Some(String::new()), topics(&[""]));
        assert!(filter.is_empty());
    }

    #[test]
    fn test_summarize_counts_visible_prs() {
        let groups = fixture();
        let filter = Filter::new(Some("Go".to_string()), topics(&[]));
        assert_eq!(
            filter.summarize(&groups),
            Summary {
                repositories: 2,
                pull_requests: 2
            }
        );
    }

    #[test]
    fn test_clearing_filter_restores_summary() {
        let groups = fixture();
        let mut input = ReportInput {
            title: "t".to_string(),
            total_count: 7,
            aggregation: Aggregation {
                groups,
                ..Aggregation::default()
            },
            filter: Filter::new(None, topics(&["web"])),
        };
        assert_eq!(input.summary().repositories, 1);
        assert_eq!(input.summary().pull_requests, 1);

        input.filter = Filter::default();
        assert_eq!(
            input.summary(),
            Summary {
                repositories: 3,
                pull_requests: 7
            }
        );
        assert!(input.is_truncated());
    }
}
