mod aggregate;
mod config;
mod github;
mod report;

use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info, info_span, warn};
use tracing_subscriber::EnvFilter;

use github::{GitHubClient, MetadataMap, SearchResult};

/// Collects open pull requests by an automated author
/// across a GitHub organization and writes a filterable HTML dashboard.
#[derive(Parser, Debug)]
#[command(name = "dependabot-report", version, about)]
struct Cli {
    /// Organization to search (default: agrc)
    #[arg(long)]
    org: Option<String>,

    /// Login of the PR author (default: dependabot[bot])
    #[arg(long)]
    author: Option<String>,

    /// Output HTML file (default: dependabot-prs.html)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pre-select a language in the report's initial view
    #[arg(long)]
    language: Option<String>,

    /// Pre-select a topic in the report's initial view (repeatable)
    #[arg(long = "topic")]
    topics: Vec<String>,

    /// Use the built-in sample search result for demo purposes (no network)
    #[arg(long)]
    r#mock: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("loading configuration");
    let mut config = config::Config::load()?;
    if cli.org.is_some() {
        config.search.org = cli.org.clone();
    }
    if cli.author.is_some() {
        config.search.author = cli.author.clone();
    }
    if cli.output.is_some() {
        config.report.output = cli.output.clone();
    }

    let org = config.org();
    let author = config.author();
    let _main_span = info_span!("dependabot_report", org = %org, author = %author).entered();

    let (search, metadata) = if cli.r#mock {
        info!("using mock search data for demo");
        let search = build_mock_search()?;
        let repos = github::distinct_repositories(&search.items);
        debug!(repositories = repos.len(), "mock mode uses default repository metadata");
        (search, MetadataMap::new())
    } else {
        let client = GitHubClient::from_config(&config);

        info!("fetching pull requests from GitHub");
        let search = client
            .search_pull_requests(&org, &author, config.per_page())
            .await?;
        info!(total = search.total_count, items = search.items.len(), "fetched search results");
        if search.total_count > search.items.len() as u64 {
            warn!(
                total = search.total_count,
                received = search.items.len(),
                "search results exceed one page; remaining PRs are not included"
            );
        }

        let repos = github::distinct_repositories(&search.items);
        let metadata = github::fetch_metadata(&client, &repos).await;
        (search, metadata)
    };

    info!("aggregating pull requests");
    let aggregation = aggregate::aggregate(&search.items, &metadata);
    if aggregation.skipped > 0 {
        warn!(skipped = aggregation.skipped, "some pull requests had no usable repository reference");
    }

    let input = report::ReportInput {
        title: config.title(),
        total_count: search.total_count,
        aggregation,
        filter: report::Filter::new(cli.language, cli.topics),
    };

    info!("generating report");
    let html = report::render(&input)?;
    let output = config.output();
    report::write(&output, &html)?;
    report::print_summary(&input, &output);
    info!(path = %output.display(), repositories = input.aggregation.groups.len(), "done");

    Ok(())
}

/// Build a search result from the embedded fixture.
/// This enables running the full pipeline without network access.
fn build_mock_search() -> Result<SearchResult, Box<dyn std::error::Error>> {
    let raw = include_str!("../tests/fixtures/search_response.json");
    let response: github::types::SearchResponse = serde_json::from_str(raw)?;
    Ok(github::validate_search(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_search_parses() {
        let search = build_mock_search().unwrap();
        assert_eq!(search.total_count, 4);
        assert_eq!(search.items.len(), 4);
    }

    #[test]
    fn test_mock_pipeline_groups_fixture() {
        let search = build_mock_search().unwrap();
        let aggregation = aggregate::aggregate(&search.items, &MetadataMap::new());
        let names: Vec<&str> = aggregation.groups.iter().map(|g| g.full_name.as_str()).collect();
        assert_eq!(names, vec!["agrc/api", "agrc/web", "agrc/tools"]);
        assert_eq!(aggregation.facets.languages, vec!["Unknown"]);
    }

    #[tokio::test]
    async fn test_metadata_failure_does_not_drop_repository() {
        let mut server = mockito::Server::new_async().await;
        let _ok = server
            .mock("GET", "/repos/agrc/api")
            .with_status(200)
            .with_body(r#"{"language": "JavaScript", "topics": ["ci"]}"#)
            .create_async()
            .await;
        let _down = server
            .mock("GET", "/repos/agrc/web")
            .with_status(500)
            .create_async()
            .await;
        let _bad = server
            .mock("GET", "/repos/agrc/tools")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = GitHubClient::new(server.url(), "test", None);
        let search = build_mock_search().unwrap();
        let repos = github::distinct_repositories(&search.items);
        let metadata = github::fetch_metadata(&client, &repos).await;
        let aggregation = aggregate::aggregate(&search.items, &metadata);

        assert_eq!(aggregation.groups.len(), 3);
        assert_eq!(aggregation.groups[0].language, "JavaScript");
        assert_eq!(aggregation.groups[1].language, "Unknown");
        assert_eq!(aggregation.groups[2].language, "Unknown");
        assert_eq!(aggregation.facets.languages, vec!["JavaScript", "Unknown"]);

        let input = report::ReportInput {
            title: "Dependabot Pull Requests".to_string(),
            total_count: search.total_count,
            aggregation,
            filter: report::Filter::default(),
        };
        let html = report::render(&input).unwrap();
        assert!(html.contains(r#"id="total-prs">4</div>"#));
        assert!(html.contains(r#"id="repo-count">3</div>"#));
        assert!(html.contains(">web</a>"));
    }

    #[test]
    fn test_cli_parses_filters() {
        let cli = Cli::parse_from([
            "dependabot-report",
            "--org",
            "acme",
            "--language",
            "Go",
            "--topic",
            "infra",
            "--topic",
            "web",
            "-o",
            "out.html",
        ]);
        assert_eq!(cli.org.as_deref(), Some("acme"));
        assert_eq!(cli.language.as_deref(), Some("Go"));
        assert_eq!(cli.topics, vec!["infra".to_string(), "web".to_string()]);
        assert_eq!(cli.output, Some(PathBuf::from("out.html")));
        assert!(!cli.r#mock);
    }
}
