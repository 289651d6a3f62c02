pub mod types;

pub use types::{Filter, ReportInput, Summary};

use colored::Colorize;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::aggregate::RepositoryGroup;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report file: {0}")]
    FileWrite(#[from] std::io::Error),

    #[error("Failed to serialize report data: {0}")]
    Serialize(#[from] serde_json::Error),
}

const CLIENT_SCRIPT: &str = include_str!("assets/report.js");

const TAILWIND_CONFIG: &str = r#"tailwind.config = {
        theme: {
            extend: {
                colors: {
                    primary: '#4d2a54',
                    secondary: '#eaca00'
                }
            }
        }
    }"#;

const STYLE: &str = r#".gradient-bg { background: linear-gradient(135deg, #4d2a54 0%, #eaca00 100%); }
    .pr-count-gradient { background: linear-gradient(135deg, #4d2a54, #eaca00); }
    .expanded .expand-icon { transform: rotate(180deg); }"#;

/// Topic badges shown on a collapsed card before the "+N" indicator.
const VISIBLE_TOPICS: usize = 2;

/// Data embedded for the client script.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbeddedData<'a> {
    total_count: u64,
    repos: &'a [RepositoryGroup],
}

/// Render the complete, self-contained HTML document.
#[instrument(skip_all, fields(repos = input.aggregation.groups.len(), total = input.total_count))]
pub fn render(input: &ReportInput) -> Result<String, ReportError> {
    let summary = input.summary();
    let data = EmbeddedData {
        total_count: input.total_count,
        repos: &input.aggregation.groups,
    };
    let json = escape_script_json(&serde_json::to_string(&data)?);
    debug!(json_bytes = json.len(), "serialized report data");

    if input.is_truncated() {
        warn!(
            total = input.total_count,
            shown = input.aggregation.grouped_pr_count(),
            "report covers only part of the search results"
        );
    }

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <script src="https://cdn.tailwindcss.com"></script>
    <script>
    {tailwind}
    </script>
    <style>
    {style}
    </style>
</head>
<body class="min-h-screen gradient-bg p-8">
    <div class="max-w-7xl mx-auto">
{header}
{filters}
        <div class="grid grid-cols-1 md:grid-cols-2 lg:grid-cols-3 gap-6" id="repos-grid">
{cards}
        </div>
        <p id="empty-state" class="{empty_class}text-center text-white text-lg mt-8">No repositories match the current filters.</p>
    </div>
    <script type="application/json" id="report-data">{json}</script>
    <script>
{script}
    </script>
</body>
</html>
"#,
        title = html_escape(&input.title),
        tailwind = TAILWIND_CONFIG,
        style = STYLE,
        header = render_header(input, summary),
        filters = render_filters(input),
        cards = render_cards(input),
        empty_class = if summary.repositories == 0 { "" } else { "hidden " },
        json = json,
        script = CLIENT_SCRIPT,
    ))
}

fn render_header(input: &ReportInput, summary: Summary) -> String {
    let coverage = if input.is_truncated() {
        format!(
            r#"
            <p class="text-sm opacity-80 mt-4">Showing {} of {} pull requests</p>"#,
            input.aggregation.grouped_pr_count(),
            input.total_count
        )
    } else {
        String::new()
    };

    format!(
        r#"        <header class="text-center text-white mb-8">
            <h1 class="text-4xl md:text-5xl font-bold mb-2 drop-shadow-lg">🤖 {title}</h1>
            <p class="text-xl opacity-90">Open pull requests from Dependabot across all repositories</p>
            <div class="flex flex-col md:flex-row justify-center gap-4 mt-6">
                <div class="bg-white/20 backdrop-blur-lg px-8 py-4 rounded-xl">
                    <div class="text-3xl font-bold" id="total-prs">{prs}</div>
                    <div class="text-sm opacity-90">Total PRs</div>
                </div>
                <div class="bg-white/20 backdrop-blur-lg px-8 py-4 rounded-xl">
                    <div class="text-3xl font-bold" id="repo-count">{repos}</div>
                    <div class="text-sm opacity-90">Repositories</div>
                </div>
            </div>{coverage}
        </header>"#,
        title = html_escape(&input.title),
        prs = summary.pull_requests,
        repos = summary.repositories,
        coverage = coverage,
    )
}

fn render_filters(input: &ReportInput) -> String {
    let filter = &input.filter;
    let facets = &input.aggregation.facets;

    let languages = with_selected(&facets.languages, filter.language.iter());
    let options: String = languages
        .iter()
        .map(|lang| {
            let selected = if filter.language.as_deref() == Some(lang.as_str()) {
                " selected"
            } else {
                ""
            };
            format!(
                r#"<option value="{0}"{1}>{0}</option>"#,
                html_escape(lang),
                selected
            )
        })
        .collect();

    let topics = with_selected(&facets.topics, filter.topics.iter());
    let checkboxes = if topics.is_empty() {
        r#"<p class="text-gray-500 text-sm">No topics available</p>"#.to_string()
    } else {
        topics
            .iter()
            .map(|topic| {
                let checked = if filter.topics.contains(topic.as_str()) { " checked" } else { "" };
                format!(
                    r#"
                        <label class="flex items-center py-1 cursor-pointer hover:bg-gray-100 px-2 rounded">
                            <input type="checkbox" value="{0}" class="topic-checkbox mr-2 w-4 h-4 text-primary rounded focus:ring-primary focus:ring-2"{1}>
                            <span class="text-gray-800 text-sm">{0}</span>
                        </label>"#,
                    html_escape(topic),
                    checked
                )
            })
            .collect()
    };

    format!(
        r#"        <div class="bg-white/10 backdrop-blur-lg rounded-xl p-6 mb-8">
            <h2 class="text-white text-xl font-semibold mb-4">🔍 Filters</h2>
            <div class="grid grid-cols-1 md:grid-cols-2 gap-6">
                <div>
                    <label for="language-filter" class="block text-white text-sm font-medium mb-2">Language</label>
                    <select id="language-filter" class="w-full px-4 py-2 rounded-lg bg-white/90 backdrop-blur text-gray-800 border-0 focus:ring-2 focus:ring-primary">
                        <option value="">All Languages</option>{options}
                    </select>
                </div>
                <div>
                    <label class="block text-white text-sm font-medium mb-2">Topics (select multiple)</label>
                    <div class="bg-white/90 backdrop-blur rounded-lg p-3 max-h-48 overflow-y-auto">
                        {checkboxes}
                    </div>
                </div>
            </div>
            <button type="button" id="clear-filters" class="mt-4 px-4 py-2 bg-white/20 hover:bg-white/30 text-white rounded-lg transition-colors">
                Clear Filters
            </button>
        </div>"#,
        options = options,
        checkboxes = checkboxes,
    )
}

/// Facet values plus any pre-selected value the data doesn't contain, so
/// the controls always reflect the active filter.
fn with_selected<'a>(
    values: &'a [String],
    selected: impl Iterator<Item = &'a String>,
) -> Vec<&'a String> {
    let mut all: Vec<&String> = values.iter().collect();
    for value in selected {
        if !all.contains(&value) {
            all.push(value);
        }
    }
    all
}

fn render_cards(input: &ReportInput) -> String {
    input
        .aggregation
        .groups
        .iter()
        .enumerate()
        .map(|(index, group)| render_card(index, group, input.filter.matches(group)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_card(index: usize, group: &RepositoryGroup, visible: bool) -> String {
    let mut badges: String = group
        .topics
        .iter()
        .take(VISIBLE_TOPICS)
        .map(|topic| {
            format!(
                r#"<span class="inline-block px-2 py-1 bg-primary/20 text-primary text-xs rounded-full mr-1">{}</span>"#,
                html_escape(topic)
            )
        })
        .collect();
    if group.topics.len() > VISIBLE_TOPICS {
        badges.push_str(&format!(
            r#"<span class="text-gray-500 text-xs">+{}</span>"#,
            group.topics.len() - VISIBLE_TOPICS
        ));
    }

    let prs: String = group
        .prs
        .iter()
        .map(|pr| {
            format!(
                r#"
                    <div class="p-3 mb-2 bg-gray-50 rounded-lg border-l-4 border-primary hover:bg-gray-100 transition-colors">
                        <a href="{url}" class="font-semibold text-primary text-sm hover:underline" target="_blank">#{number}</a>
                        <div class="text-gray-800 mt-1 text-sm leading-relaxed">{title}</div>
                        <div class="text-gray-500 text-xs mt-1">Updated: {updated}</div>
                    </div>"#,
                url = html_escape(&pr.url),
                number = pr.number,
                title = html_escape(&pr.title),
                updated = pr.updated.format("%Y-%m-%d"),
            )
        })
        .collect();

    format!(
        r#"            <div class="repo-card{hidden} bg-white rounded-xl p-6 shadow-2xl hover:-translate-y-2 transition-all duration-300 cursor-pointer relative" data-index="{index}">
                <div class="flex justify-between items-start mb-2">
                    <a href="{url}" class="text-xl font-semibold text-gray-800 hover:text-primary transition-colors" target="_blank">{name}</a>
                    <div class="pr-count-gradient text-white px-4 py-2 rounded-full font-bold text-lg min-w-[50px] text-center">{count}</div>
                </div>
                <div class="mb-4">
                    <span class="inline-block px-2 py-1 bg-gray-200 text-gray-700 text-xs rounded-full mr-2">{language}</span>{badges}
                </div>
                <div class="hidden pr-list mt-4 border-t-2 border-gray-200 pt-4 max-h-96 overflow-y-auto">{prs}
                </div>
                <div class="expand-icon absolute bottom-4 right-4 text-gray-400 text-2xl transition-transform duration-300">▼</div>
            </div>"#,
        hidden = if visible { "" } else { " hidden" },
        index = index,
        url = html_escape(&group.url),
        name = html_escape(&group.name),
        count = group.pr_count(),
        language = html_escape(&group.language),
        badges = badges,
        prs = prs,
    )
}

/// Write the rendered document to `path`.
#[instrument(skip(html), fields(bytes = html.len()))]
pub fn write(path: &Path, html: &str) -> Result<(), ReportError> {
    debug!(path = %path.display(), "writing report to file");
    std::fs::write(path, html)?;
    Ok(())
}

/// Print the one-line completion message to the terminal.
pub fn print_summary(input: &ReportInput, path: &Path) {
    println!(
        "{} Generated {} with {} repositories and {} PRs",
        "✓".green().bold(),
        path.display().to_string().bold(),
        input.aggregation.groups.len(),
        input.total_count
    );
    if input.is_truncated() {
        println!(
            "  {} only {} of {} PRs were included",
            "note:".yellow().bold(),
            input.aggregation.grouped_pr_count(),
            input.total_count
        );
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// serde_json leaves `<` alone, so a `</script>` inside a PR title would
/// close the data block early.
fn escape_script_json(s: &str) -> String {
    s.replace("</", "<\\/")
}
