use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE: &str = ".dependabot-report.toml";
pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_USER_AGENT: &str = "dependabot-pr-dashboard";
pub const DEFAULT_ORG: &str = "agrc";
pub const DEFAULT_AUTHOR: &str = "dependabot[bot]";
pub const DEFAULT_TITLE: &str = "Dependabot Pull Requests";
pub const DEFAULT_OUTPUT: &str = "dependabot-prs.html";
/// Largest page the search API serves; no further pages are requested.
pub const MAX_PER_PAGE: u8 = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration loaded from .dependabot-report.toml.
/// All fields are optional; the tool works with zero config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubConfig {
    /// GitHub API token. If None, falls back to GITHUB_TOKEN env var.
    pub token: Option<String>,
    /// API host, e.g. a GitHub Enterprise endpoint
    pub api_url: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchConfig {
    /// Organization to search
    pub org: Option<String>,
    /// Login of the automated PR author
    pub author: Option<String>,
    pub per_page: Option<u8>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportConfig {
    pub title: Option<String>,
    pub output: Option<PathBuf>,
}

impl Config {
    /// Load configuration from .dependabot-report.toml in the current directory.
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(CONFIG_FILE);
        let mut config = if path.exists() {
            Self::load_from(path)?
        } else {
            Config::default()
        };

        if config.github.token.is_none() {
            if let Ok(token) = std::env::var("GITHUB_TOKEN") {
                config.github.token = Some(token);
            }
        }

        Ok(config)
    }

    /// Load from a specific path (useful for testing).
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Resolve the GitHub token: config file value takes precedence,
    /// falls back to GITHUB_TOKEN env var.
    pub fn github_token(&self) -> Option<String> {
        self.github
            .token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
    }

    pub fn api_url(&self) -> String {
        self.github
            .api_url
            .clone()
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    pub fn user_agent(&self) -> String {
        self.github
            .user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string())
    }

    pub fn org(&self) -> String {
        self.search
            .org
            .clone()
            .unwrap_or_else(|| DEFAULT_ORG.to_string())
    }

    pub fn author(&self) -> String {
        self.search
            .author
            .clone()
            .unwrap_or_else(|| DEFAULT_AUTHOR.to_string())
    }

    /// Page size clamped to what the search API accepts.
    pub fn per_page(&self) -> u8 {
        self.search
            .per_page
            .unwrap_or(MAX_PER_PAGE)
            .clamp(1, MAX_PER_PAGE)
    }

    pub fn title(&self) -> String {
        self.report
            .title
            .clone()
            .unwrap_or_else(|| DEFAULT_TITLE.to_string())
    }

    pub fn output(&self) -> PathBuf {
        self.report
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT))
    }
}
