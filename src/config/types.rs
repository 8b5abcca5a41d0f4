use crate::crawler::BudgetPolicy;
use serde::Deserialize;

/// Main configuration structure for newsrake
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub broker: BrokerConfig,
    pub crawl: CrawlConfig,
    pub output: OutputConfig,
}

/// Broker / job store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    /// Path to the SQLite job store (the broker endpoint)
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// How long a completed job's result stays queryable, in seconds
    #[serde(rename = "retention-secs", default = "default_retention_secs")]
    pub retention_secs: u64,

    /// Worker poll cadence when no job is pending, in milliseconds
    #[serde(rename = "poll-interval-ms", default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Page listing the RSS/XML feeds to crawl
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// CSS selector locating the article content region
    #[serde(rename = "content-selector", default = "default_content_selector")]
    pub content_selector: String,

    /// Optional ceiling on cumulative characters written per run
    #[serde(rename = "budget-max-chars", default)]
    pub budget_max_chars: Option<u64>,

    /// What a budget halt stops: the entire run or only the current source
    #[serde(rename = "budget-policy", default)]
    pub budget_policy: BudgetPolicy,

    /// Per-request timeout for page and feed fetches, in seconds
    #[serde(rename = "fetch-timeout-secs", default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory that receives crawl artifacts
    pub directory: String,

    /// Artifact name prefix; derived from the base URL host when absent
    #[serde(rename = "site-label", default)]
    pub site_label: Option<String>,
}

fn default_retention_secs() -> u64 {
    // One day, matching the broker's historical result_expires setting.
    86_400
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_content_selector() -> String {
    "div.article-content".to_string()
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    concat!("newsrake/", env!("CARGO_PKG_VERSION")).to_string()
}
