//! Newsrake: a budget-aware news crawl job service
//!
//! This crate submits long-running article crawls as background jobs, tracks
//! each job's lifecycle through a durable job store, bounds crawl output by a
//! configurable content budget, and schedules deferred cleanup of the
//! artifacts a completed job leaves behind.

pub mod config;
pub mod crawler;
pub mod jobs;
pub mod output;
pub mod state;
pub mod status;
pub mod store;

use thiserror::Error;

/// Main error type for newsrake operations
#[derive(Debug, Error)]
pub enum NewsrakeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Job store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid content selector '{selector}': {message}")]
    SelectorParse { selector: String, message: String },

    #[error("No handler registered for task '{0}'")]
    UnknownTask(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for newsrake operations
pub type Result<T> = std::result::Result<T, NewsrakeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{BudgetPolicy, ContentBudget, CrawlSummary};
pub use jobs::{AppContext, JobSnapshot};
pub use state::{JobState, RunPhase};
pub use store::JobRecord;
