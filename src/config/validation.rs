use crate::config::types::{BrokerConfig, Config, CrawlConfig, OutputConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_broker_config(&config.broker)?;
    validate_crawl_config(&config.crawl)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates broker configuration
fn validate_broker_config(config: &BrokerConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    // retention_secs = 0 is legal: results expire as soon as they land.

    if config.poll_interval_ms == 0 {
        return Err(ConfigError::Validation(
            "poll_interval_ms must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawl configuration
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "base_url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if config.content_selector.is_empty() {
        return Err(ConfigError::Validation(
            "content_selector cannot be empty".to_string(),
        ));
    }

    if scraper::Selector::parse(&config.content_selector).is_err() {
        return Err(ConfigError::Validation(format!(
            "content_selector is not a valid CSS selector: '{}'",
            config.content_selector
        )));
    }

    if config.fetch_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "fetch_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.budget_max_chars == Some(0) {
        return Err(ConfigError::Validation(
            "budget_max_chars must be >= 1 when set".to_string(),
        ));
    }

    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if let Some(label) = &config.site_label {
        if label.is_empty() || !label.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_') {
            return Err(ConfigError::Validation(format!(
                "site_label must be non-empty and contain only alphanumerics, hyphens, underscores, got '{}'",
                label
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::BudgetPolicy;

    fn valid_config() -> Config {
        Config {
            broker: BrokerConfig {
                database_path: "./jobs.db".to_string(),
                retention_secs: 86_400,
                poll_interval_ms: 500,
            },
            crawl: CrawlConfig {
                base_url: "https://news.example.com/rss".to_string(),
                content_selector: "div.article-content".to_string(),
                budget_max_chars: None,
                budget_policy: BudgetPolicy::Run,
                fetch_timeout_secs: 10,
                user_agent: "newsrake/1.0".to_string(),
            },
            output: OutputConfig {
                directory: "./output".to_string(),
                site_label: None,
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_empty_database_path_rejected() {
        let mut config = valid_config();
        config.broker.database_path = String::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_retention_allowed() {
        let mut config = valid_config();
        config.broker.retention_secs = 0;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let mut config = valid_config();
        config.broker.poll_interval_ms = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_bad_base_url_rejected() {
        let mut config = valid_config();
        config.crawl.base_url = "not a url".to_string();
        assert!(matches!(
            validate(&config).unwrap_err(),
            ConfigError::InvalidUrl(_)
        ));
    }

    #[test]
    fn test_non_http_scheme_rejected() {
        let mut config = valid_config();
        config.crawl.base_url = "ftp://news.example.com/rss".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_bad_selector_rejected() {
        let mut config = valid_config();
        config.crawl.content_selector = "div..[".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_budget_rejected() {
        let mut config = valid_config();
        config.crawl.budget_max_chars = Some(0);
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_bad_site_label_rejected() {
        let mut config = valid_config();
        config.output.site_label = Some("has spaces".to_string());
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_good_site_label_accepted() {
        let mut config = valid_config();
        config.output.site_label = Some("viet-stock_1".to_string());
        assert!(validate(&config).is_ok());
    }
}
