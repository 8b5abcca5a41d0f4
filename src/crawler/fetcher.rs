//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests made during a crawl run:
//! - Building an HTTP client with the configured identity and timeouts
//! - GET requests for the listing page, feeds, and article pages
//! - Error classification into skippable failure kinds

use crate::config::CrawlConfig;
use reqwest::Client;
use std::time::Duration;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Response body
        body: String,
    },

    /// Server answered with a non-success status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network-level failure (timeout, connection refused, TLS error)
    NetworkError {
        /// Error description
        error: String,
    },
}

impl FetchResult {
    /// Returns the body of a successful fetch, or None for any failure
    pub fn into_body(self) -> Option<String> {
        match self {
            Self::Success { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Builds an HTTP client from the crawl configuration
///
/// The client carries the configured User-Agent, enforces the per-request
/// timeout, and transparently decompresses gzip/brotli responses.
pub fn build_http_client(config: &CrawlConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.fetch_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and classifies the outcome
///
/// Failures never abort a run on their own; callers decide whether to skip
/// the entry or treat the page as missing.
pub async fn fetch_page(client: &Client, url: &str) -> FetchResult {
    match client.get(url).send().await {
        Ok(response) => {
            let status = response.status();
            let final_url = response.url().to_string();

            if !status.is_success() {
                return FetchResult::HttpError {
                    status_code: status.as_u16(),
                };
            }

            match response.text().await {
                Ok(body) => FetchResult::Success {
                    final_url,
                    status_code: status.as_u16(),
                    body,
                },
                Err(e) => FetchResult::NetworkError {
                    error: e.to_string(),
                },
            }
        }
        Err(e) => {
            let error = if e.is_timeout() {
                "Request timeout".to_string()
            } else if e.is_connect() {
                "Connection refused".to_string()
            } else {
                e.to_string()
            };
            FetchResult::NetworkError { error }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::BudgetPolicy;

    fn create_test_config() -> CrawlConfig {
        CrawlConfig {
            base_url: "https://news.example.com/rss".to_string(),
            content_selector: "div.article-content".to_string(),
            budget_max_chars: None,
            budget_policy: BudgetPolicy::Run,
            fetch_timeout_secs: 10,
            user_agent: "TestRake/1.0".to_string(),
        }
    }

    #[test]
    fn test_build_http_client() {
        let config = create_test_config();
        let client = build_http_client(&config);
        assert!(client.is_ok());
    }

    #[test]
    fn test_into_body() {
        let success = FetchResult::Success {
            final_url: "https://example.com/".to_string(),
            status_code: 200,
            body: "hello".to_string(),
        };
        assert_eq!(success.into_body().as_deref(), Some("hello"));

        let failure = FetchResult::HttpError { status_code: 404 };
        assert!(failure.into_body().is_none());
    }

    // HTTP behavior is exercised with wiremock in the integration tests.
}
