//! Crawl engine - main crawl orchestration logic
//!
//! This module contains the run loop that coordinates one crawl:
//! - Discovering feed sources on the listing page
//! - Iterating sources sequentially, entries in document order
//! - Enforcing the content budget before every write
//! - Writing retained articles to the artifact sink
//! - Producing the terminal summary

use crate::config::{CrawlConfig, OutputConfig};
use crate::crawler::budget::{BudgetPolicy, ContentBudget};
use crate::crawler::extract::{extract_content, parse_content_selector};
use crate::crawler::feed::{discover_feed_links, parse_feed};
use crate::crawler::fetcher::{build_http_client, fetch_page, FetchResult};
use crate::crawler::{CrawlSummary, ProgressSink};
use crate::output::{Article, ArticleSink, CsvSink};
use crate::state::RunPhase;
use crate::NewsrakeError;
use reqwest::Client;
use scraper::Selector;
use serde_json::json;
use std::path::Path;
use std::time::Instant;
use url::Url;

/// Message reported when discovery yields nothing
pub const NO_SOURCES_MESSAGE: &str = "no sources found";

/// What happened to a single source
#[derive(Debug, PartialEq, Eq)]
enum SourceOutcome {
    /// Every entry was visited (written, skipped, or failed)
    Drained,

    /// The budget refused further writes while entries remained
    BudgetHalted,
}

/// Budget-aware crawl engine
///
/// One engine instance serves many runs; each run gets its own budget and
/// artifact. The engine only fails on unrecoverable sink I/O errors - every
/// fetch or parse problem is logged and skipped.
pub struct CrawlEngine {
    client: Client,
    base_url: Url,
    content_selector: Selector,
    budget_policy: BudgetPolicy,
    output: OutputConfig,
}

impl CrawlEngine {
    /// Creates a new engine from validated configuration
    pub fn new(crawl: &CrawlConfig, output: &OutputConfig) -> Result<Self, NewsrakeError> {
        let client = build_http_client(crawl)?;
        let base_url = Url::parse(&crawl.base_url)?;
        let content_selector =
            parse_content_selector(&crawl.content_selector).map_err(|message| {
                NewsrakeError::SelectorParse {
                    selector: crawl.content_selector.clone(),
                    message,
                }
            })?;

        Ok(Self {
            client,
            base_url,
            content_selector,
            budget_policy: crawl.budget_policy,
            output: output.clone(),
        })
    }

    /// Runs one crawl to completion
    ///
    /// # Arguments
    ///
    /// * `budget` - The content budget for this run
    /// * `progress` - Receiver for progress snapshots
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlSummary)` - Terminal summary, including the no-sources case
    /// * `Err(NewsrakeError)` - Unrecoverable sink I/O failure
    pub async fn run(
        &self,
        budget: &mut ContentBudget,
        progress: &dyn ProgressSink,
    ) -> Result<CrawlSummary, NewsrakeError> {
        let started = Instant::now();
        let mut phase = RunPhase::Init;

        advance(&mut phase, RunPhase::Discovering);
        let sources = self.discover_sources().await;
        progress.publish(json!({
            "phase": phase.to_string(),
            "sources_found": sources.len(),
        }));

        if sources.is_empty() {
            tracing::warn!("No feed sources found at {}", self.base_url);
            return Ok(CrawlSummary::no_sources(started.elapsed().as_secs_f64()));
        }
        tracing::info!("Found {} unique feed sources", sources.len());

        // The artifact only exists once discovery has produced something.
        std::fs::create_dir_all(&self.output.directory)?;
        let site_label = self.site_label();
        let mut sink = CsvSink::create(Path::new(&self.output.directory), &site_label)?;
        let artifact = sink.path().display().to_string();

        advance(&mut phase, RunPhase::IteratingSources);
        let mut articles_written = 0u64;
        let mut stopped_early = false;

        for (index, source) in sources.iter().enumerate() {
            progress.publish(json!({
                "phase": phase.to_string(),
                "source": source.as_str(),
                "source_index": index,
                "sources_total": sources.len(),
                "articles_written": articles_written,
                "chars_written": budget.used(),
            }));

            let outcome = self
                .crawl_source(source, &mut sink, budget, &mut articles_written)
                .await?;

            if outcome == SourceOutcome::BudgetHalted {
                stopped_early = true;
                match self.budget_policy {
                    BudgetPolicy::Run => {
                        tracing::info!("Content budget exhausted, halting run");
                        break;
                    }
                    BudgetPolicy::Source => {
                        tracing::info!("Content budget halted source {}", source);
                    }
                }
            }
        }

        advance(
            &mut phase,
            if stopped_early {
                RunPhase::StoppedEarly
            } else {
                RunPhase::Completed
            },
        );

        sink.finish()?;
        advance(&mut phase, RunPhase::Finalized);

        let elapsed_secs = started.elapsed().as_secs_f64();
        let message = if stopped_early {
            format!(
                "Crawl stopped early at {} characters after {:.2} seconds.",
                budget.used(),
                elapsed_secs
            )
        } else {
            format!("Crawl completed in {:.2} seconds.", elapsed_secs)
        };
        tracing::info!(
            "{} {} articles written to {}",
            message,
            articles_written,
            artifact
        );

        Ok(CrawlSummary {
            artifact_path: Some(artifact),
            message,
            stopped_early,
            articles_written,
            chars_written: budget.used(),
            elapsed_secs,
        })
    }

    /// Fetches the listing page and collects feed sources
    ///
    /// A listing page that cannot be fetched yields an empty set - the run
    /// then reports "no sources found" rather than failing.
    async fn discover_sources(&self) -> Vec<Url> {
        match fetch_page(&self.client, self.base_url.as_str()).await {
            FetchResult::Success {
                final_url, body, ..
            } => {
                let base = Url::parse(&final_url).unwrap_or_else(|_| self.base_url.clone());
                discover_feed_links(&body, &base)
            }
            FetchResult::HttpError { status_code } => {
                tracing::warn!(
                    "Failed to retrieve listing page {}: HTTP {}",
                    self.base_url,
                    status_code
                );
                Vec::new()
            }
            FetchResult::NetworkError { error } => {
                tracing::warn!(
                    "Failed to retrieve listing page {}: {}",
                    self.base_url,
                    error
                );
                Vec::new()
            }
        }
    }

    /// Walks one source's entries in document order
    ///
    /// Per-entry failures skip just that entry. Only the budget can halt a
    /// source; only sink I/O can abort the run.
    async fn crawl_source<S: ArticleSink>(
        &self,
        source: &Url,
        sink: &mut S,
        budget: &mut ContentBudget,
        articles_written: &mut u64,
    ) -> Result<SourceOutcome, NewsrakeError> {
        tracing::info!("Processing feed: {}", source);

        let body = match fetch_page(&self.client, source.as_str()).await {
            FetchResult::Success { body, .. } => body,
            FetchResult::HttpError { status_code } => {
                tracing::warn!("Failed to retrieve feed {}: HTTP {}", source, status_code);
                return Ok(SourceOutcome::Drained);
            }
            FetchResult::NetworkError { error } => {
                tracing::warn!("Failed to retrieve feed {}: {}", source, error);
                return Ok(SourceOutcome::Drained);
            }
        };

        let entries = match parse_feed(&body) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Failed to parse feed {}: {}", source, e);
                return Ok(SourceOutcome::Drained);
            }
        };

        for entry in entries {
            if budget.is_exhausted() {
                return Ok(SourceOutcome::BudgetHalted);
            }

            let page = match fetch_page(&self.client, &entry.link).await {
                FetchResult::Success { body, .. } => body,
                FetchResult::HttpError { status_code } => {
                    tracing::warn!(
                        "Failed to retrieve article {}: HTTP {}",
                        entry.link,
                        status_code
                    );
                    continue;
                }
                FetchResult::NetworkError { error } => {
                    tracing::warn!("Failed to retrieve article {}: {}", entry.link, error);
                    continue;
                }
            };

            let content = match extract_content(&page, &self.content_selector) {
                Some(content) => content,
                None => {
                    tracing::warn!("Could not find article content for: {}", entry.link);
                    continue;
                }
            };

            // Check precedes write: a record that does not fit is dropped
            // whole, never truncated.
            let len = content.chars().count() as u64;
            if !budget.try_charge(len) {
                return Ok(SourceOutcome::BudgetHalted);
            }

            sink.write_article(&Article {
                title: entry.title,
                link: entry.link,
                published: entry.published,
                content,
            })?;
            *articles_written += 1;
        }

        Ok(SourceOutcome::Drained)
    }

    /// Artifact name prefix: configured label, or the base URL's first host label
    fn site_label(&self) -> String {
        if let Some(label) = &self.output.site_label {
            return label.clone();
        }
        derive_site_label(&self.base_url)
    }
}

/// Derives a site label from a URL host: `https://www.vietstock.vn/rss`
/// becomes `vietstock`
fn derive_site_label(url: &Url) -> String {
    url.host_str()
        .map(|host| host.trim_start_matches("www."))
        .and_then(|host| host.split('.').next())
        .filter(|label| !label.is_empty())
        .unwrap_or("site")
        .to_string()
}

/// Advances the run phase, enforcing forward-only transitions
fn advance(phase: &mut RunPhase, next: RunPhase) {
    debug_assert!(
        phase.can_advance(next),
        "illegal run phase transition {} -> {}",
        phase,
        next
    );
    tracing::debug!("Run phase: {} -> {}", phase, next);
    *phase = next;
}
