//! Feed discovery and parsing
//!
//! The document-parser seam for the feed side of a crawl:
//! - discovering candidate feed links on a listing page (`scraper`)
//! - parsing a feed body into entries in document order (`rss`)

use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// A single entry pulled out of a feed, in document order
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    /// Entry title; empty when the feed omits one
    pub title: String,

    /// Absolute link to the entry's page
    pub link: String,

    /// Publication timestamp as the feed spells it
    pub published: String,
}

/// Extracts candidate feed links from a listing page
///
/// Candidates are `<a href>` values referencing `.rss` or `.xml`, resolved
/// against `base_url`. The result is deduplicated with set semantics while
/// preserving first-seen order, so no source is ever processed twice in one
/// run even when the listing links it repeatedly.
pub fn discover_feed_links(html: &str, base_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);

    // Selector literal is valid; parse cannot fail.
    let anchor_selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&anchor_selector) {
        let href = match element.value().attr("href") {
            Some(h) => h.trim(),
            None => continue,
        };

        if !href.contains(".rss") && !href.contains(".xml") {
            continue;
        }

        let absolute = match base_url.join(href) {
            Ok(u) => u,
            Err(e) => {
                tracing::debug!("Skipping unresolvable feed link {}: {}", href, e);
                continue;
            }
        };

        if absolute.scheme() != "http" && absolute.scheme() != "https" {
            continue;
        }

        if seen.insert(absolute.as_str().to_string()) {
            links.push(absolute);
        }
    }

    links
}

/// Parses a feed body into entries, preserving document order
///
/// Entries without a link cannot be fetched and are dropped with a debug log.
///
/// # Arguments
///
/// * `xml` - The raw feed body
///
/// # Returns
///
/// * `Ok(Vec<FeedEntry>)` - Entries in the order the feed lists them
/// * `Err(String)` - The body is not a parseable feed
pub fn parse_feed(xml: &str) -> Result<Vec<FeedEntry>, String> {
    let channel = rss::Channel::read_from(xml.as_bytes()).map_err(|e| e.to_string())?;

    let entries = channel
        .items()
        .iter()
        .filter_map(|item| {
            let link = match item.link() {
                Some(l) => l.to_string(),
                None => {
                    tracing::debug!(
                        "Skipping feed entry without link (title: {:?})",
                        item.title()
                    );
                    return None;
                }
            };
            Some(FeedEntry {
                title: item.title().unwrap_or_default().to_string(),
                link,
                published: item.pub_date().unwrap_or_default().to_string(),
            })
        })
        .collect();

    Ok(entries)
}
