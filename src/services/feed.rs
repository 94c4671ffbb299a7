// src/services/feed.rs

//! Feed reader service.
//!
//! Fetches RSS/Atom feeds and normalizes their newest items into threads.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use feed_rs::model::Entry;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::{CrawlerConfig, Thread};
use crate::services::FeedSource;
use crate::utils::http::{create_async_client, fetch_bytes};
use crate::utils::{site_name, strip_html, url_category};

/// Service for reading forum feeds.
pub struct FeedReader {
    client: Client,
    item_limit: usize,
}

impl FeedReader {
    /// Create a new feed reader with the given configuration.
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        Ok(Self {
            client: create_async_client(config)?,
            item_limit: config.feed_item_limit,
        })
    }
}

#[async_trait]
impl FeedSource for FeedReader {
    async fn fetch_feed(&self, url: &str) -> Result<Vec<Thread>> {
        let bytes = fetch_bytes(&self.client, url).await?;
        let threads = parse_feed(url, &bytes, self.item_limit, Utc::now())?;
        log::debug!("Feed {} yielded {} threads", url, threads.len());
        Ok(threads)
    }
}

/// Parse a feed body into at most `limit` threads, in feed order.
///
/// Items that cannot be normalized are logged and skipped.
pub fn parse_feed(
    feed_url: &str,
    body: &[u8],
    limit: usize,
    now: DateTime<Utc>,
) -> Result<Vec<Thread>> {
    let feed = feed_rs::parser::parse(body)?;
    let domain = site_name(feed_url)
        .ok_or_else(|| AppError::parse(feed_url, "feed URL has no host"))?;
    let category = url_category(feed_url);

    let threads = feed
        .entries
        .into_iter()
        .take(limit)
        .filter_map(|entry| match entry_to_thread(entry, &domain, &category, now) {
            Ok(thread) => Some(thread),
            Err(e) => {
                log::warn!("Skipping feed item from {}: {}", feed_url, e);
                None
            }
        })
        .collect();

    Ok(threads)
}

fn entry_to_thread(entry: Entry, domain: &str, category: &str, now: DateTime<Utc>) -> Result<Thread> {
    let link = entry
        .links
        .first()
        .map(|l| l.href.trim().to_string())
        .filter(|href| !href.is_empty())
        .ok_or_else(|| AppError::parse(&entry.id, "feed item has no link"))?;

    let raw_description = entry
        .summary
        .map(|t| t.content)
        .filter(|s| !s.trim().is_empty())
        .or_else(|| entry.content.and_then(|c| c.body))
        .unwrap_or_default();

    let creator = entry
        .authors
        .into_iter()
        .map(|p| p.name)
        .find(|name| !name.trim().is_empty())
        .unwrap_or_default();

    Ok(Thread {
        link,
        domain: domain.to_string(),
        category: category.to_string(),
        title: entry.title.map(|t| t.content.trim().to_string()).unwrap_or_default(),
        description: strip_html(&raw_description),
        creator,
        publish_time: entry.published.or(entry.updated).unwrap_or(now),
        first_seen_time: now,
        last_page_fetched: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED_URL: &str = "https://lowendtalk.com/categories/offers/feed.rss";

    fn rss_with_items(count: usize) -> String {
        let items: String = (1..=count)
            .map(|i| {
                format!(
                    "<item>\
                       <title>Offer {i}</title>\
                       <link>https://lowendtalk.com/discussion/{i}/offer-{i}</link>\
                       <pubDate>Mon, 19 Oct 2026 08:00:00 +0000</pubDate>\
                       <description><![CDATA[<p>Deal <b>{i}</b></p>]]></description>\
                     </item>"
                )
            })
            .collect();
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <rss version=\"2.0\"><channel><title>Offers</title>\
             <link>https://lowendtalk.com/</link><description>Offers</description>\
             {items}</channel></rss>"
        )
    }

    #[test]
    fn test_parse_feed_normalizes_items() {
        let now = Utc::now();
        let threads = parse_feed(FEED_URL, rss_with_items(2).as_bytes(), 6, now).unwrap();

        assert_eq!(threads.len(), 2);
        let first = &threads[0];
        assert_eq!(first.link, "https://lowendtalk.com/discussion/1/offer-1");
        assert_eq!(first.title, "Offer 1");
        assert_eq!(first.domain, "lowendtalk");
        assert_eq!(first.category, "offers");
        assert_eq!(first.description, "Deal 1");
        assert_eq!(first.first_seen_time, now);
        assert_eq!(first.last_page_fetched, 0);
        assert_eq!(
            first.publish_time.to_rfc3339(),
            "2026-10-19T08:00:00+00:00"
        );
    }

    #[test]
    fn test_parse_feed_keeps_newest_window() {
        let threads = parse_feed(FEED_URL, rss_with_items(10).as_bytes(), 6, Utc::now()).unwrap();
        assert_eq!(threads.len(), 6);
        assert_eq!(threads[5].title, "Offer 6");
    }

    #[test]
    fn test_parse_feed_skips_items_without_link() {
        let body = "<?xml version=\"1.0\"?><rss version=\"2.0\"><channel><title>t</title>\
                    <item><title>No link</title><guid isPermaLink=\"false\">x-1</guid></item>\
                    <item><title>Linked</title><link>https://lowendtalk.com/discussion/7/x</link></item>\
                    </channel></rss>";
        let threads = parse_feed(FEED_URL, body.as_bytes(), 6, Utc::now()).unwrap();
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].title, "Linked");
    }

    #[test]
    fn test_parse_feed_rejects_garbage() {
        assert!(parse_feed(FEED_URL, b"not a feed", 6, Utc::now()).is_err());
    }
}
