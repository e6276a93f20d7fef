// src/ingest/adapter.rs
use anyhow::{bail, Result};
use async_trait::async_trait;
use futures::future::join_all;
use metrics::counter;
use std::collections::{BTreeMap, HashSet};

use super::rss::parse_feed;
use super::types::{FeedSpec, FeedTransport, SectionAdapter};
use crate::article::Article;

/// Section adapter over a registry of RSS feeds.
pub struct RssSectionAdapter<T: FeedTransport> {
    feeds: Vec<FeedSpec>,
    transport: T,
}

impl<T: FeedTransport> RssSectionAdapter<T> {
    pub fn new(feeds: Vec<FeedSpec>, transport: T) -> Self {
        super::ensure_metrics_described();
        Self { feeds, transport }
    }

    pub fn feeds(&self) -> &[FeedSpec] {
        &self.feeds
    }

    fn feeds_for<'a>(
        &'a self,
        section: &'a str,
        sources: &'a BTreeMap<String, bool>,
    ) -> impl Iterator<Item = &'a FeedSpec> + 'a {
        self.feeds.iter().filter(move |f| {
            f.section == section && sources.get(&f.source_key).copied().unwrap_or(true)
        })
    }

    async fn fetch_feed(&self, feed: &FeedSpec) -> Result<Vec<Article>> {
        let body = self.transport.get(&feed.url).await?;
        parse_feed(&body, feed)
    }
}

#[async_trait]
impl<T: FeedTransport> SectionAdapter for RssSectionAdapter<T> {
    async fn fetch_section_news(
        &self,
        section: &str,
        target_count: usize,
        sources: &BTreeMap<String, bool>,
    ) -> Result<Vec<Article>> {
        let feeds: Vec<&FeedSpec> = self.feeds_for(section, sources).collect();
        if feeds.is_empty() {
            tracing::debug!(target: "ingest", section, "no enabled feeds");
            return Ok(Vec::new());
        }

        let results = join_all(feeds.iter().map(|f| self.fetch_feed(f))).await;

        let mut articles = Vec::new();
        let mut failures = Vec::new();
        for (feed, res) in feeds.iter().zip(results) {
            match res {
                Ok(mut v) => articles.append(&mut v),
                Err(e) => {
                    tracing::warn!(target: "ingest", section, feed = %feed.url, error = %format!("{e:#}"), "feed error");
                    counter!("ingest_feed_errors_total", "source" => feed.source_key.clone())
                        .increment(1);
                    failures.push(format!("{}: {e:#}", feed.source_key));
                }
            }
        }

        if failures.len() == feeds.len() {
            bail!("all {} feeds failed: {}", feeds.len(), failures.join("; "));
        }

        let mut seen = HashSet::new();
        articles.retain(|a| seen.insert(a.link.clone()));
        // Newest first, undated last.
        articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        articles.truncate(target_count);

        tracing::debug!(target: "ingest", section, kept = articles.len(), failed = failures.len(), "section fetched");
        Ok(articles)
    }
}
