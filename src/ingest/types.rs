// src/ingest/types.rs
use anyhow::Result;
use std::collections::BTreeMap;

use crate::article::Article;

/// Per-section fetch seam. One call returns the normalized articles for one
/// requested section, each tagged with its own `section`.
#[async_trait::async_trait]
pub trait SectionAdapter: Send + Sync {
    /// `sources` maps source key → enabled; a missing key means enabled.
    async fn fetch_section_news(
        &self,
        section: &str,
        target_count: usize,
        sources: &BTreeMap<String, bool>,
    ) -> Result<Vec<Article>>;

    /// Drop every cached fetch. Called before a forced re-aggregation.
    fn clear_cache(&self) {}

    /// Apply the cache toggle and TTL from the current settings.
    fn configure_cache(&self, _enabled: bool, _ttl_secs: u64) {}
}

/// Raw document fetch (HTTP in production, fixtures in tests).
#[async_trait::async_trait]
pub trait FeedTransport: Send + Sync {
    async fn get(&self, url: &str) -> Result<String>;
}

/// One syndicated feed in the registry.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FeedSpec {
    /// Key matched against `Settings::news_sources`, e.g. "the_hindu".
    pub source_key: String,
    /// Display name stamped on articles, e.g. "The Hindu".
    pub source_name: String,
    /// Section this feed is fetched for.
    pub section: String,
    pub url: String,
    /// Mixed-topic feed: items are re-tagged from their `<category>`.
    #[serde(default)]
    pub mixed: bool,
}
