// src/ingest/cache.rs
//! Time-based cache in front of any `SectionAdapter`.

use anyhow::Result;
use async_trait::async_trait;
use metrics::counter;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::types::SectionAdapter;
use crate::article::Article;

type CacheKey = (String, usize, BTreeMap<String, bool>);

pub struct CachedAdapter<A: SectionAdapter> {
    inner: A,
    enabled: AtomicBool,
    ttl_secs: AtomicU64,
    entries: Mutex<HashMap<CacheKey, (Instant, Vec<Article>)>>,
}

impl<A: SectionAdapter> CachedAdapter<A> {
    pub fn new(inner: A, ttl: Duration) -> Self {
        Self {
            inner,
            enabled: AtomicBool::new(true),
            ttl_secs: AtomicU64::new(ttl.as_secs()),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, key: &CacheKey) -> Option<Vec<Article>> {
        let ttl = Duration::from_secs(self.ttl_secs.load(Ordering::Relaxed));
        let entries = self.entries.lock().ok()?;
        entries
            .get(key)
            .filter(|(at, _)| at.elapsed() < ttl)
            .map(|(_, v)| v.clone())
    }
}

#[async_trait]
impl<A: SectionAdapter> SectionAdapter for CachedAdapter<A> {
    async fn fetch_section_news(
        &self,
        section: &str,
        target_count: usize,
        sources: &BTreeMap<String, bool>,
    ) -> Result<Vec<Article>> {
        if !self.enabled.load(Ordering::Relaxed) {
            return self
                .inner
                .fetch_section_news(section, target_count, sources)
                .await;
        }

        let key: CacheKey = (section.to_string(), target_count, sources.clone());
        if let Some(hit) = self.lookup(&key) {
            counter!("brief_cache_hits_total").increment(1);
            tracing::trace!(target: "ingest", section, "cache hit");
            return Ok(hit);
        }

        let fresh = self
            .inner
            .fetch_section_news(section, target_count, sources)
            .await?;
        let ttl = Duration::from_secs(self.ttl_secs.load(Ordering::Relaxed));
        if let Ok(mut entries) = self.entries.lock() {
            // Keys include the target count, so stale shapes would otherwise pile up.
            entries.retain(|_, (at, _)| at.elapsed() < ttl);
            entries.insert(key, (Instant::now(), fresh.clone()));
        }
        Ok(fresh)
    }

    fn clear_cache(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            let dropped = entries.len();
            entries.clear();
            counter!("brief_cache_invalidations_total").increment(1);
            tracing::info!(target: "ingest", dropped, "cache cleared");
        }
        self.inner.clear_cache();
    }

    fn configure_cache(&self, enabled: bool, ttl_secs: u64) {
        self.enabled.store(enabled, Ordering::Relaxed);
        self.ttl_secs.store(ttl_secs, Ordering::Relaxed);
    }
}
