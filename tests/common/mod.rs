// tests/common/mod.rs
// Shared stubs for integration tests.
#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::{Barrier, Notify};

use daily_brief::article::Article;
use daily_brief::clock::FixedClock;
use daily_brief::config::{MemorySettingsStore, SectionSettings, Settings};
use daily_brief::engine::AggregationEngine;
use daily_brief::feed::FeedHandle;
use daily_brief::ingest::SectionAdapter;

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

/// Article published `minutes_ago` before `now()`.
pub fn article(source: &str, title: &str, section: &str, minutes_ago: i64) -> Article {
    let slug: String = title
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    Article::new(title, format!("https://{}/{slug}", source.replace(' ', "")), source, section)
        .published(now() - Duration::minutes(minutes_ago))
}

/// `n` distinct articles tagged `section`, one hour apart.
pub fn articles(section: &str, n: usize) -> Vec<Article> {
    (0..n)
        .map(|i| article("BBC News", &format!("{section} story {i}"), section, 30 + 60 * i as i64))
        .collect()
}

pub fn settings(sections: &[(&str, usize)]) -> Settings {
    Settings::with_sections(sections.iter().map(|(k, count)| {
        (
            *k,
            SectionSettings {
                enabled: true,
                count: *count,
            },
        )
    }))
}

/// Canned per-section adapter. Unknown sections return an empty list.
#[derive(Default)]
pub struct StubAdapter {
    responses: Mutex<HashMap<String, Result<Vec<Article>, String>>>,
    calls: Mutex<Vec<(String, usize)>>,
    clears: AtomicUsize,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    barrier: Option<Arc<Barrier>>,
}

impl StubAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_articles(self, section: &str, articles: Vec<Article>) -> Self {
        self.set_articles(section, articles);
        self
    }

    pub fn failing(self, section: &str, message: &str) -> Self {
        self.set_failure(section, message);
        self
    }

    /// Fetches of `section` block until `gate` is notified.
    pub fn gated(self, section: &str, gate: Arc<Notify>) -> Self {
        self.gates
            .lock()
            .unwrap()
            .insert(section.to_string(), gate);
        self
    }

    /// Every fetch waits on `barrier` before answering.
    pub fn with_barrier(mut self, barrier: Arc<Barrier>) -> Self {
        self.barrier = Some(barrier);
        self
    }

    pub fn set_articles(&self, section: &str, articles: Vec<Article>) {
        self.responses
            .lock()
            .unwrap()
            .insert(section.to_string(), Ok(articles));
    }

    pub fn set_failure(&self, section: &str, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(section.to_string(), Err(message.to_string()));
    }

    /// (section, target_count) in call order.
    pub fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SectionAdapter for StubAdapter {
    async fn fetch_section_news(
        &self,
        section: &str,
        target_count: usize,
        _sources: &BTreeMap<String, bool>,
    ) -> anyhow::Result<Vec<Article>> {
        self.calls
            .lock()
            .unwrap()
            .push((section.to_string(), target_count));
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        let gate = self.gates.lock().unwrap().get(section).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let canned = self.responses.lock().unwrap().get(section).cloned();
        match canned {
            Some(Ok(v)) => Ok(v),
            Some(Err(m)) => Err(anyhow!(m)),
            None => Ok(Vec::new()),
        }
    }

    fn clear_cache(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct Harness {
    pub store: Arc<MemorySettingsStore>,
    pub adapter: Arc<StubAdapter>,
    pub feed: FeedHandle,
    pub engine: Arc<AggregationEngine>,
}

/// Engine over a memory store and a stub adapter, frozen at `now()`.
pub fn harness(settings: Settings, adapter: StubAdapter) -> Harness {
    let store = Arc::new(MemorySettingsStore::new(settings));
    harness_with_store(store, adapter)
}

pub fn harness_with_store(store: Arc<MemorySettingsStore>, adapter: StubAdapter) -> Harness {
    let adapter = Arc::new(adapter);
    let feed = FeedHandle::new();
    let engine = AggregationEngine::new(store.clone(), adapter.clone(), feed.clone())
        .with_clock(Arc::new(FixedClock(now())));
    Harness {
        store,
        adapter,
        feed,
        engine: Arc::new(engine),
    }
}
