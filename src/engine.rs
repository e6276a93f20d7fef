//! # Aggregation Engine
//! Fetches sections in two sequential priority waves, accumulates results
//! for the whole cycle, re-derives section placement from the full
//! accumulated set after every wave, and publishes a snapshot per wave.
//!
//! Per wave:
//! 1. fetch every enabled section of the batch concurrently (join barrier)
//! 2. merge into the cycle-local accumulated map keyed by requested section
//! 3. flatten everything, score, rebucket by classified section, sort
//! 4. publish buckets (bucket-level replace), errors and breaking shortlist

use futures::future::join_all;
use futures::FutureExt;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use std::collections::{BTreeMap, BTreeSet};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::article::Article;
use crate::classify::rebucket;
use crate::clock::{Clock, SystemClock};
use crate::config::{Settings, SettingsStore};
use crate::error::{BriefError, Result};
use crate::feed::FeedHandle;
use crate::ingest::SectionAdapter;
use crate::scoring::{
    breaking_score, count_corroborations, has_breaking_marker, impact_score, is_stale, shortlist,
    ScoringContext,
};
use crate::source_weights::SourceWeightsConfig;

/// Sections primary to the main view; fetched and published first.
pub const HIGH_PRIORITY_SECTIONS: [&str; 3] = ["world", "india", "business"];

/// Extra articles requested per section on top of the configured count.
pub const OVERFETCH: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    High,
    Low,
}

impl Priority {
    fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Low => "low",
        }
    }
}

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("brief_refresh_total", "Refresh cycles started.");
        describe_counter!(
            "brief_refresh_aborted_total",
            "Refresh cycles aborted before fetching."
        );
        describe_counter!(
            "brief_section_fetch_errors_total",
            "Per-section fetch failures."
        );
        describe_gauge!("brief_articles_published", "Articles in the published snapshot.");
        describe_gauge!("brief_last_fetch_ts", "Unix ts of the last completed refresh.");
        describe_histogram!("brief_wave_ms", "Wall time of one fetch wave in milliseconds.");
    });
}

/// Sections a cycle covers: all configured keys, or exactly the requested set.
pub fn resolve_sections(settings: &Settings, requested: Option<&BTreeSet<String>>) -> Vec<String> {
    match requested {
        None => settings.sections.keys().cloned().collect(),
        Some(set) => set.iter().cloned().collect(),
    }
}

/// Split into the high and low priority batches, in that order. Empty
/// batches are omitted.
pub fn partition_sections(sections: &[String]) -> Vec<(Priority, Vec<String>)> {
    let (high, low): (Vec<String>, Vec<String>) = sections
        .iter()
        .cloned()
        .partition(|s| HIGH_PRIORITY_SECTIONS.contains(&s.as_str()));
    [(Priority::High, high), (Priority::Low, low)]
        .into_iter()
        .filter(|(_, batch)| !batch.is_empty())
        .collect()
}

/// Score the whole accumulated set and place every article in the bucket
/// of its own classified section. Every key of `accumulated` is present in
/// the result, possibly empty. Buckets are sorted by impact, descending,
/// stable.
pub fn derive_buckets(
    accumulated: &BTreeMap<String, Vec<Article>>,
    ctx: &ScoringContext<'_>,
) -> BTreeMap<String, Vec<Article>> {
    let mut flat: Vec<Article> = accumulated.values().flatten().cloned().collect();
    if ctx.strict_freshness {
        flat.retain(|a| !is_stale(a, ctx));
    }

    let corroborations = count_corroborations(&flat);
    for (a, c) in flat.iter_mut().zip(corroborations) {
        a.impact_score = impact_score(a, ctx);
        a.breaking_score = breaking_score(a, c, ctx);
        a.is_breaking = a.is_breaking || has_breaking_marker(a);
    }

    let mut buckets = rebucket(flat);
    for key in accumulated.keys() {
        buckets.entry(key.clone()).or_default();
    }
    for bucket in buckets.values_mut() {
        bucket.sort_by(|a, b| b.impact_score.total_cmp(&a.impact_score));
    }
    buckets
}

#[derive(Debug, Default, Clone)]
pub struct CycleSummary {
    pub waves: usize,
    pub sections_fetched: usize,
    pub errors: usize,
    pub articles: usize,
}

type SectionOutcome = (String, std::result::Result<Vec<Article>, BriefError>);

/// Marks one cycle as running. Leaving (or dropping, on unwind) decrements
/// the engine-wide count exactly once.
struct InFlight<'a> {
    count: &'a AtomicUsize,
    left: bool,
}

impl<'a> InFlight<'a> {
    fn enter(count: &'a AtomicUsize) -> Self {
        count.fetch_add(1, Ordering::SeqCst);
        Self { count, left: false }
    }

    /// Cycles still running after this one.
    fn leave(&mut self) -> usize {
        if self.left {
            return self.count.load(Ordering::SeqCst);
        }
        self.left = true;
        self.count.fetch_sub(1, Ordering::SeqCst).saturating_sub(1)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.left {
            self.count.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

pub struct AggregationEngine {
    settings: Arc<dyn SettingsStore>,
    adapter: Arc<dyn SectionAdapter>,
    feed: FeedHandle,
    weights: Arc<SourceWeightsConfig>,
    clock: Arc<dyn Clock>,
    in_flight: AtomicUsize,
}

impl AggregationEngine {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        adapter: Arc<dyn SectionAdapter>,
        feed: FeedHandle,
    ) -> Self {
        ensure_metrics_described();
        Self {
            settings,
            adapter,
            feed,
            weights: Arc::new(SourceWeightsConfig::default_seed()),
            clock: Arc::new(SystemClock),
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_weights(mut self, weights: SourceWeightsConfig) -> Self {
        self.weights = Arc::new(weights);
        self
    }

    pub fn feed(&self) -> &FeedHandle {
        &self.feed
    }

    pub fn adapter(&self) -> &Arc<dyn SectionAdapter> {
        &self.adapter
    }

    pub fn settings_store(&self) -> &Arc<dyn SettingsStore> {
        &self.settings
    }

    /// Refresh cycles currently past settings load and not yet finished.
    pub fn cycles_in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Run one refresh cycle. Never fails: per-section problems land in the
    /// published error map, anything else is logged and the cycle ends.
    pub async fn refresh(&self, requested: Option<&BTreeSet<String>>) {
        let t0 = Instant::now();
        counter!("brief_refresh_total").increment(1);

        match self.try_refresh(requested).await {
            Ok(summary) => {
                tracing::info!(
                    target: "engine",
                    waves = summary.waves,
                    sections = summary.sections_fetched,
                    errors = summary.errors,
                    articles = summary.articles,
                    ms = t0.elapsed().as_millis() as u64,
                    "refresh complete"
                );
            }
            Err(BriefError::ConfigurationUnavailable) => {
                counter!("brief_refresh_aborted_total").increment(1);
                tracing::error!(target: "engine", "configuration unavailable; refresh skipped, snapshot unchanged");
            }
            Err(e) => {
                tracing::error!(target: "engine", error = %e, requested = ?requested, "refresh failed");
            }
        }
    }

    async fn try_refresh(&self, requested: Option<&BTreeSet<String>>) -> Result<CycleSummary> {
        let settings = self
            .settings
            .load()
            .ok_or(BriefError::ConfigurationUnavailable)?;
        let now = self.clock.now();
        self.adapter
            .configure_cache(settings.enable_cache, settings.cache_ttl_secs);

        let sections = resolve_sections(&settings, requested);
        let ctx = ScoringContext::from_settings(&settings, now, &self.weights);
        let mut accumulated: BTreeMap<String, Vec<Article>> = BTreeMap::new();
        let mut summary = CycleSummary::default();

        let mut cycle = InFlight::enter(&self.in_flight);
        self.feed.publish(|s| s.loading = true);

        for (priority, batch) in partition_sections(&sections) {
            let wave_t0 = Instant::now();
            let outcomes = self.fetch_batch(&settings, &batch).await;

            let mut wave_errors = BTreeMap::new();
            let mut succeeded = Vec::new();
            for (section, res) in outcomes {
                summary.sections_fetched += 1;
                match res {
                    Ok(articles) => {
                        accumulated.insert(section.clone(), articles);
                        succeeded.push(section);
                    }
                    Err(e) => {
                        tracing::warn!(target: "engine", %section, error = %e, "section fetch failed");
                        counter!("brief_section_fetch_errors_total", "section" => section.clone())
                            .increment(1);
                        accumulated.insert(section.clone(), Vec::new());
                        wave_errors.insert(section, e.to_string());
                    }
                }
            }
            summary.errors += wave_errors.len();

            let buckets = derive_buckets(&accumulated, &ctx);
            let breaking = shortlist(buckets.values().flatten());
            summary.articles = buckets.values().map(Vec::len).sum();
            summary.waves += 1;

            tracing::debug!(
                target: "engine",
                priority = priority.as_str(),
                buckets = buckets.len(),
                breaking = breaking.len(),
                "publishing wave"
            );

            self.feed.publish(move |s| {
                for (key, bucket) in buckets {
                    s.sections.insert(key, bucket);
                }
                for key in &succeeded {
                    s.errors.remove(key);
                }
                s.errors.extend(wave_errors);
                s.breaking_news = breaking;
            });

            histogram!("brief_wave_ms", "priority" => priority.as_str())
                .record(wave_t0.elapsed().as_secs_f64() * 1_000.0);
        }

        let finished = self.clock.now();
        // Leave under the feed lock so the last cycle out is the one that
        // clears `loading`.
        self.feed.publish(|s| {
            let others = cycle.leave();
            s.loading = others > 0;
            s.last_fetch = Some(finished);
        });
        gauge!("brief_last_fetch_ts").set(finished.timestamp() as f64);
        gauge!("brief_articles_published").set(self.feed.snapshot().article_count() as f64);

        Ok(summary)
    }

    /// Fetch one batch concurrently and wait for every fetch to settle.
    /// A failing or panicking adapter call only affects its own section.
    async fn fetch_batch(&self, settings: &Settings, batch: &[String]) -> Vec<SectionOutcome> {
        let jobs = batch.iter().filter_map(|section| {
            let Some(cfg) = settings.section(section) else {
                tracing::debug!(target: "engine", %section, "requested section not configured; skipped");
                return None;
            };
            if !cfg.enabled {
                return None;
            }
            let target = cfg.count + OVERFETCH;
            let fut = self
                .adapter
                .fetch_section_news(section, target, &settings.news_sources);
            Some(async move {
                let res = match AssertUnwindSafe(fut).catch_unwind().await {
                    Ok(Ok(articles)) => Ok(articles),
                    Ok(Err(e)) => Err(BriefError::adapter_fetch(section.as_str(), &e)),
                    Err(_) => Err(BriefError::AdapterFetch {
                        section: section.clone(),
                        message: "adapter panicked".to_string(),
                    }),
                };
                (section.clone(), res)
            })
        });
        join_all(jobs).await
    }
}
