// src/scoring/mod.rs
//! Impact scoring.
//!
//! impact = tier + recency × quality
//! - tier: 1.0 for fresh articles, 0.0 once older than the freshness limit,
//!   so a stale article can never outrank a fresh one.
//! - recency in [0,1]: 1.0 → 0.5 linearly inside the limit, then a
//!   hyperbolic tail below 0.5.
//! - quality in [0,1]: source weight × proximity boost / max boost
//!   (`smart`), or 1.0 (`legacy`).
//!
//! All functions are pure in (article, context); the context carries the
//! cycle's frozen `now`.

pub mod breaking;
pub mod proximity;

use chrono::{DateTime, Utc};

use crate::article::Article;
use crate::config::{RankingMode, Settings};
use crate::source_weights::SourceWeightsConfig;

pub use breaking::{
    breaking_score, count_corroborations, has_breaking_marker, shortlist, BREAKING_THRESHOLD,
    SHORTLIST_LEN,
};
pub use proximity::{default_gazetteer, proximity_boost, ProximityConfig};

/// Lowest impact a fresh article can have.
pub const FRESH_FLOOR: f64 = 1.0;

/// Recency assumed for articles without a publication date.
const UNKNOWN_AGE_RECENCY: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct ScoringContext<'a> {
    pub now: DateTime<Utc>,
    pub freshness_limit_hours: f64,
    pub strict_freshness: bool,
    pub ranking_mode: RankingMode,
    pub proximity: ProximityConfig,
    pub weights: &'a SourceWeightsConfig,
}

impl<'a> ScoringContext<'a> {
    pub fn from_settings(
        settings: &Settings,
        now: DateTime<Utc>,
        weights: &'a SourceWeightsConfig,
    ) -> Self {
        let gazetteer = settings
            .gazetteer
            .clone()
            .unwrap_or_else(default_gazetteer);
        Self {
            now,
            freshness_limit_hours: settings.freshness_limit(),
            strict_freshness: settings.strict_freshness,
            ranking_mode: settings.ranking_mode,
            proximity: ProximityConfig::new(settings.enable_proximity_scoring, gazetteer),
            weights,
        }
    }
}

/// True when the article is older than the freshness limit. Undated
/// articles are never stale.
pub fn is_stale(article: &Article, ctx: &ScoringContext<'_>) -> bool {
    article
        .age_hours(ctx.now)
        .is_some_and(|age| age > ctx.freshness_limit_hours)
}

pub fn recency_score(article: &Article, ctx: &ScoringContext<'_>) -> f64 {
    let limit = ctx.freshness_limit_hours;
    match article.age_hours(ctx.now) {
        None => UNKNOWN_AGE_RECENCY,
        Some(age) if age <= limit => 1.0 - 0.5 * (age / limit),
        Some(age) => 0.5 / (1.0 + (age - limit) / limit),
    }
}

fn quality_score(article: &Article, ctx: &ScoringContext<'_>) -> f64 {
    match ctx.ranking_mode {
        RankingMode::Legacy => 1.0,
        RankingMode::Smart => {
            let weight = ctx.weights.weight_for(&article.source);
            let boost = proximity_boost(
                &article.title,
                article.description.as_deref().unwrap_or_default(),
                &ctx.proximity,
            );
            let max = if ctx.proximity.enabled {
                ctx.proximity.max_boost()
            } else {
                1.0
            };
            (weight * boost / max).clamp(0.0, 1.0)
        }
    }
}

pub fn impact_score(article: &Article, ctx: &ScoringContext<'_>) -> f64 {
    let value = recency_score(article, ctx) * quality_score(article, ctx);
    if is_stale(article, ctx) {
        value
    } else {
        FRESH_FLOOR + value
    }
}
