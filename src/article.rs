// src/article.rs
//! Normalized article record shared by adapters, scoring, and the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bucket for articles whose adapter did not declare a section.
pub const UNCATEGORIZED: &str = "uncategorized";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub title: String,
    /// Source URL; identity of the article within one section.
    pub link: String,
    /// Outlet display name, e.g. "The Hindu".
    pub source: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    /// Section declared by the adapter. May be empty.
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub impact_score: f64,
    #[serde(default)]
    pub breaking_score: f64,
    #[serde(default)]
    pub is_breaking: bool,
    /// Explicit breaking marker carried by the source item.
    #[serde(default)]
    pub breaking_hint: bool,
}

impl Article {
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        source: impl Into<String>,
        section: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            source: source.into(),
            description: None,
            published_at: None,
            section: section.into(),
            impact_score: 0.0,
            breaking_score: 0.0,
            is_breaking: false,
            breaking_hint: false,
        }
    }

    pub fn published(mut self, at: DateTime<Utc>) -> Self {
        self.published_at = Some(at);
        self
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn flagged_breaking(mut self) -> Self {
        self.breaking_hint = true;
        self
    }

    /// Age in fractional hours at `now`; `None` when the date is unknown.
    /// Future timestamps count as age zero.
    pub fn age_hours(&self, now: DateTime<Utc>) -> Option<f64> {
        self.published_at
            .map(|at| ((now - at).num_seconds().max(0) as f64) / 3600.0)
    }
}
