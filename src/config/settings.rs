// src/config/settings.rs
//! Versioned user settings that drive a refresh cycle.
//!
//! Every field is optional on disk. Absent booleans that gate content
//! (section `enabled`, per-source flags, cache, proximity) default to `true`.
//!
//! ```toml
//! version = 1
//! freshnessLimitHours = 24
//! strictFreshness = false
//! enableCache = true
//! enableProximityScoring = true
//! rankingMode = "smart"
//!
//! [sections.world]
//! enabled = true
//! count = 5
//!
//! [newsSources]
//! bbc = false
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::fingerprint::SettingsFingerprint;

pub const SETTINGS_VERSION: u32 = 1;

/// Sections shipped in the default configuration, in display order.
pub const DEFAULT_SECTIONS: [&str; 8] = [
    "world",
    "india",
    "business",
    "technology",
    "sports",
    "entertainment",
    "tamil_nadu",
    "editorial",
];

fn default_true() -> bool {
    true
}
fn default_count() -> usize {
    10
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Number of articles the presentation wants for this section.
    #[serde(default = "default_count")]
    pub count: usize,
}

impl Default for SectionSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            count: default_count(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingMode {
    /// Recency × source weight × proximity.
    #[default]
    Smart,
    /// Recency only.
    Legacy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub version: u32,
    pub sections: BTreeMap<String, SectionSettings>,
    /// Per-source enable flags keyed by source key. Missing key ⇒ enabled.
    pub news_sources: BTreeMap<String, bool>,
    pub freshness_limit_hours: u32,
    pub strict_freshness: bool,
    pub enable_cache: bool,
    pub cache_ttl_secs: u64,
    pub enable_proximity_scoring: bool,
    /// Overrides the built-in proximity gazetteer when present.
    pub gazetteer: Option<BTreeMap<String, f64>>,
    pub ranking_mode: RankingMode,
    /// Presentation-only; never read by the engine.
    pub ui_mode: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            sections: DEFAULT_SECTIONS
                .iter()
                .map(|s| (s.to_string(), SectionSettings::default()))
                .collect(),
            news_sources: BTreeMap::new(),
            freshness_limit_hours: 24,
            strict_freshness: false,
            enable_cache: true,
            cache_ttl_secs: 300,
            enable_proximity_scoring: true,
            gazetteer: None,
            ranking_mode: RankingMode::Smart,
            ui_mode: None,
        }
    }
}

impl Settings {
    /// Settings with exactly the given sections, everything else default.
    pub fn with_sections<I, S>(sections: I) -> Self
    where
        I: IntoIterator<Item = (S, SectionSettings)>,
        S: Into<String>,
    {
        Self {
            sections: sections.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            ..Self::default()
        }
    }

    pub fn source_enabled(&self, source_key: &str) -> bool {
        self.news_sources.get(source_key).copied().unwrap_or(true)
    }

    pub fn section(&self, key: &str) -> Option<&SectionSettings> {
        self.sections.get(key)
    }

    /// Freshness limit in hours, never zero.
    pub fn freshness_limit(&self) -> f64 {
        f64::from(self.freshness_limit_hours.max(1))
    }

    /// Content-affecting subset used for change detection.
    /// Only disabled sources are kept: an absent key already means enabled.
    pub fn fingerprint(&self) -> SettingsFingerprint {
        SettingsFingerprint {
            disabled_sources: self
                .news_sources
                .iter()
                .filter(|(_, on)| !**on)
                .map(|(key, _)| key.clone())
                .collect(),
            freshness_limit_hours: self.freshness_limit_hours,
            strict_freshness: self.strict_freshness,
            enable_cache: self.enable_cache,
        }
    }
}
