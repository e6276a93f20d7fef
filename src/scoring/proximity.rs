// src/scoring/proximity.rs
//! Proximity boost: stories that mention places close to the readership rank
//! higher. Plain case-insensitive substring matching against a gazetteer.

use std::collections::BTreeMap;

pub const NO_BOOST: f64 = 1.0;

/// Built-in gazetteer: location name → multiplier (≥ 1.0).
pub fn default_gazetteer() -> BTreeMap<String, f64> {
    [
        ("chennai", 2.0),
        ("tamil nadu", 1.8),
        ("madurai", 1.6),
        ("coimbatore", 1.6),
        ("tiruchirappalli", 1.5),
        ("puducherry", 1.5),
        ("bengaluru", 1.3),
        ("kerala", 1.3),
        ("india", 1.2),
        ("muscat", 1.8),
        ("dubai", 1.4),
        ("singapore", 1.3),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProximityConfig {
    pub enabled: bool,
    /// Keys are stored lowercase.
    pub gazetteer: BTreeMap<String, f64>,
}

impl ProximityConfig {
    pub fn new(enabled: bool, gazetteer: BTreeMap<String, f64>) -> Self {
        Self {
            enabled,
            gazetteer: gazetteer
                .into_iter()
                .map(|(k, v)| (k.trim().to_lowercase(), v))
                .filter(|(k, _)| !k.is_empty())
                .collect(),
        }
    }

    pub fn disabled() -> Self {
        Self::new(false, BTreeMap::new())
    }

    pub fn max_boost(&self) -> f64 {
        self.gazetteer.values().copied().fold(NO_BOOST, f64::max)
    }
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self::new(true, default_gazetteer())
    }
}

/// Largest multiplier among gazetteer entries found in title + description.
/// Exactly `1.0` when disabled or nothing matches.
pub fn proximity_boost(title: &str, description: &str, cfg: &ProximityConfig) -> f64 {
    if !cfg.enabled {
        return NO_BOOST;
    }
    let haystack = format!("{} {}", title, description).to_lowercase();
    cfg.gazetteer
        .iter()
        .filter(|(place, _)| haystack.contains(place.as_str()))
        .map(|(_, &boost)| boost)
        .fold(NO_BOOST, f64::max)
}
