//! # Source Weights
//!
//! Maps news outlets (e.g. "The Hindu", "BBC News", "dinamani.com") to a
//! normalized editorial weight in `[0.0, 1.0]` used by impact scoring.
//!
//! - Loads from JSON (`weights` + `aliases`), falls back to `default_seed()`.
//! - Lookup order: alias → exact → substring → default.
//! - Case-insensitive; dashes, underscores and dots fold to spaces, so the
//!   registry key `the_hindu` and the display name `The Hindu` agree.

use serde::Deserialize;
use std::{collections::HashMap, fs, path::Path};

#[derive(Debug, Clone, Deserialize)]
pub struct SourceWeightsConfig {
    /// Weight for outlets with no entry.
    #[serde(default = "default_default_weight")]
    pub default_weight: f64,
    #[serde(default)]
    pub weights: HashMap<String, f64>,
    /// Alternative spellings → canonical outlet names.
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

fn default_default_weight() -> f64 {
    0.60
}

impl Default for SourceWeightsConfig {
    fn default() -> Self {
        Self::default_seed()
    }
}

impl SourceWeightsConfig {
    /// Load from a JSON file, falling back to the built-in seed on any error.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(s) => serde_json::from_str::<Self>(&s)
                .map(Self::normalized)
                .unwrap_or_else(|e| {
                    tracing::warn!(path = %path.display(), error = %e, "bad source weights, using seed");
                    Self::default_seed()
                }),
            Err(_) => Self::default_seed(),
        }
    }

    fn normalized(self) -> Self {
        Self {
            default_weight: self.default_weight,
            weights: self
                .weights
                .into_iter()
                .map(|(k, v)| (normalize(&k), v))
                .collect(),
            aliases: self
                .aliases
                .into_iter()
                .map(|(k, v)| (normalize(&k), normalize(&v)))
                .collect(),
        }
    }

    pub fn weight_for(&self, source: &str) -> f64 {
        let s = normalize(source);

        if let Some(canon) = self.aliases.get(&s) {
            if let Some(&w) = self.weights.get(canon) {
                return clamp01(w);
            }
        }

        if let Some(&w) = self.weights.get(&s) {
            return clamp01(w);
        }

        // Longest key first so "hindu business line" beats "hindu".
        let mut best: Option<(&str, f64)> = None;
        for (k, &w) in &self.weights {
            if s.contains(k.as_str()) && best.map_or(true, |(bk, _)| k.len() > bk.len()) {
                best = Some((k.as_str(), w));
            }
        }
        if let Some((_, w)) = best {
            return clamp01(w);
        }

        clamp01(self.default_weight)
    }

    /// Outlets of the default feed registry plus common wire services.
    pub fn default_seed() -> Self {
        let mut weights = HashMap::new();
        let mut aliases = HashMap::new();

        for (k, v) in [
            ("the hindu", 0.90),
            ("indian express", 0.88),
            ("bbc", 0.90),
            ("reuters", 0.92),
            ("associated press", 0.90),
            ("al jazeera", 0.84),
            ("dinamani", 0.78),
            ("daily thanthi", 0.74),
            ("times of india", 0.76),
            ("hindustan times", 0.78),
            ("mint", 0.82),
            ("google news", 0.55),
        ] {
            weights.insert(k.to_string(), v);
        }

        for (a, c) in [
            ("thehindu", "the hindu"),
            ("thehindu com", "the hindu"),
            ("hindu", "the hindu"),
            ("indianexpress", "indian express"),
            ("the indian express", "indian express"),
            ("bbc news", "bbc"),
            ("bbc co uk", "bbc"),
            ("ap", "associated press"),
            ("ap news", "associated press"),
            ("dinamani com", "dinamani"),
            ("dailythanthi", "daily thanthi"),
            ("dailythanthi com", "daily thanthi"),
            ("toi", "times of india"),
            ("livemint", "mint"),
        ] {
            aliases.insert(a.to_string(), c.to_string());
        }

        Self {
            default_weight: default_default_weight(),
            weights,
            aliases,
        }
    }
}

/// Lowercase, fold separators and punctuation to spaces, collapse spaces.
fn normalize(s: &str) -> String {
    let mut out = s.trim().to_lowercase();

    for ch in ['—', '–', '-', '_', '/', '\\'] {
        out = out.replace(ch, " ");
    }

    out = out.replace(['\n', '\r', '\t', '.', ',', '’', '\''], " ");

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}
