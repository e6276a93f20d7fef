// src/error.rs
//! Error taxonomy for the aggregation engine.
//!
//! Only `ConfigurationUnavailable` aborts a refresh cycle. `AdapterFetch` is
//! recorded in the published error map and the cycle carries on.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BriefError>;

#[derive(Error, Debug)]
pub enum BriefError {
    /// One section (or every feed behind it) failed to fetch or parse.
    #[error("fetch failed for section `{section}`: {message}")]
    AdapterFetch { section: String, message: String },

    /// The settings store returned nothing; the cycle is skipped.
    #[error("configuration unavailable")]
    ConfigurationUnavailable,

    /// Settings or feed registry file could not be interpreted.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl BriefError {
    pub fn adapter_fetch(section: impl Into<String>, err: &anyhow::Error) -> Self {
        Self::AdapterFetch {
            section: section.into(),
            message: format!("{err:#}"),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
