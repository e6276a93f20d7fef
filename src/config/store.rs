// src/config/store.rs
//! Settings stores plus the shared TOML/JSON document loader.

use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use super::settings::Settings;
use crate::error::{BriefError, Result};

pub const ENV_SETTINGS_PATH: &str = "DAILY_BRIEF_SETTINGS_PATH";

/// Read-only view of the persisted user configuration.
/// `None` means the configuration is unavailable right now.
pub trait SettingsStore: Send + Sync {
    fn load(&self) -> Option<Settings>;
}

/// Load a document from an explicit path. Supports TOML or JSON.
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_document(&content, ext.as_str())
}

fn parse_document<T: DeserializeOwned>(s: &str, hint_ext: &str) -> Result<T> {
    match hint_ext {
        "toml" => return Ok(toml::from_str(s)?),
        "json" => return Ok(serde_json::from_str(s)?),
        _ => {}
    }
    // Unknown extension: JSON first (a TOML parser would accept less), then TOML.
    if let Ok(v) = serde_json::from_str(s) {
        return Ok(v);
    }
    toml::from_str(s).map_err(|e| BriefError::config(format!("unsupported document format: {e}")))
}

/// Resolve a config path:
/// 1) `$env_var` (must exist)
/// 2) each fallback in order
pub fn resolve_path(env_var: &str, fallbacks: &[&str]) -> Result<Option<PathBuf>> {
    if let Ok(p) = std::env::var(env_var) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return Ok(Some(pb));
        }
        return Err(BriefError::config(format!(
            "{env_var} points to non-existent path {}",
            pb.display()
        )));
    }
    Ok(fallbacks
        .iter()
        .map(PathBuf::from)
        .find(|candidate| candidate.exists()))
}

/// File-backed store. Re-reads the file on every `load`, so edits made by
/// the settings UI are picked up by the next evaluation.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$DAILY_BRIEF_SETTINGS_PATH`, then `config/settings.toml`, then
    /// `config/settings.json`.
    pub fn from_default_locations() -> Result<Self> {
        let path = resolve_path(
            ENV_SETTINGS_PATH,
            &["config/settings.toml", "config/settings.json"],
        )?
        .ok_or_else(|| BriefError::config("no settings file found"))?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> Option<Settings> {
        match load_document::<Settings>(&self.path) {
            Ok(s) => Some(s),
            Err(e) => {
                tracing::warn!(target: "config", path = %self.path.display(), error = %e, "settings unavailable");
                None
            }
        }
    }
}

/// In-memory store for embedding and tests.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    inner: RwLock<Option<Settings>>,
}

impl MemorySettingsStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: RwLock::new(Some(settings)),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn set(&self, settings: Settings) {
        if let Ok(mut g) = self.inner.write() {
            *g = Some(settings);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut g) = self.inner.write() {
            *g = None;
        }
    }

    /// Apply an in-place edit, as a settings form would.
    pub fn update(&self, f: impl FnOnce(&mut Settings)) {
        if let Ok(mut g) = self.inner.write() {
            if let Some(s) = g.as_mut() {
                f(s);
            }
        }
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Option<Settings> {
        self.inner.read().ok().and_then(|g| g.clone())
    }
}
