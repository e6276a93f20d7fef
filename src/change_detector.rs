//! Watches the content-affecting settings fingerprint. A change clears the
//! adapter cache and forces an out-of-schedule full refresh.

use metrics::counter;

use crate::config::{Settings, SettingsFingerprint};
use crate::engine::AggregationEngine;

#[derive(Debug, Default)]
pub struct ChangeMonitor {
    last: Option<SettingsFingerprint>,
}

impl ChangeMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last recorded fingerprint, if any evaluation has happened.
    pub fn last(&self) -> Option<&SettingsFingerprint> {
        self.last.as_ref()
    }

    /// Record the current fingerprint. The first call only records; later
    /// calls return true exactly when the fingerprint changed.
    pub fn evaluate(&mut self, settings: &Settings) -> bool {
        let current = settings.fingerprint();
        let changed = match &self.last {
            None => false,
            Some(prev) => *prev != current,
        };
        if changed || self.last.is_none() {
            tracing::debug!(target: "monitor", digest = %current.digest(), changed, "fingerprint recorded");
            self.last = Some(current);
        }
        changed
    }

    /// Load settings through the engine's store and react to a change.
    /// Returns whether a refresh was triggered. Missing settings are a no-op.
    pub async fn check(&mut self, engine: &AggregationEngine) -> bool {
        let Some(settings) = engine.settings_store().load() else {
            tracing::debug!(target: "monitor", "settings unavailable; skipping check");
            return false;
        };
        if !self.evaluate(&settings) {
            tracing::trace!(target: "monitor", "no change");
            return false;
        }

        tracing::info!(target: "monitor", "content settings changed; clearing cache and refreshing");
        counter!("brief_settings_changes_total").increment(1);
        engine.adapter().clear_cache();
        engine.refresh(None).await;
        true
    }
}
