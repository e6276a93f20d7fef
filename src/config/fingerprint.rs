// src/config/fingerprint.rs
use serde::Serialize;
use std::collections::BTreeSet;

/// Structural fingerprint of the settings that change fetched content.
/// Equality is field-by-field; `BTreeSet` keeps it order independent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SettingsFingerprint {
    pub disabled_sources: BTreeSet<String>,
    pub freshness_limit_hours: u32,
    pub strict_freshness: bool,
    pub enable_cache: bool,
}

impl SettingsFingerprint {
    /// Short hex digest for log lines. Not used for comparison.
    pub fn digest(&self) -> String {
        use sha2::{Digest, Sha256};
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        let digest = Sha256::digest(&canonical);
        let mut out = String::with_capacity(12);
        for b in digest.iter().take(6) {
            use std::fmt::Write as _;
            let _ = write!(&mut out, "{:02x}", b);
        }
        out
    }
}
