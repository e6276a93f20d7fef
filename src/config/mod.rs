// src/config/mod.rs
pub mod fingerprint;
pub mod settings;
pub mod store;

pub use fingerprint::SettingsFingerprint;
pub use settings::{RankingMode, SectionSettings, Settings, DEFAULT_SECTIONS};
pub use store::{load_document, resolve_path, FileSettingsStore, MemorySettingsStore, SettingsStore};
