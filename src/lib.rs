// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod article;
pub mod classify;
pub mod clock;
pub mod config;
pub mod error;
pub mod export;
pub mod feed;
pub mod metrics;
pub mod source_weights;
pub mod summarize;

// Ingest: adapter seam, RSS parsing, transports, cache
pub mod ingest;

// Ranking
pub mod scoring;

// Orchestration
pub mod change_detector;
pub mod engine;
pub mod scheduler;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::article::Article;
pub use crate::change_detector::ChangeMonitor;
pub use crate::engine::AggregationEngine;
pub use crate::error::BriefError;
pub use crate::feed::{FeedHandle, FeedSnapshot};
pub use crate::scheduler::{Scheduler, SchedulerConfig, SchedulerHandle};
