// src/feed.rs
//! Published, read-only feed state plus the update stream consumers
//! subscribe to.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

use crate::article::Article;

const UPDATE_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSnapshot {
    pub sections: BTreeMap<String, Vec<Article>>,
    pub breaking_news: Vec<Article>,
    pub loading: bool,
    pub errors: BTreeMap<String, String>,
    pub last_fetch: Option<DateTime<Utc>>,
}

impl FeedSnapshot {
    pub fn section(&self, key: &str) -> &[Article] {
        self.sections.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn article_count(&self) -> usize {
        self.sections.values().map(Vec::len).sum()
    }
}

/// Shared handle to the published state. Cloning is cheap; all clones see
/// the same snapshot.
#[derive(Clone)]
pub struct FeedHandle {
    state: Arc<RwLock<FeedSnapshot>>,
    updates: broadcast::Sender<Arc<FeedSnapshot>>,
}

impl Default for FeedHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedHandle {
    pub fn new() -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(RwLock::new(FeedSnapshot::default())),
            updates,
        }
    }

    /// Current state (a copy).
    pub fn snapshot(&self) -> FeedSnapshot {
        self.state
            .read()
            .map(|g| g.clone())
            .unwrap_or_default()
    }

    /// Every publish after this call is delivered in order.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<FeedSnapshot>> {
        self.updates.subscribe()
    }

    /// Apply `f` under the write lock and broadcast the result. One call is
    /// one atomic publish; nothing else can interleave with it.
    pub(crate) fn publish(&self, f: impl FnOnce(&mut FeedSnapshot)) {
        let published = {
            let Ok(mut guard) = self.state.write() else {
                tracing::error!(target: "engine", "feed state lock poisoned; publish dropped");
                return;
            };
            f(&mut guard);
            Arc::new(guard.clone())
        };
        // No receivers is fine: nobody is watching.
        let _ = self.updates.send(published);
    }
}
