//! JSON export of completed snapshots for static consumers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::article::Article;
use crate::error::Result;
use crate::feed::{FeedHandle, FeedSnapshot};
use crate::summarize::{summarize_sections, Summarizer};

pub const ENV_EXPORT_PATH: &str = "DAILY_BRIEF_EXPORT_PATH";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportDoc<'a> {
    last_updated: Option<DateTime<Utc>>,
    sections: &'a BTreeMap<String, Vec<Article>>,
    breaking_news: &'a [Article],
    errors: &'a BTreeMap<String, String>,
    #[serde(skip_serializing_if = "no_summaries")]
    summaries: &'a BTreeMap<String, String>,
}

fn no_summaries(m: &&BTreeMap<String, String>) -> bool {
    m.is_empty()
}

impl<'a> ExportDoc<'a> {
    fn new(s: &'a FeedSnapshot, summaries: &'a BTreeMap<String, String>) -> Self {
        Self {
            last_updated: s.last_fetch,
            sections: &s.sections,
            breaking_news: &s.breaking_news,
            errors: &s.errors,
            summaries,
        }
    }
}

/// Write `snapshot` as pretty JSON, with per-section `summaries` when any
/// exist. Goes through a sibling temp file and a rename so readers never
/// see a partial document.
pub async fn write_snapshot(
    path: &Path,
    snapshot: &FeedSnapshot,
    summaries: &BTreeMap<String, String>,
) -> Result<()> {
    let body = serde_json::to_vec_pretty(&ExportDoc::new(snapshot, summaries))?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).await?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, body).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

/// Summarize (when a summarizer is given) and write one snapshot.
pub async fn export_snapshot(
    path: &Path,
    snapshot: &FeedSnapshot,
    summarizer: Option<&dyn Summarizer>,
) -> Result<()> {
    let summaries = match summarizer {
        Some(s) => summarize_sections(s, snapshot).await,
        None => BTreeMap::new(),
    };
    write_snapshot(path, snapshot, &summaries).await
}

/// Write every completed (non-loading) snapshot to `path`. Ends when the
/// feed handle is gone.
pub fn spawn_exporter(
    feed: &FeedHandle,
    path: PathBuf,
    summarizer: Option<Arc<dyn Summarizer>>,
) -> JoinHandle<()> {
    let mut rx = feed.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(snapshot) if snapshot.loading => continue,
                Ok(snapshot) => match export_snapshot(&path, &snapshot, summarizer.as_deref()).await {
                    Ok(()) => tracing::info!(
                        target: "export",
                        path = %path.display(),
                        articles = snapshot.article_count(),
                        "snapshot exported"
                    ),
                    Err(e) => tracing::warn!(target: "export", path = %path.display(), error = %e, "export failed"),
                },
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(target: "export", skipped, "exporter lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
