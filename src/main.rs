//! Daily Brief service entrypoint.
//! Wires settings, feed registry, the cached RSS adapter, the aggregation
//! engine and its scheduler, then serves the read-only API.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use daily_brief::api::{self, AppState};
use daily_brief::config::FileSettingsStore;
use daily_brief::engine::AggregationEngine;
use daily_brief::export::{spawn_exporter, ENV_EXPORT_PATH};
use daily_brief::feed::FeedHandle;
use daily_brief::ingest::{load_feeds_default, CachedAdapter, HttpTransport, RssSectionAdapter};
use daily_brief::metrics::Metrics;
use daily_brief::scheduler::{Scheduler, SchedulerConfig};
use daily_brief::source_weights::SourceWeightsConfig;
use daily_brief::summarize::{summarizer_from_env, Summarizer};

const DEFAULT_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_SOURCE_WEIGHTS_PATH: &str = "config/source_weights.json";
const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Compact logs by default, JSON lines when `DAILY_BRIEF_LOG_JSON=1`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(
            "daily_brief=info,engine=info,ingest=info,monitor=info,scheduler=info,export=info,config=info,warn",
        )
    });
    let json = std::env::var("DAILY_BRIEF_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let sched_cfg = SchedulerConfig::from_env();
    let metrics = match Metrics::init(&sched_cfg) {
        Ok(m) => Some(m),
        Err(e) => {
            tracing::warn!(error = %e, "metrics disabled");
            None
        }
    };

    let settings = Arc::new(FileSettingsStore::from_default_locations().context("settings")?);
    tracing::info!(path = %settings.path().display(), "settings store");

    let feeds = load_feeds_default().context("feed registry")?;
    tracing::info!(feeds = feeds.len(), "feed registry loaded");

    let weights_path = std::env::var("DAILY_BRIEF_SOURCE_WEIGHTS_PATH")
        .unwrap_or_else(|_| DEFAULT_SOURCE_WEIGHTS_PATH.to_string());
    let weights = SourceWeightsConfig::load_from_file(&weights_path);

    let transport = HttpTransport::new(HTTP_TIMEOUT)?;
    let adapter = Arc::new(CachedAdapter::new(
        RssSectionAdapter::new(feeds, transport),
        Duration::from_secs(300),
    ));

    let feed = FeedHandle::new();
    let engine = Arc::new(
        AggregationEngine::new(settings, adapter, feed.clone()).with_weights(weights.clone()),
    );

    let exporter = match std::env::var(ENV_EXPORT_PATH) {
        Ok(p) => {
            let summarizer: Option<Arc<dyn Summarizer>> = match summarizer_from_env() {
                Ok(Some(s)) => {
                    tracing::info!(provider = s.name(), "section summaries enabled");
                    Some(Arc::new(s))
                }
                Ok(None) => {
                    tracing::info!("no summary API key; section summaries disabled");
                    None
                }
                Err(e) => {
                    tracing::warn!(error = %e, "section summaries disabled");
                    None
                }
            };
            Some(spawn_exporter(&feed, PathBuf::from(p), summarizer))
        }
        Err(_) => None,
    };

    let scheduler = Scheduler::start(engine, sched_cfg);

    let mut state = AppState::new(feed).with_weights(Arc::new(weights));
    if let Some(m) = &metrics {
        state = state.with_metrics(m.handle.clone());
    }
    let app = api::router(state);

    let addr: SocketAddr = std::env::var("DAILY_BRIEF_ADDR")
        .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
        .parse()
        .context("DAILY_BRIEF_ADDR")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    tracing::info!(%addr, "serving");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("ctrl-c received, shutting down");
        })
        .await
        .context("http server")?;

    scheduler.shutdown().await;
    if let Some(task) = exporter {
        task.abort();
    }
    tracing::info!("bye");
    Ok(())
}
