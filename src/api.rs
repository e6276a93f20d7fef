use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::CorsLayer;

use crate::article::Article;
use crate::feed::{FeedHandle, FeedSnapshot};
use crate::source_weights::SourceWeightsConfig;

/// Read-only view over the published feed. Handlers never mutate state.
#[derive(Clone)]
pub struct AppState {
    pub feed: FeedHandle,
    pub weights: Arc<SourceWeightsConfig>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(feed: FeedHandle) -> Self {
        Self {
            feed,
            weights: Arc::new(SourceWeightsConfig::default_seed()),
            metrics: None,
        }
    }

    pub fn with_weights(mut self, weights: Arc<SourceWeightsConfig>) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/feed", get(feed))
        .route("/sections/{key}", get(section))
        .route("/breaking", get(breaking))
        .route("/metrics", get(metrics))
        .route("/debug/source-weight", get(debug_source_weight))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn feed(State(state): State<AppState>) -> Json<FeedSnapshot> {
    Json(state.feed.snapshot())
}

#[derive(serde::Serialize)]
struct SectionOut {
    section: String,
    loading: bool,
    error: Option<String>,
    articles: Vec<Article>,
}

async fn section(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    let mut snap = state.feed.snapshot();
    let Some(articles) = snap.sections.remove(&key) else {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": format!("unknown section '{key}'") })),
        )
            .into_response();
    };
    Json(SectionOut {
        error: snap.errors.remove(&key),
        section: key,
        loading: snap.loading,
        articles,
    })
    .into_response()
}

async fn breaking(State(state): State<AppState>) -> Json<Vec<Article>> {
    Json(state.feed.snapshot().breaking_news)
}

async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(h) => h.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}

async fn debug_source_weight(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> String {
    let s = q.get("source").cloned().unwrap_or_default();
    format!("source='{}' -> weight={:.2}", s, state.weights.weight_for(&s))
}
