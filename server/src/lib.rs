use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::{HeaderMap, StatusCode}, routing::{get, post}, Json, Router};
use clusterdex::dump::Member;
use clusterdex::source::load_corpus;
use clusterdex::{BuildStats, ClusterSummary, DocId, Engine, EngineConfig, Error, Hit};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer, AllowOrigin};
use tower_http::trace::TraceLayer;

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    Cluster,
    Zone,
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default)]
    pub k: Option<usize>,
    #[serde(default)]
    pub mode: SearchMode,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<Hit>,
}

#[derive(Serialize)]
pub struct ClustersResponse {
    pub clusters: Vec<ClusterSummary>,
    pub unassigned: Vec<Member>,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub corpus_dir: PathBuf,
    pub admin_token: Option<String>,
    rebuild_lock: Arc<Mutex<()>>,
}

type ApiError = (StatusCode, String);

fn api_error(err: Error) -> ApiError {
    let status = match &err {
        Error::NotBuilt => StatusCode::SERVICE_UNAVAILABLE,
        Error::EmptyCorpus | Error::InvalidDocument { .. } | Error::UnknownDocument(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::InvalidConfig(_) | Error::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

/// Router with the admin token taken from `ADMIN_TOKEN`.
pub fn build_app(corpus_dir: String, config: EngineConfig) -> Result<Router> {
    build_app_with_token(corpus_dir, config, std::env::var("ADMIN_TOKEN").ok())
}

pub fn build_app_with_token(corpus_dir: String, config: EngineConfig, admin_token: Option<String>) -> Result<Router> {
    // Load and build the corpus at startup
    let outcome = load_corpus(&corpus_dir)?;
    let engine = Engine::with_corpus(config, outcome.corpus);
    let stats = engine.build()?;
    tracing::info!(corpus = %corpus_dir, num_docs = stats.num_docs, skipped = outcome.skipped.len(), "engine ready");

    let app_state = AppState {
        engine: Arc::new(engine),
        corpus_dir: PathBuf::from(&corpus_dir),
        admin_token,
        rebuild_lock: Arc::new(Mutex::new(())),
    };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/clusters", get(clusters_handler))
        .route("/stats", get(stats_handler))
        .route("/index/rebuild", post(rebuild_handler))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);
    Ok(app)
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let snapshot = state.engine.snapshot().map_err(api_error)?;
    let results = match params.mode {
        SearchMode::Cluster => {
            let k = params.k.unwrap_or(state.engine.config().result_size).clamp(1, 100);
            snapshot.search(&params.q, k)
        }
        SearchMode::Zone => {
            let mut zones = state.engine.config().zones.clone();
            if let Some(k) = params.k {
                zones.result_size = k.clamp(1, 100);
            }
            snapshot.search_zones(&params.q, &zones)
        }
    };
    let elapsed = start.elapsed();
    Ok(Json(SearchResponse { query: params.q, took_s: elapsed.as_secs_f64(), total_hits: results.len(), results }))
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<DocId>) -> Result<Json<serde_json::Value>, ApiError> {
    let snapshot = state.engine.snapshot().map_err(api_error)?;
    match snapshot.title(doc_id) {
        Some(title) => Ok(Json(serde_json::json!({
            "doc_id": doc_id,
            "title": title,
            "leader": snapshot.clusters().leader_of(doc_id),
        }))),
        None => Err((StatusCode::NOT_FOUND, "not found".into())),
    }
}

pub async fn clusters_handler(State(state): State<AppState>) -> Result<Json<ClustersResponse>, ApiError> {
    let snapshot = state.engine.snapshot().map_err(api_error)?;
    let report = snapshot.report();
    Ok(Json(ClustersResponse { clusters: report.summaries(), unassigned: report.unassigned() }))
}

pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<BuildStats>, ApiError> {
    let snapshot = state.engine.snapshot().map_err(api_error)?;
    Ok(Json(snapshot.stats().clone()))
}

// --- Admin endpoints ---
async fn rebuild_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<BuildStats>, ApiError> {
    authorize(&state, &headers)?;
    let task_state = state.clone();
    let stats = tokio::task::spawn_blocking(move || {
        // one rebuild at a time; queries keep reading the previous snapshot
        let _guard = task_state.rebuild_lock.lock();
        let outcome = load_corpus(&task_state.corpus_dir)?;
        // the loaded corpus only replaces the current one if it builds
        task_state.engine.build_corpus(outcome.corpus)
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
    .map_err(api_error)?;
    tracing::info!(num_docs = stats.num_docs, "rebuild complete");
    Ok(Json(stats))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
