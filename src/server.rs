//! HTTP service exposing the recovery selector

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::RecoveryError;
use crate::history::{QueryLog, QueryRecord};
use crate::recovery::{RecoveryEngine, RecoveryResult};

/// Shared state for every request
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RecoveryEngine>,
    pub repo_path: PathBuf,
    pub history: Option<Arc<Mutex<QueryLog>>>,
}

impl AppState {
    pub fn new(engine: Arc<RecoveryEngine>, repo_path: PathBuf, history: Option<QueryLog>) -> Self {
        Self {
            engine,
            repo_path,
            history: history.map(|log| Arc::new(Mutex::new(log))),
        }
    }

    /// Append to the query log off the async workers
    async fn log(&self, record: QueryRecord) {
        let Some(history) = self.history.clone() else {
            return;
        };
        let outcome = tokio::task::spawn_blocking(move || {
            let log = history
                .lock()
                .map_err(|_| anyhow::anyhow!("query log mutex poisoned"))?;
            log.record(&record)
        })
        .await
        .unwrap_or_else(|e| Err(anyhow::anyhow!("query log task failed: {}", e)));
        if let Err(e) = outcome {
            warn!("Failed to record query: {:#}", e);
        }
    }
}

/// Body of `POST /recover/`
#[derive(Debug, Serialize, Deserialize)]
pub struct RecoverRequest {
    pub broken_code: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    model: String,
    version: &'static str,
}

#[derive(Debug, Deserialize)]
struct HistoryParams {
    limit: Option<usize>,
}

/// Error body returned for every non-200 response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<&RecoveryError> for ApiError {
    fn from(err: &RecoveryError) -> Self {
        let status = match err {
            RecoveryError::NoCandidates { .. } | RecoveryError::EmptyCandidateList => {
                StatusCode::NOT_FOUND
            }
            RecoveryError::ModelUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            RecoveryError::DegenerateEmbedding | RecoveryError::DimensionMismatch { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            RecoveryError::InvalidEmbedding(_) => StatusCode::BAD_GATEWAY,
            RecoveryError::CandidateProcessing { .. }
            | RecoveryError::RepositoryUnavailable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

/// Build the router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/recover/", post(recover))
        .route("/recover", post(recover))
        .route("/health", get(health))
        .route("/history", get(history))
        .with_state(state)
}

async fn recover(
    State(state): State<AppState>,
    request: Result<Json<RecoverRequest>, JsonRejection>,
) -> Result<Json<RecoveryResult>, ApiError> {
    let Json(request) = request.map_err(|rejection| {
        warn!("Rejected recover request: {}", rejection.body_text());
        ApiError::from(rejection)
    })?;

    match state
        .engine
        .suggest_recovery(&request.broken_code, &state.repo_path)
        .await
    {
        Ok(result) => {
            info!(
                "Suggested {} (similarity {:.3})",
                result.suggested_file, result.similarity_score
            );
            state
                .log(QueryRecord::success(&request.broken_code, &result))
                .await;
            Ok(Json(result))
        }
        Err(e) => {
            warn!("Recovery failed: {}", e);
            state
                .log(QueryRecord::failure(&request.broken_code, &e.to_string()))
                .await;
            Err(ApiError::from(&e))
        }
    }
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        model: state.engine.model_id(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<QueryRecord>>, ApiError> {
    let Some(history) = state.history.clone() else {
        return Err(ApiError {
            status: StatusCode::NOT_FOUND,
            message: "query log is disabled".to_string(),
        });
    };

    let limit = params.limit.unwrap_or(20);
    let records = tokio::task::spawn_blocking(move || {
        let log = history
            .lock()
            .map_err(|_| anyhow::anyhow!("query log mutex poisoned"))?;
        log.recent(limit)
    })
    .await
    .unwrap_or_else(|e| Err(anyhow::anyhow!("query log task failed: {}", e)))
    .map_err(|e| ApiError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: format!("{:#}", e),
    })?;

    Ok(Json(records))
}

/// Bind and serve until the process is stopped
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(
        "Serving recovery API on http://{} (repository: {}, model: {})",
        addr,
        state.repo_path.display(),
        state.engine.model_id()
    );

    axum::serve(listener, router(state))
        .await
        .context("HTTP server error")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::fs;
    use tower::ServiceExt;

    fn state(repo: PathBuf, history: Option<QueryLog>) -> AppState {
        let engine = RecoveryEngine::new(Arc::new(HashingEmbedder::new(384, 512)), "py");
        AppState::new(Arc::new(engine), repo, history)
    }

    fn post_recover(uri: &str, code: &str) -> Request<Body> {
        let body = serde_json::to_vec(&RecoverRequest {
            broken_code: code.to_string(),
        })
        .unwrap();
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body<T: serde::de::DeserializeOwned>(response: Response) -> T {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_recover_returns_contract() {
        let repo = tempfile::tempdir().unwrap();
        fs::write(repo.path().join("math_utils.py"), "def add_numbers(a, b):\n    return a + b\n").unwrap();
        fs::write(repo.path().join("string_utils.py"), "def reverse_string(s):\n    return s[::-1]\n").unwrap();

        let app = router(state(repo.path().to_path_buf(), Some(QueryLog::open_in_memory().unwrap())));
        let response = app
            .oneshot(post_recover("/recover/", "def add(a, b):\n  return a+b"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = json_body(response).await;
        assert_eq!(body["suggested_file"], "math_utils.py");
        assert!(body["similarity_score"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_empty_repository_is_not_found() {
        let repo = tempfile::tempdir().unwrap();
        let app = router(state(repo.path().to_path_buf(), None));

        let response = app.oneshot(post_recover("/recover", "x = 1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: ErrorBody = json_body(response).await;
        assert!(body.error.contains("no candidate files"));
    }

    #[tokio::test]
    async fn test_malformed_body_gets_error_json() {
        let repo = tempfile::tempdir().unwrap();
        let app = router(state(repo.path().to_path_buf(), None));

        let request = Request::builder()
            .method("POST")
            .uri("/recover/")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = json_body(response).await;
        assert!(!body.error.is_empty());

        let request = Request::builder()
            .method("POST")
            .uri("/recover")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"code": "x = 1"}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: ErrorBody = json_body(response).await;
        assert!(body.error.contains("broken_code"));
    }

    #[tokio::test]
    async fn test_requests_are_logged() {
        let repo = tempfile::tempdir().unwrap();
        fs::write(repo.path().join("a.py"), "def a(): pass").unwrap();
        let state = state(repo.path().to_path_buf(), Some(QueryLog::open_in_memory().unwrap()));
        let app = router(state.clone());

        app.clone().oneshot(post_recover("/recover/", "def a(): pass")).await.unwrap();
        app.clone().oneshot(post_recover("/recover/", "")).await.unwrap();

        let response = app
            .oneshot(Request::builder().uri("/history?limit=5").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let records: Vec<serde_json::Value> = json_body(response).await;
        assert_eq!(records.len(), 2);
        assert!(records[0]["error"].is_string());
        assert_eq!(records[1]["suggested_file"], "a.py");
    }

    #[tokio::test]
    async fn test_history_disabled() {
        let repo = tempfile::tempdir().unwrap();
        let app = router(state(repo.path().to_path_buf(), None));
        let response = app
            .oneshot(Request::builder().uri("/history").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_health_reports_model() {
        let repo = tempfile::tempdir().unwrap();
        let app = router(state(repo.path().to_path_buf(), None));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body: serde_json::Value = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["model"], "hashing-384");
    }
}
