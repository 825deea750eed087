//! VenueKB HTTP REST API
//!
//! Axum-based HTTP server exposing extraction, onboarding, review and
//! readiness over HTTP. Runs alongside the Unix socket IPC server on port
//! 8766 (configurable).
//!
//! Each endpoint is a thin axum handler delegating to an inner function that
//! returns `(StatusCode, Value)`; the inner functions are tested directly.
//!
//! Endpoints:
//! - GET  /health            : DB status, entry count, model backend
//! - GET  /version           : server version info
//! - POST /extract           : one pass over one transcript
//! - POST /extract/all       : every pass over one transcript
//! - POST /onboarding        : generate entries from onboarding answers
//! - GET  /review/:venue_id  : entries held for review
//! - POST /review            : approve or reject a held entry
//! - POST /progress          : readiness score for a venue

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use uuid::Uuid;
use venuekb_core::ipc::KbRequest;
use venuekb_core::{OnboardingAnswer, ReviewDecision, Section, SectionState, StoreError};
use venuekb_ingest::IngestError;

use crate::AppState;

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .route("/extract", post(extract_handler))
        .route("/extract/all", post(extract_all_handler))
        .route("/onboarding", post(onboarding_handler))
        .route("/review/:venue_id", get(pending_handler))
        .route("/review", post(review_handler))
        .route("/progress", post(progress_handler))
        .with_state(state)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    state: AppState,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = format!("{}:{}", state.config.http.host, state.config.http.port);
    let app = build_router(Arc::new(state));
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("VenueKB HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Request DTOs
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct ExtractRequest {
    pub venue_id: Option<Uuid>,
    pub transcript: Option<String>,
    pub pass: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ExtractAllRequest {
    pub venue_id: Option<Uuid>,
    pub transcript: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct OnboardingRequest {
    pub venue_id: Option<Uuid>,
    #[serde(default)]
    pub answers: Vec<OnboardingAnswer>,
    #[serde(default)]
    pub replace_existing: bool,
}

#[derive(Debug, Deserialize, Default)]
pub struct ReviewRequest {
    pub id: Option<Uuid>,
    pub decision: Option<ReviewDecision>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ProgressRequest {
    pub venue_id: Option<Uuid>,
    #[serde(default)]
    pub sections: HashMap<Section, SectionState>,
}

type HttpResult = (StatusCode, serde_json::Value);

// ============================================================================
// Inner (directly testable) functions
// ============================================================================

pub async fn health_inner(state: &AppState) -> HttpResult {
    match crate::router::dispatch(KbRequest::Health, state).await {
        Ok(mut data) => {
            if let Some(obj) = data.as_object_mut() {
                obj.insert("version".to_string(), serde_json::json!(env!("CARGO_PKG_VERSION")));
                obj.insert(
                    "socket".to_string(),
                    serde_json::json!(state.config.service.socket_path),
                );
            }
            (StatusCode::OK, data)
        }
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            serde_json::json!({
                "status": "unhealthy",
                "error": e.to_string(),
            }),
        ),
    }
}

/// Pure, no IO.
pub fn version_inner() -> serde_json::Value {
    serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "protocol": "venuekb/1",
    })
}

pub async fn extract_inner(state: &AppState, req: ExtractRequest) -> HttpResult {
    let request = match (
        required(req.venue_id, "venue_id"),
        required(req.transcript, "transcript"),
        required(req.pass, "pass"),
    ) {
        (Ok(venue_id), Ok(transcript), Ok(pass)) => KbRequest::Extract {
            venue_id,
            transcript,
            pass,
        },
        (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => return e,
    };
    run(state, request).await
}

pub async fn extract_all_inner(state: &AppState, req: ExtractAllRequest) -> HttpResult {
    let request = match (
        required(req.venue_id, "venue_id"),
        required(req.transcript, "transcript"),
    ) {
        (Ok(venue_id), Ok(transcript)) => KbRequest::ExtractAll {
            venue_id,
            transcript,
        },
        (Err(e), _) | (_, Err(e)) => return e,
    };
    run(state, request).await
}

pub async fn onboarding_inner(state: &AppState, req: OnboardingRequest) -> HttpResult {
    let venue_id = match required(req.venue_id, "venue_id") {
        Ok(v) => v,
        Err(e) => return e,
    };
    run(
        state,
        KbRequest::Onboarding {
            venue_id,
            answers: req.answers,
            replace_existing: req.replace_existing,
        },
    )
    .await
}

pub async fn pending_inner(state: &AppState, venue_id: Uuid) -> HttpResult {
    run(state, KbRequest::Pending { venue_id }).await
}

pub async fn review_inner(state: &AppState, req: ReviewRequest) -> HttpResult {
    let request = match (required(req.id, "id"), required(req.decision, "decision")) {
        (Ok(id), Ok(decision)) => KbRequest::Review { id, decision },
        (Err(e), _) | (_, Err(e)) => return e,
    };
    run(state, request).await
}

pub async fn progress_inner(state: &AppState, req: ProgressRequest) -> HttpResult {
    let venue_id = match required(req.venue_id, "venue_id") {
        Ok(v) => v,
        Err(e) => return e,
    };
    run(
        state,
        KbRequest::Progress {
            venue_id,
            sections: req.sections,
        },
    )
    .await
}

// ============================================================================
// Axum handler wrappers (thin: delegate to inner functions)
// ============================================================================

pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (status, body) = health_inner(&state).await;
    (status, Json(body))
}

pub async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(version_inner()))
}

pub async fn extract_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExtractRequest>,
) -> impl IntoResponse {
    let (status, body) = extract_inner(&state, req).await;
    (status, Json(body))
}

pub async fn extract_all_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExtractAllRequest>,
) -> impl IntoResponse {
    let (status, body) = extract_all_inner(&state, req).await;
    (status, Json(body))
}

pub async fn onboarding_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OnboardingRequest>,
) -> impl IntoResponse {
    let (status, body) = onboarding_inner(&state, req).await;
    (status, Json(body))
}

pub async fn pending_handler(
    State(state): State<Arc<AppState>>,
    Path(venue_id): Path<Uuid>,
) -> impl IntoResponse {
    let (status, body) = pending_inner(&state, venue_id).await;
    (status, Json(body))
}

pub async fn review_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReviewRequest>,
) -> impl IntoResponse {
    let (status, body) = review_inner(&state, req).await;
    (status, Json(body))
}

pub async fn progress_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProgressRequest>,
) -> impl IntoResponse {
    let (status, body) = progress_inner(&state, req).await;
    (status, Json(body))
}

// ============================================================================
// Helpers
// ============================================================================

async fn run(state: &AppState, request: KbRequest) -> HttpResult {
    match crate::router::dispatch(request, state).await {
        Ok(data) => (StatusCode::OK, data),
        Err(e) => error_response(status_for(&e), e.to_string()),
    }
}

fn required<T>(value: Option<T>, field: &str) -> std::result::Result<T, HttpResult> {
    value.ok_or_else(|| {
        error_response(StatusCode::BAD_REQUEST, format!("{} field is required", field))
    })
}

fn error_response(status: StatusCode, msg: String) -> HttpResult {
    (
        status,
        serde_json::json!({
            "error": msg,
            "status": "error",
        }),
    )
}

pub fn status_for(err: &IngestError) -> StatusCode {
    match err {
        e if e.is_validation() => StatusCode::BAD_REQUEST,
        IngestError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
        IngestError::NotPending(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_inner_fields() {
        let v = version_inner();
        assert_eq!(v["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(v["protocol"], "venuekb/1");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&IngestError::UnknownPass("tour".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&IngestError::Validation("venue_id is required".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&IngestError::Store(StoreError::NotFound(Uuid::nil()))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&IngestError::NotPending(Uuid::nil())),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_required_reports_field_name() {
        let (status, body) = required::<Uuid>(None, "venue_id").unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "venue_id field is required");
        assert_eq!(body["status"], "error");
    }
}
