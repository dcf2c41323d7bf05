#![forbid(unsafe_code)]
//! HTTP surface for the funnel: submission, resolution, health.
//!
//! Handlers are thin: parse the request, run the blocking funnel call on
//! the blocking pool, map the closed error kinds onto HTTP statuses.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use backlot_funnel::{Funnel, ResolveError, SubmitError, ViewState};
use backlot_model::{LeadId, LeadSubmission};
use backlot_store::{LeadStore as _, StoreError, StoreErrorKind};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

pub const CRATE_NAME: &str = "backlot-server";

#[derive(Clone)]
pub struct AppState {
    pub funnel: Arc<Funnel>,
    request_id_seed: Arc<AtomicU64>,
}

impl AppState {
    #[must_use]
    pub fn new(funnel: Arc<Funnel>) -> Self {
        Self {
            funnel,
            request_id_seed: Arc::new(AtomicU64::new(1)),
        }
    }

    fn next_request_id(&self) -> String {
        format!("req-{}", self.request_id_seed.fetch_add(1, Ordering::Relaxed))
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz_handler))
        .route("/readyz", get(readyz_handler))
        .route("/api/leads", post(submit_handler))
        .route("/api/analysis", get(analysis_handler))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct ApiError {
    code: &'static str,
    message: String,
    request_id: String,
}

fn api_error_response(status: StatusCode, err: ApiError) -> Response {
    (status, Json(json!({ "error": err }))).into_response()
}

fn store_error_status(kind: StoreErrorKind) -> StatusCode {
    match kind {
        StoreErrorKind::Connectivity => StatusCode::SERVICE_UNAVAILABLE,
        StoreErrorKind::NotFound => StatusCode::NOT_FOUND,
        StoreErrorKind::Validation => StatusCode::BAD_REQUEST,
        StoreErrorKind::Parse => StatusCode::BAD_GATEWAY,
        StoreErrorKind::Permission | StoreErrorKind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn store_error_response(err: &StoreError, request_id: String) -> Response {
    api_error_response(
        store_error_status(err.kind),
        ApiError {
            code: err.kind.as_str(),
            message: err.message.clone(),
            request_id,
        },
    )
}

fn join_error_response(request_id: String) -> Response {
    api_error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        ApiError {
            code: "internal_error",
            message: "worker task failed".to_string(),
            request_id,
        },
    )
}

async fn healthz_handler() -> Response {
    (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response()
}

async fn readyz_handler(State(state): State<AppState>) -> Response {
    let request_id = state.next_request_id();
    let funnel = Arc::clone(&state.funnel);
    let probe = tokio::task::spawn_blocking(move || funnel.store().check_connectivity()).await;
    match probe {
        Ok(Ok(())) => (StatusCode::OK, Json(json!({ "status": "ready" }))).into_response(),
        Ok(Err(err)) => {
            info!(request_id = %request_id, error = %err, "readiness probe failed");
            api_error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                ApiError {
                    code: err.kind.as_str(),
                    message: err.message,
                    request_id,
                },
            )
        }
        Err(_) => join_error_response(request_id),
    }
}

async fn submit_handler(
    State(state): State<AppState>,
    Json(form): Json<LeadSubmission>,
) -> Response {
    let request_id = state.next_request_id();
    info!(request_id = %request_id, route = "/api/leads", "request start");
    let funnel = Arc::clone(&state.funnel);
    let outcome = tokio::task::spawn_blocking(move || funnel.submit(&form)).await;
    match outcome {
        Ok(Ok(receipt)) => (StatusCode::CREATED, Json(receipt)).into_response(),
        Ok(Err(SubmitError::Validation(err))) => api_error_response(
            StatusCode::BAD_REQUEST,
            ApiError {
                code: "validation_error",
                message: err.to_string(),
                request_id,
            },
        ),
        Ok(Err(SubmitError::Store(err))) => store_error_response(&err, request_id),
        Ok(Err(_)) => join_error_response(request_id),
        Err(_) => join_error_response(request_id),
    }
}

fn bool_query_flag(params: &HashMap<String, String>, name: &str) -> bool {
    params
        .get(name)
        .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "yes"))
        .unwrap_or(false)
}

async fn analysis_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let request_id = state.next_request_id();
    info!(request_id = %request_id, route = "/api/analysis", "request start");

    // A malformed identifier is treated as absent so the fallback chain
    // still gets its chance.
    let id = params
        .get("id")
        .and_then(|raw| LeadId::parse(raw).ok());
    let skip_loading = bool_query_flag(&params, "skip_loading");

    let funnel = Arc::clone(&state.funnel);
    let outcome = tokio::task::spawn_blocking(move || {
        if skip_loading {
            if let Some(preview) = funnel.mirror_preview() {
                return Ok(preview);
            }
        }
        funnel.resolve(id)
    })
    .await;

    match outcome {
        Ok(Ok(resolution)) => {
            let state_name = ViewState::from_resolution(resolution.clone()).as_str();
            (
                StatusCode::OK,
                Json(json!({
                    "state": state_name,
                    "source": resolution.source.as_str(),
                    "record": resolution.record,
                })),
            )
                .into_response()
        }
        Ok(Err(ResolveError::NoIdentifier)) => api_error_response(
            StatusCode::NOT_FOUND,
            ApiError {
                code: "no_submission_id",
                message: ResolveError::NoIdentifier.to_string(),
                request_id,
            },
        ),
        Ok(Err(ResolveError::Exhausted { server })) => store_error_response(&server, request_id),
        Ok(Err(_)) => join_error_response(request_id),
        Err(_) => join_error_response(request_id),
    }
}
