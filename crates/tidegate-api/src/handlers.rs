//! REST API handlers.
//!
//! Handlers only read through the `Autoscaler` handle; none of them can
//! change the replica count or the audit log.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::debug;

use tidegate_core::Decision;

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

// ── Health ─────────────────────────────────────────────────────

/// GET /healthz
pub async fn healthz() -> &'static str {
    "ok"
}

// ── Audit ──────────────────────────────────────────────────────

/// GET /events
///
/// Served as a bare array so existing dashboards can consume it verbatim.
pub async fn list_events(State(state): State<ApiState>) -> Json<Vec<Decision>> {
    Json(state.scaler.events().await)
}

// ── Predictions ────────────────────────────────────────────────

/// Predict request body.
#[derive(serde::Deserialize)]
pub struct PredictRequest {
    pub rps: f64,
}

/// POST /predict
pub async fn predict(
    State(state): State<ApiState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            debug!(error = %rejection.body_text(), "rejected predict body");
            return error_response("bad json", StatusCode::BAD_REQUEST).into_response();
        }
    };

    Json(state.scaler.predict(req.rps).await).into_response()
}

// ── Status ─────────────────────────────────────────────────────

/// GET /status
pub async fn status(State(state): State<ApiState>) -> impl IntoResponse {
    ApiResponse::ok(state.scaler.status().await)
}

// ── Prometheus ─────────────────────────────────────────────────

/// GET /metrics
pub async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    let body = tidegate_metrics::render_prometheus(&state.scaler.status().await);
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}
