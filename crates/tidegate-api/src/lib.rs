//! tidegate-api — HTTP surface for the tidegate controller.
//!
//! Exposes the audit log, the what-if predictor and the controller status.
//! Every response carries CORS headers so a browser dashboard on another
//! origin can read them.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/healthz` | Liveness probe |
//! | GET | `/events` | Audit log, oldest first |
//! | POST | `/predict` | What-if decision for `{ "rps": n }` |
//! | GET | `/status` | Controller status |
//! | GET | `/metrics` | Prometheus exposition |

pub mod cors;
pub mod handlers;

use axum::Router;
use axum::http::HeaderValue;
use axum::middleware;
use axum::routing::{get, post};
use tidegate_autoscale::Autoscaler;

pub use cors::CorsPolicy;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub scaler: Autoscaler,
}

/// Build the complete API router with an explicit CORS origin.
pub fn build_router(scaler: Autoscaler, allow_origin: HeaderValue) -> Router {
    let state = ApiState { scaler };

    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/events", get(handlers::list_events))
        .route("/predict", post(handlers::predict))
        .route("/status", get(handlers::status))
        .route("/metrics", get(handlers::prometheus_metrics))
        .with_state(state)
        .layer(middleware::from_fn_with_state(
            CorsPolicy::new(allow_origin),
            cors::apply,
        ))
}
