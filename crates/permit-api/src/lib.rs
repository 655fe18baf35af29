//! # permit-api — Axum API for the Permit Workflow Stack
//!
//! HTTP binding over the core workflow: AHJ resolution, jurisdiction
//! packs, pre-check, packaging, and mocked portal submission.
//!
//! ## API Surface
//!
//! | Prefix                   | Module                      | Domain              |
//! |--------------------------|-----------------------------|---------------------|
//! | `/v1/auth/*`             | [`auth`]                    | Magic-link sign-in  |
//! | `/v1/orgs/*`             | [`routes::orgs`]            | Organizations       |
//! | `/v1/projects/*`         | [`routes::projects`]        | Projects + AHJ      |
//! | `/v1/cases/*`            | [`routes::cases`]           | Permit cases        |
//! | `/v1/jurisdictions/*`    | [`routes::jurisdictions`]   | Pack catalog        |
//! | `/openapi.json`          | [`openapi`]                 | OpenAPI 3 document  |
//! | `/health`, `/metrics`    | (this module)               | Probes              |
//!
//! ## Middleware stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthMiddleware (protected routes) → Handler
//! ```
//!
//! Health, metrics, OpenAPI, and the auth endpoints are mounted outside
//! the auth middleware so they stay reachable without credentials.

pub mod auth;
pub mod error;
pub mod jobs;
pub mod metrics;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router.
pub fn app(state: AppState) -> Router {
    let protected = Router::new()
        .merge(routes::orgs::router())
        .merge(routes::projects::router())
        .merge(routes::cases::router())
        .merge(routes::jurisdictions::router())
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    let public = Router::new()
        .merge(auth::router())
        .merge(openapi::router())
        .route("/health", get(health))
        .route("/metrics", get(render_metrics));

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(axum::middleware::from_fn(metrics::metrics_middleware))
        .layer(Extension(state.metrics.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health — liveness probe.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /metrics — Prometheus text exposition.
async fn render_metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
