//! HTTP routes for the token service.

use crate::handlers::{self, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

pub use crate::observability::metrics::init_metrics_recorder;

/// Build the application routes.
///
/// - `POST /api/v1/auth/token` - credentials for a token
/// - `POST /api/v1/auth/token/refresh` - token for a fresh token
/// - `POST /api/v1/auth/token/verify` - token check
/// - `/health` - liveness probe, unversioned
/// - `/metrics` - Prometheus scrape, unversioned
/// - TraceLayer for request logging and a 30 second request timeout
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let api_routes = Router::new()
        .route("/api/v1/auth/token", post(handlers::handle_obtain_token))
        .route(
            "/api/v1/auth/token/refresh",
            post(handlers::handle_refresh_token),
        )
        .route(
            "/api/v1/auth/token/verify",
            post(handlers::handle_verify_token),
        )
        .route("/health", get(handlers::health_check))
        .with_state(state);

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    api_routes.merge(metrics_routes).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(Duration::from_secs(30))),
    )
}
