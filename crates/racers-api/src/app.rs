//! Router assembly shared by the server binary and the API tests.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::middleware;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::metrics::{self, HttpMetrics};
use crate::routes;
use crate::state::AppState;

/// Builds the full application router.
///
/// Requests still running after `request_timeout` are answered with 408;
/// dropping the handler drops its `Ctx`, which cancels the request context.
/// Every request that matches a route is counted in `metrics`, which is also
/// served at `/metrics`.
pub fn router(state: AppState, metrics: Arc<HttpMetrics>, request_timeout: Duration) -> Router {
    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/users", routes::users::router())
        .nest("/api/v1/races", routes::races::router())
        .nest("/api/v1/teams", routes::teams::router())
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&metrics),
            metrics::track,
        ))
        .with_state(state)
        .merge(metrics::router(metrics))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
