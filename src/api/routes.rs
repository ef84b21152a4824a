//! HTTP API route definitions.

use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::config::Config;

use super::handlers::{all_records, metrics_export, search, server_time, table_status, AppState};
use super::middleware::access_log_middleware;

/// Create the API router.
///
/// Dataset routes live under `/<route_prefix>`; every request, matched or not,
/// passes through the access log middleware.
pub fn create_router(state: AppState, config: &Config) -> Router {
    let dataset = Router::new()
        .route("/server", get(server_time))
        .route("/status", get(table_status))
        .route("/all", get(all_records))
        .route("/search", get(search));

    let mut router = Router::new().nest(&format!("/{}", config.route_prefix), dataset);

    if config.metrics_enabled {
        router = router.route("/metrics", get(metrics_export));
    }

    router
        .layer(middleware::from_fn_with_state(
            state.access_log.clone(),
            access_log_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
