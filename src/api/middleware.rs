//! Access logging middleware.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};

use crate::metrics;
use crate::telemetry::AccessLogger;

const UNMATCHED_ROUTE: &str = "unmatched";

/// Emit one access event per request once the response has been produced.
///
/// The event is queued without waiting, so a slow or failing sink never
/// delays the response.
pub async fn access_log_middleware(
    State(access_log): State<AccessLogger>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();

    let method = request.method().to_string();
    let path = request
        .uri()
        .path_and_query()
        .map_or_else(|| request.uri().path().to_string(), |pq| pq.as_str().to_string());
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| UNMATCHED_ROUTE.to_string(), |p| p.as_str().to_string());

    let response = next.run(request).await;
    let status = response.status();

    access_log.record(&method, remote_addr, &path, status.as_u16());
    metrics::record_http_request(start, &route, &method, status);

    response
}
