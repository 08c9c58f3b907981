//! Structured access logging.

use std::net::SocketAddr;
use std::time::Instant;

use axum::extract::{ConnectInfo, Request};
use axum::http::header::USER_AGENT;
use axum::middleware::Next;
use axum::response::Response;

use crate::context::RequestContext;
use crate::http::request::{client_ip, X_REQUEST_ID};
use crate::http::response::HandlerError;
use crate::observability::metrics;

/// Emits one "Request done" record per request once the inner chain has
/// produced a response.
pub async fn access_log_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();

    let uri = req.uri().to_string();
    let method = req.method().clone();
    let request_id = header_str(&req, X_REQUEST_ID);
    let user_agent = header_str(&req, USER_AGENT.as_str());
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let remote_ip = client_ip(req.headers(), peer);

    let response = next.run(req).await;

    let latency = start.elapsed();
    let status = response.status().as_u16();
    let error = response
        .extensions()
        .get::<HandlerError>()
        .map(|HandlerError(msg)| msg.as_str());
    let correlation_id = response
        .extensions()
        .get::<RequestContext>()
        .and_then(RequestContext::stored_correlation_id);

    tracing::info!(
        URI = %uri,
        request_id = %request_id,
        remote_ip = %remote_ip,
        user_agent = %user_agent,
        status,
        method = %method,
        duration = ?latency,
        correlation_id = correlation_id,
        error = error,
        "Request done"
    );
    metrics::record_request(method.as_str(), status, latency);

    response
}

fn header_str(req: &Request, name: &str) -> String {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
