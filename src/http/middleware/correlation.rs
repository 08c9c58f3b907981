//! Correlation ID extraction and context injection.

use std::panic::AssertUnwindSafe;

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use futures_util::FutureExt;
use tracing::Instrument;

use crate::context::{
    short_id, RequestContext, CORRELATION_ID_KEY, GENERATED_ID_PREFIX, X_CORRELATION_ID,
};
use crate::http::middleware::recovery::handle_panic;

/// Reads `X-Correlation-ID` (generating a `gen_` one when absent or empty), stores
/// it in the request's [`RequestContext`], runs the rest of the chain under
/// a span carrying it, and echoes it back on the response.
///
/// A panic further down the chain is recovered here, so the 500 envelope
/// still carries the header.
pub async fn correlation_middleware(mut req: Request, next: Next) -> Response {
    let correlation_id = req
        .headers()
        .get(X_CORRELATION_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{GENERATED_ID_PREFIX}{}", short_id()));

    let base = req
        .extensions()
        .get::<RequestContext>()
        .cloned()
        .unwrap_or_default();
    let ctx = base
        .with_log_fields([(CORRELATION_ID_KEY, correlation_id.as_str())])
        .with_correlation_id(correlation_id.as_str());
    req.extensions_mut().insert(ctx.clone());

    let mut response = async move {
        match AssertUnwindSafe(next.run(req)).catch_unwind().await {
            Ok(response) => response,
            Err(payload) => handle_panic(payload),
        }
    }
    .instrument(ctx.span())
    .await;

    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        response.headers_mut().insert(X_CORRELATION_ID, value);
    }
    response.extensions_mut().insert(ctx);
    response
}
