//! Request-scoped context carrying the correlation identifier.
//!
//! # Responsibilities
//! - Hold the correlation ID and structured log fields for one request
//! - Derive new contexts instead of mutating existing ones
//! - Synthesize a marked ID when none was ever attached
//!
//! # Design Decisions
//! - Cloning is cheap (shared allocations), so contexts are passed by value
//! - Stored in request extensions; handlers extract it like any other input
//! - Synthesized IDs carry `gen_` so a missing header upstream is visible in logs

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::id::short_id;

/// Header a client uses to supply its own correlation ID.
pub const X_CORRELATION_ID: &str = "x-correlation-id";

/// Log field name the correlation ID is recorded under.
pub const CORRELATION_ID_KEY: &str = "correlation_id";

/// Marker prepended to IDs the server had to invent at read time.
pub const GENERATED_ID_PREFIX: &str = "gen_";

/// Immutable, append-only bag of request metadata.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    correlation_id: Option<Arc<str>>,
    log_fields: Arc<Vec<(String, String)>>,
}

impl RequestContext {
    /// An empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a context carrying `id`. `self` is left untouched.
    #[must_use]
    pub fn with_correlation_id(&self, id: impl Into<String>) -> Self {
        Self {
            correlation_id: Some(Arc::from(id.into())),
            log_fields: Arc::clone(&self.log_fields),
        }
    }

    /// Derive a context with extra log fields appended after the existing ones.
    #[must_use]
    pub fn with_log_fields<I, K, V>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let log_fields: Vec<(String, String)> = self
            .log_fields
            .iter()
            .cloned()
            .chain(fields.into_iter().map(|(k, v)| (k.into(), v.into())))
            .collect();
        Self {
            correlation_id: self.correlation_id.clone(),
            log_fields: Arc::new(log_fields),
        }
    }

    /// The correlation ID for this request.
    ///
    /// When none was attached, a fresh `gen_`-prefixed ID is returned and a
    /// warning is logged. Nothing is memoized: each such call yields a new
    /// value, so callers needing a stable ID must attach the first one.
    pub fn correlation_id(&self) -> String {
        match &self.correlation_id {
            Some(id) => id.to_string(),
            None => {
                tracing::warn!("Correlation ID not found in context");
                format!("{GENERATED_ID_PREFIX}{}", short_id())
            }
        }
    }

    /// The attached correlation ID, without synthesizing one.
    pub fn stored_correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    /// Structured log fields in insertion order.
    pub fn log_fields(&self) -> &[(String, String)] {
        &self.log_fields
    }

    /// Look up a log field. Later entries win over earlier ones.
    pub fn log_field(&self, key: &str) -> Option<&str> {
        self.log_fields
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Span every log line emitted while serving the request runs under.
    pub fn span(&self) -> tracing::Span {
        let id = self.stored_correlation_id().unwrap_or_default();
        tracing::info_span!("request", correlation_id = %id)
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default())
    }
}
