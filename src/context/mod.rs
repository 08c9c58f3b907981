//! Request-scoped context propagation.
//!
//! # Data Flow
//! ```text
//! X-Correlation-ID header (or fresh short ID)
//!     → correlation middleware builds RequestContext
//!     → stored in request extensions + entered as tracing span
//!     → handlers extract RequestContext / log under the span
//!     → echoed back as response header
//! ```

pub mod correlation;
pub mod id;

pub use correlation::{
    RequestContext, CORRELATION_ID_KEY, GENERATED_ID_PREFIX, X_CORRELATION_ID,
};
pub use id::short_id;
