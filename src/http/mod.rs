//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, route groups under the prefix)
//!     → middleware/ (recovery, CORS, security headers, request ID,
//!                    access log, correlation ID)
//!     → dispatch.rs (plain business function → handler)
//!       or stream.rs (named stream → SSE)
//!     → response.rs (success / failure envelope)
//!     → Send to client
//! ```

pub mod dispatch;
pub mod docs;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;
pub mod stream;

pub use dispatch::{dispatch, dispatch_async, Outcome};
pub use request::X_REQUEST_ID;
pub use response::{respond_failure, respond_success, ApiError, FailureBody};
pub use server::{AppState, HttpServer, ServerError};
