//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Outgoing response:
//!     → cors.rs (Access-Control-* headers, preflight answers)
//!     → headers.rs (X-XSS-Protection, X-Content-Type-Options, X-Frame-Options)
//! ```
//!
//! # Design Decisions
//! - Both stages run for every response, including failures and 404s
//! - Authentication is out of scope: caller-supplied tokens pass through

pub mod cors;
pub mod headers;

pub use cors::cors_layer;
pub use headers::SecurityHeaders;
