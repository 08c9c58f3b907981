//! Chat gateway library.

pub mod config;
pub mod context;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routes;
pub mod security;
pub mod streams;

pub use config::schema::GatewayConfig;
pub use context::RequestContext;
pub use http::{HttpServer, ServerError};
pub use lifecycle::Shutdown;
pub use routes::{EventsRoutes, RouteGroup, SystemRoutes};
pub use streams::{StreamEvent, StreamManager};
