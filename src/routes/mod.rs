//! Route groups.
//!
//! Each feature contributes a named group that registers its own routes,
//! relative to the API prefix. Groups own disjoint paths, so the order they
//! are added in does not affect matching.

pub mod events;
pub mod system;

use axum::Router;

use crate::http::server::AppState;

pub use events::EventsRoutes;
pub use system::SystemRoutes;

/// A named set of routes mounted under the API prefix.
pub trait RouteGroup: Send + Sync {
    /// Name reported in the "server enabled handlers" log line and the docs.
    fn name(&self) -> &str;

    /// Add this group's routes to `router`.
    fn register_routes(&self, router: Router<AppState>) -> Router<AppState>;
}
