//! Server-sent event subscriptions.

use axum::routing::get;
use axum::Router;

use crate::http::server::AppState;
use crate::http::stream::relay;
use crate::routes::RouteGroup;

/// `GET /events?stream=<name>`, relayed from the server's stream manager.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventsRoutes;

impl RouteGroup for EventsRoutes {
    fn name(&self) -> &str {
        "events"
    }

    fn register_routes(&self, router: Router<AppState>) -> Router<AppState> {
        router.route("/events", get(relay))
    }
}
