//! Liveness and build information.

use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{json, Value};

use crate::http::dispatch::dispatch;
use crate::http::server::AppState;
use crate::routes::RouteGroup;

#[derive(Debug, Clone, Serialize)]
pub struct VersionInfo {
    pub name: &'static str,
    pub version: &'static str,
}

fn health() -> Value {
    json!({ "status": "ok" })
}

fn version(name: &'static str, version: &'static str) -> Json<VersionInfo> {
    Json(VersionInfo { name, version })
}

/// `GET /system/health` and `GET /system/version`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRoutes;

impl RouteGroup for SystemRoutes {
    fn name(&self) -> &str {
        "system"
    }

    fn register_routes(&self, router: Router<AppState>) -> Router<AppState> {
        router
            .route("/system/health", get(dispatch(health, ())))
            .route(
                "/system/version",
                get(dispatch(
                    version,
                    (env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
                )),
            )
    }
}
