//! API documentation route.
//!
//! `GET /swagger/doc.json` describes the mounted groups as a minimal
//! OpenAPI 2 document; any other `/swagger/*` path is a 404 envelope.

use axum::extract::{Path, State};
use axum::http::{StatusCode, Uri};
use axum::response::Response;
use serde_json::{json, Value};

use crate::http::response::{respond_failure, respond_success};
use crate::http::server::AppState;

pub const DOC_PATH: &str = "doc.json";

pub async fn swagger(State(state): State<AppState>, Path(path): Path<String>, uri: Uri) -> Response {
    if path == DOC_PATH {
        return respond_success(document(&state));
    }
    let err = format!("no such document: {path}");
    respond_failure(&uri, Some(StatusCode::NOT_FOUND), Some(&err))
}

fn document(state: &AppState) -> Value {
    let server = &state.config.server;
    let tags: Vec<Value> = state
        .handlers
        .iter()
        .map(|name| json!({ "name": name }))
        .collect();

    json!({
        "swagger": "2.0",
        "info": {
            "title": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
        },
        "host": server.bind_address(),
        "basePath": server.prefix,
        "schemes": ["http"],
        "tags": tags,
        "paths": {},
    })
}
