//! Uniform success / failure response envelopes.
//!
//! # Responsibilities
//! - Success: business payload serialized verbatim as JSON, 200
//! - Failure: `{"msg": "<error text>"}` with a failure status (default 500)
//! - Tag failure responses so the access log can report the handler error
//!
//! # Design Decisions
//! - An unset status is `None`; `http` has no zero status code to overload
//! - Each helper builds a whole `Response`, so writing twice is not expressible

use std::fmt;

use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// Body of every failure response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureBody {
    pub msg: String,
}

/// Error text a handler failed with, attached to the response extensions.
#[derive(Debug, Clone)]
pub struct HandlerError(pub String);

/// 200 with `payload` as the JSON body.
pub fn respond_success<T: Serialize>(payload: T) -> Response {
    (StatusCode::OK, Json(payload)).into_response()
}

/// Failure envelope for a request to `uri`.
///
/// `None` as status means 500. A present error is logged with the URL and
/// becomes `msg`; an absent one yields an empty `msg`.
pub fn respond_failure(
    uri: &Uri,
    status: Option<StatusCode>,
    err: Option<&dyn fmt::Display>,
) -> Response {
    let msg = match err {
        Some(err) => {
            let msg = err.to_string();
            tracing::warn!(url = %uri, error = %msg, "request failed");
            msg
        }
        None => String::new(),
    };
    failure_response(status, msg)
}

fn failure_response(status: Option<StatusCode>, msg: String) -> Response {
    let status = status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let error = (!msg.is_empty()).then(|| HandlerError(msg.clone()));
    let mut response = (status, Json(FailureBody { msg })).into_response();
    if let Some(error) = error {
        response.extensions_mut().insert(error);
    }
    response
}

/// Failure carried through `?` in handlers, rendered as the failure envelope.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    status: Option<StatusCode>,
    message: String,
}

impl ApiError {
    /// Failure with the default status.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    /// Failure with a specific status.
    pub fn with_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, message)
    }

    /// Status the envelope will be written with.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!(status = %self.status(), error = %self.message, "request failed");
        failure_response(self.status, self.message)
    }
}
