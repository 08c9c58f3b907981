//! Panic recovery for the whole chain.

use std::any::Any;

use axum::response::{IntoResponse, Response};

use crate::http::dispatch::panic_message;
use crate::http::response::ApiError;

/// Turns a panic anywhere below the recovery layer into a 500 failure envelope.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let msg = panic_message(payload.as_ref());
    tracing::error!(panic = %msg, "Recovered from panic");
    ApiError::new(msg).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn panic_becomes_failure_envelope() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], br#"{"msg":"boom"}"#);
    }
}
