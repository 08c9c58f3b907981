//! Request pipeline.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → recovery.rs (panic → 500 envelope)
//!     → CORS
//!     → security headers (set on the way out if absent)
//!     → X-Request-ID (generate, propagate)
//!     → access_log.rs (one "Request done" record, request metrics)
//!     → correlation.rs (X-Correlation-ID, request context, span; recovers
//!                       handler panics so the header survives them)
//!     → routes
//! ```

pub mod access_log;
pub mod correlation;
pub mod recovery;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};

use crate::config::GatewayConfig;
use crate::http::request::ShortRequestId;
use crate::security::{cors_layer, SecurityHeaders};

pub use access_log::access_log_middleware;
pub use correlation::correlation_middleware;
pub use recovery::handle_panic;

/// Wrap every route and the fallback of `router` in the request pipeline.
pub fn apply<S>(router: Router<S>, config: &GatewayConfig) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let [xss_protection, content_type_options, frame_options] =
        SecurityHeaders::from_config(&config.security).layers();

    router.layer(
        ServiceBuilder::new()
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(cors_layer(&config.cors))
            .layer(xss_protection)
            .layer(content_type_options)
            .layer(frame_options)
            .layer(SetRequestIdLayer::x_request_id(ShortRequestId))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(axum::middleware::from_fn(access_log_middleware))
            .layer(axum::middleware::from_fn(correlation_middleware)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use tower::ServiceExt;

    fn app(config: &GatewayConfig) -> Router {
        let router = Router::new()
            .route("/ok", get(|| async { "ok" }))
            .route("/boom", get(|| async { panic!("exploded") as () }));
        apply(router, config)
    }

    async fn get_path(config: &GatewayConfig, path: &str) -> axum::response::Response {
        app(config)
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn every_response_gets_pipeline_headers() {
        let response = get_path(&GatewayConfig::default(), "/ok").await;
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert!(headers.contains_key("x-correlation-id"));
        assert_eq!(headers["x-request-id"].len(), 22);
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["x-xss-protection"], "1; mode=block");
        assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
    }

    #[tokio::test]
    async fn panic_is_recovered() {
        let response = app(&GatewayConfig::default())
            .oneshot(
                Request::builder()
                    .uri("/boom")
                    .header("x-correlation-id", "cid-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()["x-correlation-id"], "cid-1");
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn security_headers_can_be_disabled() {
        let mut config = GatewayConfig::default();
        config.security.enable_headers = false;
        let response = get_path(&config, "/ok").await;
        assert!(!response.headers().contains_key("x-frame-options"));
        assert!(response.headers().contains_key("x-request-id"));
    }
}
