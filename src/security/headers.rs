//! Security response headers.
//!
//! # Responsibilities
//! - Add XSS, content-type sniffing and framing protections to every response
//!
//! # Design Decisions
//! - Headers a handler already set are left alone
//! - Disabled or unrepresentable values resolve to `None`, which the
//!   set-header layer treats as "do not add"

use axum::http::header::{HeaderName, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS, X_XSS_PROTECTION};
use axum::http::HeaderValue;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::SecurityConfig;

/// Resolved header values for the security stage.
#[derive(Debug, Clone)]
pub struct SecurityHeaders {
    pub xss_protection: Option<HeaderValue>,
    pub content_type_options: Option<HeaderValue>,
    pub frame_options: Option<HeaderValue>,
}

impl SecurityHeaders {
    pub fn from_config(config: &SecurityConfig) -> Self {
        if !config.enable_headers {
            return Self {
                xss_protection: None,
                content_type_options: None,
                frame_options: None,
            };
        }

        let frame_options = HeaderValue::from_str(&config.frame_options).ok();
        if frame_options.is_none() {
            tracing::warn!(value = %config.frame_options, "Ignoring invalid X-Frame-Options value");
        }

        Self {
            xss_protection: Some(HeaderValue::from_static("1; mode=block")),
            content_type_options: Some(HeaderValue::from_static("nosniff")),
            frame_options,
        }
    }

    /// One set-if-absent layer per header, outermost first.
    pub fn layers(self) -> [SetResponseHeaderLayer<Option<HeaderValue>>; 3] {
        [
            layer(X_XSS_PROTECTION, self.xss_protection),
            layer(X_CONTENT_TYPE_OPTIONS, self.content_type_options),
            layer(X_FRAME_OPTIONS, self.frame_options),
        ]
    }
}

fn layer(name: HeaderName, value: Option<HeaderValue>) -> SetResponseHeaderLayer<Option<HeaderValue>> {
    SetResponseHeaderLayer::if_not_present(name, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_all_three() {
        let headers = SecurityHeaders::from_config(&SecurityConfig::default());
        assert_eq!(headers.xss_protection.unwrap(), "1; mode=block");
        assert_eq!(headers.content_type_options.unwrap(), "nosniff");
        assert_eq!(headers.frame_options.unwrap(), "SAMEORIGIN");
    }

    #[test]
    fn disabled_yields_nothing() {
        let headers = SecurityHeaders::from_config(&SecurityConfig {
            enable_headers: false,
            ..SecurityConfig::default()
        });
        assert!(headers.xss_protection.is_none());
        assert!(headers.frame_options.is_none());
    }

    #[test]
    fn invalid_frame_option_is_dropped() {
        let headers = SecurityHeaders::from_config(&SecurityConfig {
            enable_headers: true,
            frame_options: "DENY\n".into(),
        });
        assert!(headers.frame_options.is_none());
        assert!(headers.content_type_options.is_some());
    }
}
