//! Configuration validation.
//!
//! Serde handles the syntax; this pass checks the values make sense together.
//! Every violation is reported, not just the first.

use crate::config::schema::GatewayConfig;

/// A single semantic problem in a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a configuration, collecting all errors.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let prefix = &config.server.prefix;
    if !prefix.starts_with('/') {
        errors.push(ValidationError::new("server.prefix", "must start with '/'"));
    } else if prefix.len() > 1 && prefix.ends_with('/') {
        errors.push(ValidationError::new(
            "server.prefix",
            "must not end with '/' unless it is exactly '/'",
        ));
    }

    if config.server.host.is_empty() {
        errors.push(ValidationError::new("server.host", "must not be empty"));
    }

    if config.server.shutdown_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "server.shutdown_timeout_secs",
            "must be greater than zero",
        ));
    }

    if config.streams.capacity == 0 {
        errors.push(ValidationError::new("streams.capacity", "must be greater than zero"));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
