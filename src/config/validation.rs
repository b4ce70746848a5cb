//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure function: WatchConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::WatchConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
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

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &WatchConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.node.connect_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "node.connect_timeout_secs",
            "must be greater than 0",
        ));
    }

    if config.mempool.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "mempool.request_timeout_secs",
            "must be greater than 0",
        ));
    }

    match url::Url::parse(&config.mempool.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(
            "mempool.base_url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new("mempool.base_url", e.to_string())),
    }

    // No upper bound: the node decides how deep it is willing to watch.
    if config.watch.num_confs == 0 {
        errors.push(ValidationError::new("watch.num_confs", "must be at least 1"));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
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
