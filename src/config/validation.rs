//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate backend addresses (authority with explicit port, no duplicates)
//! - Validate value ranges (timeouts > 0, interval > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BalancerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::uri::Authority;
use axum::http::HeaderName;
use thiserror::Error;

use crate::config::schema::BalancerConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("at least one backend must be configured")]
    NoBackends,

    #[error("backend `{0}` is not a valid host:port address")]
    InvalidBackend(String),

    #[error("backend `{0}` is listed more than once")]
    DuplicateBackend(String),

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("health check path `{0}` must start with '/'")]
    InvalidHealthPath(String),

    #[error("{field} `{value}` is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("trace header `{0}` is not a valid header name")]
    InvalidTraceHeader(String),
}

/// Validate a configuration, collecting every problem.
pub fn validate_config(config: &BalancerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.backends.is_empty() {
        errors.push(ValidationError::NoBackends);
    }

    let mut seen = HashSet::new();
    for backend in &config.backends {
        if !is_backend_address(backend) {
            errors.push(ValidationError::InvalidBackend(backend.clone()));
        } else if !seen.insert(backend.as_str()) {
            errors.push(ValidationError::DuplicateBackend(backend.clone()));
        }
    }

    if config.upstream.timeout_ms == 0 {
        errors.push(ValidationError::ZeroDuration("upstream.timeout_ms"));
    }
    if config.health_check.interval_ms == 0 {
        errors.push(ValidationError::ZeroDuration("health_check.interval_ms"));
    }
    if !config.health_check.path.starts_with('/') {
        errors.push(ValidationError::InvalidHealthPath(config.health_check.path.clone()));
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: observability.metrics_address.clone(),
        });
    }
    if HeaderName::from_bytes(observability.trace_header.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidTraceHeader(observability.trace_header.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// A backend must be a bare authority with an explicit port and no userinfo.
fn is_backend_address(value: &str) -> bool {
    match value.parse::<Authority>() {
        Ok(authority) => {
            authority.port_u16().is_some()
                && !authority.host().is_empty()
                && !authority.as_str().contains('@')
        }
        Err(_) => false,
    }
}
