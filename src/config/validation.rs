//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, page sizes, addresses)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::ServiceConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
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

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    let db = &config.database;
    match &db.url {
        Some(url) if url.trim().is_empty() => {
            errors.push(ValidationError::new("database.url", "must not be empty"));
        }
        Some(_) => {}
        None => {
            if !matches!(db.driver.as_str(), "mysql" | "sqlite") {
                errors.push(ValidationError::new(
                    "database.driver",
                    format!("unsupported driver '{}' (expected mysql or sqlite)", db.driver),
                ));
            }
            if db.host.is_empty() {
                errors.push(ValidationError::new("database.host", "must not be empty"));
            }
            if db.name.is_empty() {
                errors.push(ValidationError::new("database.name", "must not be empty"));
            }
            if db.connection_url().is_err() {
                errors.push(ValidationError::new("database", "cannot assemble a connection URL"));
            }
        }
    }
    if db.max_connections == 0 {
        errors.push(ValidationError::new("database.max_connections", "must be > 0"));
    }
    if db.acquire_timeout_secs == 0 {
        errors.push(ValidationError::new("database.acquire_timeout_secs", "must be > 0"));
    }

    if config.tasks.sweep_interval_secs == 0 {
        errors.push(ValidationError::new("tasks.sweep_interval_secs", "must be > 0"));
    }

    let api = &config.api;
    if api.microservice_name.is_empty() {
        errors.push(ValidationError::new("api.microservice_name", "must not be empty"));
    }
    if api.max_page_size == 0 {
        errors.push(ValidationError::new("api.max_page_size", "must be > 0"));
    }
    if api.default_page_size == 0 || api.default_page_size > api.max_page_size {
        errors.push(ValidationError::new(
            "api.default_page_size",
            format!("must be within 1..={}", api.max_page_size),
        ));
    }

    if config.request_log.timeout_ms == 0 {
        errors.push(ValidationError::new("request_log.timeout_ms", "must be > 0"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }

    if config.cors.allowed_origins.is_empty() {
        errors.push(ValidationError::new("cors.allowed_origins", "must list at least one origin"));
    }

    if EnvFilter::try_new(&config.observability.log_level).is_err() {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("invalid filter '{}'", config.observability.log_level),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
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
