//! Gateway configuration.
//!
//! # Responsibilities
//! - Deserialize gateway settings from TOML
//! - Semantic validation (serde handles syntactic)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation runs before a config is accepted into the system

use std::net::SocketAddr;
use std::path::Path;

use axum::http::HeaderName;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Settings for serving generated version routers.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Header carrying the caller's requested API version date.
    pub version_header: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            version_header: "x-api-version".to_string(),
            request_timeout_secs: 30,
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

/// One semantic problem found while validating a config.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("bind_address \"{0}\" is not a valid socket address")]
    InvalidBindAddress(String),

    #[error("version_header \"{0}\" is not a valid header name")]
    InvalidVersionHeader(String),

    #[error("request_timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("no generated versions to serve")]
    NoVersions,

    #[error("method \"{method}\" of route \"{path}\" cannot be dispatched")]
    UnsupportedMethod { method: String, path: String },
}

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Semantic validation, pure over the parsed config.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    if config.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(config.bind_address.clone()));
    }
    if HeaderName::try_from(config.version_header.as_str()).is_err() {
        errors.push(ValidationError::InvalidVersionHeader(config.version_header.clone()));
    }
    if config.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: GatewayConfig = toml::from_str(&content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
