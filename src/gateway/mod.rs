//! HTTP serving layer over generated routers.

pub mod config;
pub mod server;

pub use config::{load_config, validate_config, ConfigError, GatewayConfig, ValidationError};
pub use server::VersionGateway;
