//! # synapse-common
//!
//! Shared utilities for Synapse services: configuration, telemetry, and the
//! JWT-backed identity verifier.

pub mod auth;
pub mod config;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use auth::{Claims, JwtVerifier};
pub use config::{
    AppSettings, ChatConfig, ConfigError, DatabaseConfig, Environment, JwtConfig, ServerConfig,
    SynapseConfig,
};
pub use telemetry::{try_init_tracing, try_init_tracing_with_config, TracingConfig, TracingError};
