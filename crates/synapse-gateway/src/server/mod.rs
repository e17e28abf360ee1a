//! Gateway server setup
//!
//! Router construction, dependency wiring, and the serve loop.

mod state;

pub use state::GatewayState;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use synapse_common::{JwtVerifier, SynapseConfig};
use synapse_core::StoreError;
use synapse_store::{create_pool, PgDocumentStore, PoolConfig};

use crate::lifecycle::chat_handler;

/// Server setup and serve errors
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(std::io::Error),
}

/// Create the gateway router
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/ws/:room_id", get(chat_handler))
        .route("/health", get(health_check))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    create_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Initialize all dependencies and create `GatewayState`
pub async fn create_gateway_state(config: &SynapseConfig) -> Result<GatewayState, ServerError> {
    tracing::info!("Connecting to PostgreSQL...");
    let pool_config = PoolConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        min_connections: config.database.min_connections,
        ..PoolConfig::default()
    };
    let pool = create_pool(&pool_config).await?;

    let store = PgDocumentStore::new(pool);
    store.migrate().await?;
    tracing::info!("PostgreSQL connection established");

    let verifier = JwtVerifier::new(&config.jwt.secret);

    Ok(GatewayState::new(
        Arc::new(store),
        Arc::new(verifier),
        config.chat.clone(),
    ))
}

/// Run the gateway server
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), ServerError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    tracing::info!("Gateway listening on ws://{}/ws/{{room_id}}", addr);

    axum::serve(listener, app).await.map_err(ServerError::Serve)
}

/// Run the complete gateway server with configuration
pub async fn run(config: SynapseConfig) -> Result<(), ServerError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.gateway.port));

    let state = create_gateway_state(&config).await?;
    let app = create_app(state);

    run_server(app, addr).await
}
