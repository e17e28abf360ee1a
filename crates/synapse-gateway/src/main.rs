//! Synapse gateway entry point
//!
//! Run with:
//! ```bash
//! cargo run -p synapse-gateway
//! ```
//!
//! Configuration is loaded from environment variables.

use synapse_common::{try_init_tracing_with_config, SynapseConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        // Config errors can fire before the subscriber is installed
        eprintln!("synapse-gateway: {e}");
        error!(error = %e, "Gateway failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = SynapseConfig::from_env()?;

    let tracing_config = TracingConfig::for_environment(config.app.env);
    if let Err(e) = try_init_tracing_with_config(tracing_config) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        app = %config.app.name,
        env = ?config.app.env,
        port = config.gateway.port,
        "Starting Synapse gateway"
    );

    synapse_gateway::run(config).await?;

    Ok(())
}
