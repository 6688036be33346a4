//! Preference service binary.

use anyhow::{Context, Result};
use preference_node::{NodeConfig, PreferenceNode};
use preference_telemetry::init_telemetry;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = NodeConfig::from_env().context("failed to load configuration")?;
    init_telemetry(&config.telemetry).context("failed to initialize telemetry")?;

    let node = PreferenceNode::build(config)
        .await
        .context("failed to start preference node")?;

    info!("Node is running. Press Ctrl+C to stop.");
    node.run(shutdown_signal()).await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
        return;
    }
    info!("Shutdown signal received");
}
