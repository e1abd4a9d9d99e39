//! # Bundler Node
//!
//! Entry point for the bundler host process.

use anyhow::{Context, Result};
use bundler_execution::ExecutionConfig;
use bundler_node::telemetry::{init_tracing, TelemetryConfig};
use bundler_node::{BundlerNode, NodeConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(&TelemetryConfig::from_env()).context("Failed to initialize logging")?;

    let node_config = NodeConfig::from_env().context("Failed to load node configuration")?;
    let execution_config =
        ExecutionConfig::from_env().context("Failed to load execution configuration")?;

    let node = BundlerNode::new(&node_config)?;
    node.start(&execution_config)?;

    info!("Bundler is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    node.shutdown();
    Ok(())
}
