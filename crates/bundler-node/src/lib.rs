//! # Bundler Node
//!
//! Host process for the execution manager.
//!
//! ## Startup Sequence
//!
//! 1. Install logging ([`telemetry`])
//! 2. Load [`NodeConfig`] and [`ExecutionConfig`] from the environment
//! 3. Wire the in-process pool, assembler, validator and reputation tracker
//! 4. Apply the execution configuration (arms the timers)
//! 5. Run until Ctrl+C, then cancel the timers

pub mod config;
pub mod telemetry;

use std::sync::Arc;

use anyhow::{Context, Result};
use bundler_execution::{
    BasicInputValidator, ExecutionConfig, ExecutionManager, ExecutionManagerApi, ExecutionStatus,
    InMemoryBundleAssembler, InMemoryPendingPool, NoopReputationTracker,
};
use tracing::info;

pub use config::NodeConfig;

/// The execution manager wired to its in-process collaborators.
pub struct BundlerNode {
    manager: Arc<ExecutionManager>,
    pool: Arc<InMemoryPendingPool>,
    assembler: Arc<InMemoryBundleAssembler>,
    tracker: Arc<NoopReputationTracker>,
}

impl BundlerNode {
    /// Wire the collaborators. No timer is armed yet.
    pub fn new(config: &NodeConfig) -> Result<Self> {
        config.validate().context("Invalid node configuration")?;

        let pool = Arc::new(InMemoryPendingPool::new(config.pool_capacity));
        let assembler = Arc::new(
            InMemoryBundleAssembler::new(pool.clone(), config.max_bundle_size)
                .context("Failed to create bundle assembler")?,
        );
        let tracker = Arc::new(NoopReputationTracker::new());
        let validator = Arc::new(BasicInputValidator::new(
            config.entry_points.clone(),
            config.chain_id,
        ));

        let manager = Arc::new(ExecutionManager::new(
            validator,
            pool.clone(),
            assembler.clone(),
            tracker.clone(),
        ));

        info!(
            pool_capacity = config.pool_capacity,
            max_bundle_size = config.max_bundle_size,
            chain_id = config.chain_id,
            entry_points = config.entry_points.len(),
            "Bundler node wired"
        );

        Ok(Self {
            manager,
            pool,
            assembler,
            tracker,
        })
    }

    /// Apply the execution configuration. Must run inside a tokio runtime.
    pub fn start(&self, config: &ExecutionConfig) -> Result<()> {
        self.manager
            .apply_config(config)
            .context("Failed to apply execution configuration")?;

        if config.is_manual() {
            info!(
                threshold = config.max_pool_size,
                "Bundler running in manual mode"
            );
        } else {
            info!(
                interval_secs = config.auto_bundle_interval_secs,
                threshold = config.max_pool_size,
                "Bundler running with auto-bundle timer"
            );
        }
        Ok(())
    }

    /// The execution manager
    pub fn manager(&self) -> Arc<ExecutionManager> {
        self.manager.clone()
    }

    /// The pending pool
    pub fn pool(&self) -> &InMemoryPendingPool {
        &self.pool
    }

    /// Cancel the timers and report final state
    pub fn shutdown(&self) -> ExecutionStatus {
        self.manager.shutdown();
        let status = self.manager.status();
        info!(
            admitted = status.operations_admitted,
            bundles = status.bundles_sent,
            receipts = self.assembler.bundles_sent(),
            pending = self.pool.len(),
            reputation_runs = self.tracker.runs(),
            "Bundler node stopped"
        );
        status
    }
}
