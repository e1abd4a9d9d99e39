//! Reputation tracker that only counts maintenance runs

use crate::ports::ReputationTracker;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Tracker with no scores to maintain
#[derive(Debug, Default)]
pub struct NoopReputationTracker {
    runs: AtomicU64,
}

impl NoopReputationTracker {
    /// Creates a tracker with zero runs
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of maintenance runs so far
    pub fn runs(&self) -> u64 {
        self.runs.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ReputationTracker for NoopReputationTracker {
    async fn run_periodic_maintenance(&self) {
        let run = self.runs.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(run, "[bundler] Reputation maintenance");
    }
}
