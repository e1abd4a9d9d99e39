//! Metrics collection for the execution manager

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics collector for the execution manager
#[derive(Debug, Default)]
pub struct Metrics {
    /// Operations admitted to the pending pool
    pub operations_admitted: AtomicU64,

    /// Submissions rejected by validation
    pub validation_rejections: AtomicU64,

    /// Submissions rejected by the pool
    pub admission_rejections: AtomicU64,

    /// Calls to `attempt_bundle` (all triggers)
    pub bundle_attempts: AtomicU64,

    /// Attempts skipped below threshold
    pub bundle_attempts_skipped: AtomicU64,

    /// Bundles submitted downstream
    pub bundles_sent: AtomicU64,

    /// Operations carried by submitted bundles
    pub operations_bundled: AtomicU64,

    /// Failed sends or reconciliations
    pub submission_failures: AtomicU64,

    /// Failed auto-bundle timer firings
    pub scheduling_failures: AtomicU64,

    /// Reputation maintenance runs started
    pub reputation_runs: AtomicU64,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful admission
    pub fn record_admitted(&self) {
        self.operations_admitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a validation rejection
    pub fn record_validation_rejection(&self) {
        self.validation_rejections.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a pool rejection
    pub fn record_admission_rejection(&self) {
        self.admission_rejections.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a bundling attempt; `skipped` if the policy did not proceed
    pub fn record_attempt(&self, skipped: bool) {
        self.bundle_attempts.fetch_add(1, Ordering::Relaxed);
        if skipped {
            self.bundle_attempts_skipped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a submitted bundle
    pub fn record_bundle_sent(&self, op_count: usize) {
        self.bundles_sent.fetch_add(1, Ordering::Relaxed);
        self.operations_bundled
            .fetch_add(op_count as u64, Ordering::Relaxed);
    }

    /// Record a failed send or reconciliation
    pub fn record_submission_failure(&self) {
        self.submission_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed timer firing
    pub fn record_scheduling_failure(&self) {
        self.scheduling_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a reputation run
    pub fn record_reputation_run(&self) {
        self.reputation_runs.fetch_add(1, Ordering::Relaxed);
    }

    /// Get operations admitted
    pub fn get_operations_admitted(&self) -> u64 {
        self.operations_admitted.load(Ordering::Relaxed)
    }

    /// Get validation rejections
    pub fn get_validation_rejections(&self) -> u64 {
        self.validation_rejections.load(Ordering::Relaxed)
    }

    /// Get pool rejections
    pub fn get_admission_rejections(&self) -> u64 {
        self.admission_rejections.load(Ordering::Relaxed)
    }

    /// Get bundles sent
    pub fn get_bundles_sent(&self) -> u64 {
        self.bundles_sent.load(Ordering::Relaxed)
    }

    /// Get submission failures
    pub fn get_submission_failures(&self) -> u64 {
        self.submission_failures.load(Ordering::Relaxed)
    }

    /// Get scheduling failures
    pub fn get_scheduling_failures(&self) -> u64 {
        self.scheduling_failures.load(Ordering::Relaxed)
    }

    /// Get reputation runs
    pub fn get_reputation_runs(&self) -> u64 {
        self.reputation_runs.load(Ordering::Relaxed)
    }

    /// Get average operations per submitted bundle
    pub fn get_avg_operations_per_bundle(&self) -> f64 {
        let bundles = self.bundles_sent.load(Ordering::Relaxed);
        if bundles == 0 {
            return 0.0;
        }
        let ops = self.operations_bundled.load(Ordering::Relaxed);
        ops as f64 / bundles as f64
    }
}
