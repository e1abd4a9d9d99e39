//! Inbound ports (driving side - API)

use crate::domain::{BundleAttempt, EntryPoint, UserOpHash, UserOperation};
use crate::error::Result;
use async_trait::async_trait;

/// Primary port: what the host process (RPC layer, admin tooling) calls
#[async_trait]
pub trait ExecutionManagerApi: Send + Sync {
    /// Validate, admit and possibly bundle one operation.
    ///
    /// Returns the operation's identity once admitted. Only validation and
    /// admission errors reach the caller; a failed bundle send after admission
    /// leaves the operation pending and is not reported here.
    async fn send_user_operation(
        &self,
        user_op: UserOperation,
        entry_point: EntryPoint,
    ) -> Result<UserOpHash>;

    /// Run the bundling policy now. Manual triggers pass `force = true`.
    async fn attempt_bundle(&self, force: bool) -> Result<BundleAttempt>;

    /// Replace the auto-bundle timer and record the size threshold.
    ///
    /// `interval_secs == 0` disables timer-driven bundling.
    fn set_auto_bundler(&self, interval_secs: u64, max_pool_size: usize);

    /// Replace the reputation timer. `0` disables it.
    fn set_reputation_cron(&self, interval_ms: u64);

    /// Snapshot of scheduler state and counters
    fn status(&self) -> ExecutionStatus;

    /// Cancel both timers
    fn shutdown(&self);
}

/// Scheduler state and counters
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecutionStatus {
    /// Auto-bundle interval in seconds (0 = manual mode)
    pub auto_bundle_interval_secs: u64,

    /// Size threshold for admission-triggered bundling
    pub max_pool_size: usize,

    /// Reputation cadence in milliseconds (0 = disabled)
    pub reputation_interval_ms: u64,

    /// An auto-bundle timer is live
    pub auto_bundle_armed: bool,

    /// A reputation timer is live
    pub reputation_armed: bool,

    /// Operations admitted to the pool
    pub operations_admitted: u64,

    /// Submissions rejected by validation
    pub validation_rejections: u64,

    /// Submissions rejected by the pool
    pub admission_rejections: u64,

    /// Bundles submitted
    pub bundles_sent: u64,

    /// Failed bundle sends (admission path and timer path)
    pub submission_failures: u64,

    /// Failed timer firings
    pub scheduling_failures: u64,

    /// Reputation maintenance runs started
    pub reputation_runs: u64,
}
