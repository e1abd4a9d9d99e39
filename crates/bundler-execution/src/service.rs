//! Execution Manager Service Implementation
//!
//! Top-level entry point for operations: serializes intake, drives
//! validation and admission, applies the threshold-or-timer bundling policy,
//! and owns the reputation cadence.
//!
//! ## Serialization
//!
//! A single async mutex covers validate → identity → admit → policy. The
//! auto-bundle timer and manual triggers take the same mutex before running
//! the policy, so every pool-mutating path is serialized and a bundle built
//! inside the critical section sees exactly the admissions made so far.
//! The reputation timer never takes it.
//!
//! ## Timers
//!
//! Each timer is a tokio task paired with a stop channel. Replacing a timer
//! drops the old stop sender before spawning the new task, and the task
//! checks the stop channel first on every tick, so a replaced timer never
//! fires again.

use crate::{
    config::ExecutionConfig,
    domain::{
        AdmissionRequest, BundleAttempt, BundlePolicy, EntryPoint, GasLimitOverrides, UserOpHash,
        UserOperation,
    },
    error::{ExecutionError, Result, ValidationError},
    metrics::Metrics,
    ports::{
        BundleAssembler, ExecutionManagerApi, ExecutionStatus, PendingPool, ReputationTracker,
        ValidationCollaborator,
    },
};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// A live recurring timer. Dropping it stops the task at its next tick.
struct TimerHandle {
    _stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl TimerHandle {
    fn is_live(&self) -> bool {
        !self.task.is_finished()
    }
}

/// Scheduler state owned by one manager instance.
///
/// Only `set_auto_bundler` / `set_reputation_cron` / `shutdown` mutate it.
#[derive(Default)]
struct SchedulerState {
    auto_bundle_interval_secs: u64,
    policy: BundlePolicy,
    reputation_interval_ms: u64,
    auto_bundle_timer: Option<TimerHandle>,
    reputation_timer: Option<TimerHandle>,
}

struct Inner {
    validator: Arc<dyn ValidationCollaborator>,
    pool: Arc<dyn PendingPool>,
    assembler: Arc<dyn BundleAssembler>,
    reputation: Arc<dyn ReputationTracker>,

    /// Serializes admission and every pool-mutating bundling path
    submission_lock: tokio::sync::Mutex<()>,

    /// Never held across an `.await`
    scheduler: Mutex<SchedulerState>,

    gas_overrides: RwLock<Option<GasLimitOverrides>>,

    metrics: Metrics,
}

impl Inner {
    fn policy(&self) -> BundlePolicy {
        self.scheduler.lock().policy
    }

    /// Run the bundling policy. Caller must hold `submission_lock`.
    async fn bundle_locked(&self, force: bool) -> Result<BundleAttempt> {
        let policy = self.policy();
        let pool_size = self.pool.count().await;
        debug!(
            force,
            pool_size,
            threshold = policy.max_pool_size,
            "[bundler] attempt_bundle"
        );

        let decision = policy.decide(force, pool_size);
        self.metrics.record_attempt(!decision.proceeds());
        if !decision.proceeds() {
            return Ok(BundleAttempt::Skipped {
                pool_size,
                threshold: policy.max_pool_size,
            });
        }

        let receipt = self
            .assembler
            .send_next_bundle()
            .await
            .inspect_err(|_| self.metrics.record_submission_failure())?;

        let attempt = match receipt {
            Some(receipt) => {
                self.metrics.record_bundle_sent(receipt.user_op_hashes.len());
                info!(
                    tx_hash = ?receipt.transaction_hash,
                    ops = receipt.user_op_hashes.len(),
                    trigger = ?decision,
                    "[bundler] 📦 Bundle sent"
                );
                BundleAttempt::Sent(receipt)
            }
            None => {
                debug!("[bundler] No eligible operations for bundle");
                BundleAttempt::NothingToSend
            }
        };

        if policy.reconciles_after_send() {
            // auto-mining: flush operations the ledger already reports as included
            if let Err(e) = self.assembler.handle_past_events().await {
                self.metrics.record_submission_failure();
                warn!("[bundler] Pool reconciliation failed: {}", e);
            }
        }

        Ok(attempt)
    }

    async fn bundle_serialized(&self, force: bool) -> Result<BundleAttempt> {
        let _guard = self.submission_lock.lock().await;
        self.bundle_locked(force).await
    }

    async fn on_auto_bundle_tick(&self) {
        if let Err(e) = self.bundle_serialized(true).await {
            self.metrics.record_scheduling_failure();
            error!("[bundler] Auto-bundle failed: {}", e);
        }
    }

    async fn on_reputation_tick(&self) {
        self.metrics.record_reputation_run();
        self.reputation.run_periodic_maintenance().await;
    }

    fn reject_validation(&self, e: ValidationError) -> ExecutionError {
        self.metrics.record_validation_rejection();
        warn!("[bundler] Operation rejected by validation: {}", e);
        e.into()
    }

    fn cancel_timers(&self) {
        let mut scheduler = self.scheduler.lock();
        scheduler.auto_bundle_timer = None;
        scheduler.reputation_timer = None;
    }
}

/// Spawn a recurring task firing every `period`, first firing one period from now.
fn arm_timer<F, Fut>(inner: &Arc<Inner>, period: Duration, on_tick: F) -> Result<TimerHandle>
where
    F: Fn(Arc<Inner>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
        ExecutionError::InvalidConfig(format!("timers need a tokio runtime: {}", e))
    })?;

    let weak: Weak<Inner> = Arc::downgrade(inner);
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

    let task = runtime.spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = &mut stop_rx => break,
                _ = ticker.tick() => {}
            }
            let Some(inner) = weak.upgrade() else {
                break;
            };
            on_tick(inner).await;
        }
    });

    Ok(TimerHandle {
        _stop: stop_tx,
        task,
    })
}

/// Concrete implementation of [`ExecutionManagerApi`]
///
/// Starts in manual mode: no timers, threshold 0.
pub struct ExecutionManager {
    inner: Arc<Inner>,
}

impl ExecutionManager {
    /// Create a new execution manager over its four collaborators
    pub fn new(
        validator: Arc<dyn ValidationCollaborator>,
        pool: Arc<dyn PendingPool>,
        assembler: Arc<dyn BundleAssembler>,
        reputation: Arc<dyn ReputationTracker>,
    ) -> Self {
        info!("[bundler] Initializing Execution Manager (manual mode)");

        Self {
            inner: Arc::new(Inner {
                validator,
                pool,
                assembler,
                reputation,
                submission_lock: tokio::sync::Mutex::new(()),
                scheduler: Mutex::new(SchedulerState::default()),
                gas_overrides: RwLock::new(None),
                metrics: Metrics::new(),
            }),
        }
    }

    /// Set limit overrides applied to every operation before validation
    pub fn with_gas_overrides(self, overrides: GasLimitOverrides) -> Self {
        self.set_gas_overrides(Some(overrides));
        self
    }

    /// Replace limit overrides (`None` disables them)
    pub fn set_gas_overrides(&self, overrides: Option<GasLimitOverrides>) {
        let overrides = overrides.filter(|o| !o.is_empty());
        info!(
            "[bundler] Gas limit overrides {}",
            if overrides.is_some() { "enabled" } else { "disabled" }
        );
        *self.inner.gas_overrides.write() = overrides;
    }

    /// Apply a full configuration: overrides, auto-bundler, reputation cadence
    pub fn apply_config(&self, config: &ExecutionConfig) -> Result<()> {
        config.validate()?;
        self.set_gas_overrides(config.gas_overrides.clone());
        self.try_set_auto_bundler(config.auto_bundle_interval_secs, config.max_pool_size)?;
        self.try_set_reputation_cron(config.reputation_interval_ms)
    }

    /// Replace the auto-bundle timer, reporting a missing runtime as an error
    pub fn try_set_auto_bundler(&self, interval_secs: u64, max_pool_size: usize) -> Result<()> {
        debug!(interval_secs, max_pool_size, "[bundler] set auto-bundle");

        let mut scheduler = self.inner.scheduler.lock();
        scheduler.auto_bundle_timer = None;
        scheduler.auto_bundle_interval_secs = interval_secs;
        scheduler.policy = BundlePolicy::new(max_pool_size);

        if interval_secs > 0 {
            let timer = arm_timer(
                &self.inner,
                Duration::from_secs(interval_secs),
                |inner| async move { inner.on_auto_bundle_tick().await },
            );
            match timer {
                Ok(timer) => scheduler.auto_bundle_timer = Some(timer),
                Err(e) => {
                    scheduler.auto_bundle_interval_secs = 0;
                    return Err(e);
                }
            }
            info!(
                "[bundler] Auto-bundle armed: every {}s, threshold {}",
                interval_secs, max_pool_size
            );
        } else {
            info!(
                "[bundler] Auto-bundle timer disabled, threshold {}",
                max_pool_size
            );
        }
        Ok(())
    }

    /// Replace the reputation timer, reporting a missing runtime as an error
    pub fn try_set_reputation_cron(&self, interval_ms: u64) -> Result<()> {
        debug!(interval_ms, "[bundler] set reputation interval");

        let mut scheduler = self.inner.scheduler.lock();
        scheduler.reputation_timer = None;
        scheduler.reputation_interval_ms = interval_ms;

        if interval_ms > 0 {
            let timer = arm_timer(
                &self.inner,
                Duration::from_millis(interval_ms),
                |inner| async move { inner.on_reputation_tick().await },
            );
            match timer {
                Ok(timer) => scheduler.reputation_timer = Some(timer),
                Err(e) => {
                    scheduler.reputation_interval_ms = 0;
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Metrics collected by this manager
    pub fn metrics(&self) -> &Metrics {
        &self.inner.metrics
    }
}

impl Drop for ExecutionManager {
    fn drop(&mut self) {
        self.inner.cancel_timers();
    }
}

#[async_trait]
impl ExecutionManagerApi for ExecutionManager {
    async fn send_user_operation(
        &self,
        mut user_op: UserOperation,
        entry_point: EntryPoint,
    ) -> Result<UserOpHash> {
        let inner = &self.inner;
        let _guard = inner.submission_lock.lock().await;
        debug!(sender = %hex::encode(user_op.sender), "[bundler] send_user_operation");

        let overrides = inner.gas_overrides.read().clone();
        if let Some(overrides) = overrides {
            overrides.apply(&mut user_op);
        }

        inner
            .validator
            .validate_input_parameters(&user_op, &entry_point)
            .await
            .map_err(|e| inner.reject_validation(e))?;

        let user_op_hash = inner
            .validator
            .compute_identity_hash(&user_op, &entry_point)
            .await
            .map_err(|e| inner.reject_validation(e))?;

        let verdict = inner
            .validator
            .validate_and_estimate(&user_op, &entry_point, &user_op_hash)
            .await
            .map_err(|e| inner.reject_validation(e))?;
        if verdict.is_placeholder() {
            debug!(%user_op_hash, "[bundler] Using placeholder verdict");
        }

        let request = AdmissionRequest::from_verdict(true, user_op, user_op_hash, verdict);
        if let Err(e) = inner.pool.add_operation(request).await {
            inner.metrics.record_admission_rejection();
            warn!(%user_op_hash, "[bundler] Operation rejected by pool: {}", e);
            return Err(e.into());
        }
        inner.metrics.record_admitted();
        info!(%user_op_hash, "[bundler] Operation admitted");

        // Admission already succeeded; a failed send leaves the operation pending.
        match inner.bundle_locked(false).await {
            Ok(attempt) => debug!(?attempt, "[bundler] Post-admission bundling"),
            Err(e) => warn!(
                %user_op_hash,
                "[bundler] Bundling after admission failed, operation stays pending: {}", e
            ),
        }

        Ok(user_op_hash)
    }

    async fn attempt_bundle(&self, force: bool) -> Result<BundleAttempt> {
        self.inner.bundle_serialized(force).await
    }

    fn set_auto_bundler(&self, interval_secs: u64, max_pool_size: usize) {
        if let Err(e) = self.try_set_auto_bundler(interval_secs, max_pool_size) {
            error!("[bundler] Failed to arm auto-bundle timer: {}", e);
        }
    }

    fn set_reputation_cron(&self, interval_ms: u64) {
        if let Err(e) = self.try_set_reputation_cron(interval_ms) {
            error!("[bundler] Failed to arm reputation timer: {}", e);
        }
    }

    fn status(&self) -> ExecutionStatus {
        let scheduler = self.inner.scheduler.lock();
        let metrics = &self.inner.metrics;
        ExecutionStatus {
            auto_bundle_interval_secs: scheduler.auto_bundle_interval_secs,
            max_pool_size: scheduler.policy.max_pool_size,
            reputation_interval_ms: scheduler.reputation_interval_ms,
            auto_bundle_armed: scheduler
                .auto_bundle_timer
                .as_ref()
                .is_some_and(TimerHandle::is_live),
            reputation_armed: scheduler
                .reputation_timer
                .as_ref()
                .is_some_and(TimerHandle::is_live),
            operations_admitted: metrics.get_operations_admitted(),
            validation_rejections: metrics.get_validation_rejections(),
            admission_rejections: metrics.get_admission_rejections(),
            bundles_sent: metrics.get_bundles_sent(),
            submission_failures: metrics.get_submission_failures(),
            scheduling_failures: metrics.get_scheduling_failures(),
            reputation_runs: metrics.get_reputation_runs(),
        }
    }

    fn shutdown(&self) {
        info!("[bundler] Shutting down Execution Manager timers");
        self.inner.cancel_timers();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BundleReceipt;
    use crate::error::AdmissionError;
    use primitive_types::{H256, U256};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Notify;

    const ENTRY_POINT: EntryPoint = [0x5f; 20];

    fn op(nonce: u64) -> UserOperation {
        UserOperation {
            sender: [0x42; 20],
            nonce: U256::from(nonce),
            ..Default::default()
        }
    }

    #[derive(Default)]
    struct MockValidator {
        reject: AtomicBool,
        /// Admission sequences currently between validation and pool insert
        active: Arc<AtomicUsize>,
        max_active: AtomicUsize,
        seen_call_gas: Mutex<Vec<U256>>,
        /// Holds validation open until notified
        gate: Mutex<Option<Arc<Notify>>>,
    }

    #[async_trait]
    impl ValidationCollaborator for MockValidator {
        async fn validate_input_parameters(
            &self,
            user_op: &UserOperation,
            _entry_point: &EntryPoint,
        ) -> std::result::Result<(), ValidationError> {
            self.seen_call_gas.lock().push(user_op.call_gas_limit);
            if self.reject.load(Ordering::SeqCst) {
                return Err(ValidationError::MissingField("signature"));
            }
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            let gate = self.gate.lock().clone();
            if let Some(gate) = gate {
                gate.notified().await;
            }
            tokio::task::yield_now().await;
            Ok(())
        }

        async fn compute_identity_hash(
            &self,
            user_op: &UserOperation,
            _entry_point: &EntryPoint,
        ) -> std::result::Result<UserOpHash, ValidationError> {
            let mut bytes = [0u8; 32];
            user_op.nonce.to_big_endian(&mut bytes);
            Ok(UserOpHash(H256::from(bytes)))
        }
    }

    struct MockPool {
        entries: Mutex<Vec<UserOpHash>>,
        active: Arc<AtomicUsize>,
    }

    impl MockPool {
        fn new(active: Arc<AtomicUsize>) -> Self {
            Self {
                entries: Mutex::new(Vec::new()),
                active,
            }
        }

        fn drain(&self) -> Vec<UserOpHash> {
            std::mem::take(&mut *self.entries.lock())
        }
    }

    #[async_trait]
    impl PendingPool for MockPool {
        async fn add_operation(
            &self,
            request: AdmissionRequest,
        ) -> std::result::Result<(), AdmissionError> {
            tokio::task::yield_now().await;
            let mut entries = self.entries.lock();
            let result = if entries.contains(&request.user_op_hash) {
                Err(AdmissionError::Duplicate(request.user_op_hash))
            } else {
                entries.push(request.user_op_hash);
                Ok(())
            };
            self.active.fetch_sub(1, Ordering::SeqCst);
            result
        }

        async fn count(&self) -> usize {
            self.entries.lock().len()
        }
    }

    struct MockAssembler {
        pool: Arc<MockPool>,
        sends: AtomicUsize,
        reconciliations: AtomicUsize,
        fail: AtomicBool,
        /// Order of calls: 's' = send, 'h' = handle_past_events
        calls: Mutex<String>,
        /// (pooled entries, admissions in flight) at each send
        seen_at_send: Mutex<Vec<(usize, usize)>>,
    }

    impl MockAssembler {
        fn new(pool: Arc<MockPool>) -> Self {
            Self {
                pool,
                sends: AtomicUsize::new(0),
                reconciliations: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
                calls: Mutex::new(String::new()),
                seen_at_send: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl BundleAssembler for MockAssembler {
        async fn send_next_bundle(&self) -> Result<Option<BundleReceipt>> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            self.calls.lock().push('s');
            self.seen_at_send.lock().push((
                self.pool.entries.lock().len(),
                self.pool.active.load(Ordering::SeqCst),
            ));
            if self.fail.load(Ordering::SeqCst) {
                return Err(ExecutionError::SubmissionFailure("node unreachable".into()));
            }
            let included = self.pool.drain();
            if included.is_empty() {
                return Ok(None);
            }
            Ok(Some(BundleReceipt {
                transaction_hash: H256::repeat_byte(0xbb),
                user_op_hashes: included,
            }))
        }

        async fn handle_past_events(&self) -> Result<()> {
            self.reconciliations.fetch_add(1, Ordering::SeqCst);
            self.calls.lock().push('h');
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockTracker {
        runs: AtomicUsize,
    }

    #[async_trait]
    impl ReputationTracker for MockTracker {
        async fn run_periodic_maintenance(&self) {
            self.runs.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Harness {
        manager: Arc<ExecutionManager>,
        validator: Arc<MockValidator>,
        pool: Arc<MockPool>,
        assembler: Arc<MockAssembler>,
        tracker: Arc<MockTracker>,
    }

    fn harness() -> Harness {
        let validator = Arc::new(MockValidator::default());
        let pool = Arc::new(MockPool::new(Arc::clone(&validator.active)));
        let assembler = Arc::new(MockAssembler::new(Arc::clone(&pool)));
        let tracker = Arc::new(MockTracker::default());
        let manager = Arc::new(ExecutionManager::new(
            validator.clone(),
            pool.clone(),
            assembler.clone(),
            tracker.clone(),
        ));
        Harness {
            manager,
            validator,
            pool,
            assembler,
            tracker,
        }
    }

    #[tokio::test]
    async fn test_starts_in_manual_mode() {
        let h = harness();
        let status = h.manager.status();
        assert_eq!(status.auto_bundle_interval_secs, 0);
        assert_eq!(status.max_pool_size, 0);
        assert!(!status.auto_bundle_armed);
        assert!(!status.reputation_armed);
    }

    #[tokio::test]
    async fn test_threshold_one_sends_each_operation() {
        let h = harness();
        h.manager.set_auto_bundler(0, 1);

        h.manager.send_user_operation(op(1), ENTRY_POINT).await.unwrap();

        assert_eq!(h.assembler.sends.load(Ordering::SeqCst), 1);
        assert_eq!(h.assembler.reconciliations.load(Ordering::SeqCst), 0);
        assert_eq!(h.pool.count().await, 0);
    }

    #[tokio::test]
    async fn test_auto_mining_reconciles_after_send() {
        let h = harness();
        h.manager.set_auto_bundler(0, 0);

        h.manager.send_user_operation(op(1), ENTRY_POINT).await.unwrap();

        assert_eq!(*h.assembler.calls.lock(), "sh");
    }

    #[tokio::test]
    async fn test_threshold_five() {
        let h = harness();
        h.manager.set_auto_bundler(0, 5);

        for nonce in 0..4 {
            h.manager.send_user_operation(op(nonce), ENTRY_POINT).await.unwrap();
        }
        assert_eq!(h.assembler.sends.load(Ordering::SeqCst), 0);
        assert_eq!(h.pool.count().await, 4);

        h.manager.send_user_operation(op(4), ENTRY_POINT).await.unwrap();
        assert_eq!(h.assembler.sends.load(Ordering::SeqCst), 1);
        assert_eq!(h.manager.status().bundles_sent, 1);
    }

    #[tokio::test]
    async fn test_below_threshold_attempt_is_noop() {
        let h = harness();
        h.manager.set_auto_bundler(0, 10);
        h.manager.send_user_operation(op(1), ENTRY_POINT).await.unwrap();

        let attempt = h.manager.attempt_bundle(false).await.unwrap();
        assert_eq!(
            attempt,
            BundleAttempt::Skipped {
                pool_size: 1,
                threshold: 10
            }
        );
        assert_eq!(h.assembler.sends.load(Ordering::SeqCst), 0);
        assert_eq!(h.pool.count().await, 1);
    }

    #[tokio::test]
    async fn test_forced_attempt_ignores_threshold() {
        let h = harness();
        h.manager.set_auto_bundler(0, 10);
        h.manager.send_user_operation(op(1), ENTRY_POINT).await.unwrap();

        let attempt = h.manager.attempt_bundle(true).await.unwrap();
        assert_eq!(attempt.receipt().map(|r| r.user_op_hashes.len()), Some(1));
        assert_eq!(h.pool.count().await, 0);
    }

    #[tokio::test]
    async fn test_forced_attempt_on_empty_pool() {
        let h = harness();
        h.manager.set_auto_bundler(0, 10);
        let attempt = h.manager.attempt_bundle(true).await.unwrap();
        assert_eq!(attempt, BundleAttempt::NothingToSend);
    }

    #[tokio::test]
    async fn test_validation_failure_leaves_pool_untouched() {
        let h = harness();
        h.manager.set_auto_bundler(0, 0);
        h.validator.reject.store(true, Ordering::SeqCst);

        let err = h
            .manager
            .send_user_operation(op(1), ENTRY_POINT)
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutionError::Validation(_)));
        assert_eq!(h.pool.count().await, 0);
        assert_eq!(h.assembler.sends.load(Ordering::SeqCst), 0);
        let status = h.manager.status();
        assert_eq!(status.validation_rejections, 1);
        assert_eq!(status.admission_rejections, 0);
    }

    #[tokio::test]
    async fn test_duplicate_rejected_by_pool() {
        let h = harness();
        h.manager.set_auto_bundler(0, 100);

        h.manager.send_user_operation(op(7), ENTRY_POINT).await.unwrap();
        let err = h
            .manager
            .send_user_operation(op(7), ENTRY_POINT)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ExecutionError::Admission(AdmissionError::Duplicate(_))
        ));
        assert_eq!(h.pool.count().await, 1);
        let status = h.manager.status();
        assert_eq!(status.operations_admitted, 1);
        assert_eq!(status.admission_rejections, 1);
        assert_eq!(status.validation_rejections, 0);
    }

    #[tokio::test]
    async fn test_send_failure_not_reported_to_submitter() {
        let h = harness();
        h.manager.set_auto_bundler(0, 1);
        h.assembler.fail.store(true, Ordering::SeqCst);

        let result = h.manager.send_user_operation(op(1), ENTRY_POINT).await;

        assert!(result.is_ok());
        assert_eq!(h.pool.count().await, 1);
        assert_eq!(h.manager.status().submission_failures, 1);
    }

    #[tokio::test]
    async fn test_gas_overrides_applied_before_validation() {
        let h = harness();
        h.manager.set_gas_overrides(Some(GasLimitOverrides {
            call_gas_limit: Some(U256::from(0xfffffu64)),
            ..Default::default()
        }));
        h.manager.set_auto_bundler(0, 100);

        h.manager.send_user_operation(op(1), ENTRY_POINT).await.unwrap();

        assert_eq!(
            h.validator.seen_call_gas.lock().as_slice(),
            &[U256::from(0xfffffu64)]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_admissions_are_serialized() {
        let h = harness();
        h.manager.set_auto_bundler(0, 1_000);

        let tasks: Vec<_> = (0..64u64)
            .map(|nonce| {
                let manager = Arc::clone(&h.manager);
                tokio::spawn(async move { manager.send_user_operation(op(nonce), ENTRY_POINT).await })
            })
            .collect();

        let mut admitted = HashSet::new();
        for task in tasks {
            admitted.insert(task.await.unwrap().unwrap());
        }

        assert_eq!(h.validator.max_active.load(Ordering::SeqCst), 1);
        assert_eq!(admitted.len(), 64);
        let stored: HashSet<_> = h.pool.entries.lock().iter().copied().collect();
        assert_eq!(stored, admitted);
        assert_eq!(h.pool.entries.lock().len(), 64);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_tick_waits_for_inflight_admission() {
        let h = harness();
        let gate = Arc::new(Notify::new());
        *h.validator.gate.lock() = Some(Arc::clone(&gate));
        h.manager.set_auto_bundler(1, 100);

        let manager = Arc::clone(&h.manager);
        let admission =
            tokio::spawn(async move { manager.send_user_operation(op(1), ENTRY_POINT).await });

        // Several ticks elapse while validation is held open
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(h.assembler.sends.load(Ordering::SeqCst), 0);
        assert_eq!(h.validator.active.load(Ordering::SeqCst), 1);
        assert_eq!(h.pool.count().await, 0);

        gate.notify_one();
        let hash = admission.await.unwrap().unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(h.assembler.sends.load(Ordering::SeqCst), 1);
        assert_eq!(*h.assembler.seen_at_send.lock(), vec![(1, 0)]);
        assert_eq!(h.pool.count().await, 0);
        assert_eq!(h.manager.status().operations_admitted, 1);
        assert_ne!(hash, UserOpHash::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_once_per_interval() {
        let h = harness();
        h.manager.set_auto_bundler(1, 100);
        assert!(h.manager.status().auto_bundle_armed);

        tokio::time::sleep(Duration::from_millis(3_500)).await;

        assert_eq!(h.assembler.sends.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconfigure_keeps_single_timer() {
        let h = harness();
        h.manager.set_auto_bundler(1, 100);
        h.manager.set_auto_bundler(2, 100);

        tokio::time::sleep(Duration::from_millis(6_500)).await;

        assert_eq!(h.assembler.sends.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disable_timer() {
        let h = harness();
        h.manager.set_auto_bundler(1, 3);
        h.manager.set_auto_bundler(0, 3);

        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(h.assembler.sends.load(Ordering::SeqCst), 0);
        let status = h.manager.status();
        assert!(!status.auto_bundle_armed);
        assert_eq!(status.max_pool_size, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_survives_failures() {
        let h = harness();
        h.assembler.fail.store(true, Ordering::SeqCst);
        h.manager.set_auto_bundler(1, 100);

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(h.manager.status().scheduling_failures, 2);

        h.assembler.fail.store(false, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(h.assembler.sends.load(Ordering::SeqCst), 3);
        assert_eq!(h.manager.status().scheduling_failures, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reputation_cron() {
        let h = harness();
        h.manager.set_reputation_cron(100);
        assert!(h.manager.status().reputation_armed);

        tokio::time::sleep(Duration::from_millis(550)).await;
        assert_eq!(h.tracker.runs.load(Ordering::SeqCst), 5);
        assert_eq!(h.manager.status().reputation_runs, 5);

        h.manager.set_reputation_cron(0);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(h.tracker.runs.load(Ordering::SeqCst), 5);
        assert!(!h.manager.status().reputation_armed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_both_timers() {
        let h = harness();
        h.manager.set_auto_bundler(1, 100);
        h.manager.set_reputation_cron(1_000);

        h.manager.shutdown();
        tokio::time::sleep(Duration::from_secs(3)).await;

        assert_eq!(h.assembler.sends.load(Ordering::SeqCst), 0);
        assert_eq!(h.tracker.runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_apply_config() {
        let h = harness();
        let config = ExecutionConfig {
            auto_bundle_interval_secs: 30,
            max_pool_size: 8,
            reputation_interval_ms: 60_000,
            gas_overrides: None,
        };

        h.manager.apply_config(&config).unwrap();

        let status = h.manager.status();
        assert_eq!(status.auto_bundle_interval_secs, 30);
        assert_eq!(status.max_pool_size, 8);
        assert_eq!(status.reputation_interval_ms, 60_000);
        assert!(status.auto_bundle_armed);
        assert!(status.reputation_armed);
    }

    #[test]
    fn test_timer_without_runtime_is_an_error() {
        let h = harness();
        let err = h.manager.try_set_auto_bundler(5, 1).unwrap_err();
        assert!(matches!(err, ExecutionError::InvalidConfig(_)));
        assert_eq!(h.manager.status().auto_bundle_interval_secs, 0);
        assert_eq!(h.manager.status().max_pool_size, 1);
    }
}
