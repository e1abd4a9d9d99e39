//! In-process bundle assembler
//!
//! Takes the oldest entries from an [`InMemoryPendingPool`], records them as
//! sent and reconciles the pool when past events are handled. There is no
//! ledger behind it; the transaction hash is the bundle content hash.
//!
//! Both the receipt history and the set of hashes awaiting reconciliation are
//! bounded. When either is full the oldest entry is dropped.

use super::memory_pool::InMemoryPendingPool;
use crate::domain::{BundleReceipt, UserOpHash};
use crate::error::{ExecutionError, Result};
use crate::ports::BundleAssembler;
use crate::utils::bundle_hash;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Default maximum operations per bundle
pub const DEFAULT_MAX_BUNDLE_SIZE: usize = 16;

/// Receipts kept for inspection
pub const RECENT_RECEIPTS: usize = 64;

/// Sent hashes kept for reconciliation
pub const MAX_AWAITING_INCLUSION: usize = 4_096;

/// Bundle assembler backed by an in-memory pool
pub struct InMemoryBundleAssembler {
    pool: Arc<InMemoryPendingPool>,
    max_bundle_size: usize,
    /// Sent but not yet reconciled, oldest first
    awaiting_inclusion: Mutex<VecDeque<UserOpHash>>,
    /// Most recent receipts, oldest first
    recent: Mutex<VecDeque<BundleReceipt>>,
    bundles_sent: AtomicU64,
}

impl InMemoryBundleAssembler {
    /// Creates an assembler over `pool`
    pub fn new(pool: Arc<InMemoryPendingPool>, max_bundle_size: usize) -> Result<Self> {
        if max_bundle_size == 0 {
            return Err(ExecutionError::InvalidConfig(
                "max bundle size must be greater than 0".into(),
            ));
        }
        Ok(Self {
            pool,
            max_bundle_size,
            awaiting_inclusion: Mutex::new(VecDeque::new()),
            recent: Mutex::new(VecDeque::with_capacity(RECENT_RECEIPTS)),
            bundles_sent: AtomicU64::new(0),
        })
    }

    /// Maximum operations per bundle
    pub fn max_bundle_size(&self) -> usize {
        self.max_bundle_size
    }

    /// The most recent receipts, oldest first (at most [`RECENT_RECEIPTS`])
    pub fn sent_bundles(&self) -> Vec<BundleReceipt> {
        self.recent.lock().iter().cloned().collect()
    }

    /// Total bundles sent since creation
    pub fn bundles_sent(&self) -> u64 {
        self.bundles_sent.load(Ordering::Relaxed)
    }

    /// Operations sent but not yet reconciled
    pub fn awaiting_inclusion(&self) -> usize {
        self.awaiting_inclusion.lock().len()
    }
}

#[async_trait]
impl BundleAssembler for InMemoryBundleAssembler {
    async fn send_next_bundle(&self) -> Result<Option<BundleReceipt>> {
        let batch = self.pool.take_batch(self.max_bundle_size);
        if batch.is_empty() {
            debug!("[bundler] No eligible entries for a bundle");
            return Ok(None);
        }

        let user_op_hashes: Vec<UserOpHash> =
            batch.iter().map(|entry| entry.request.user_op_hash).collect();
        let receipt = BundleReceipt {
            transaction_hash: bundle_hash(&user_op_hashes),
            user_op_hashes,
        };

        {
            let mut awaiting = self.awaiting_inclusion.lock();
            awaiting.extend(receipt.user_op_hashes.iter().copied());
            let overflow = awaiting.len().saturating_sub(MAX_AWAITING_INCLUSION);
            awaiting.drain(..overflow);
        }
        {
            let mut recent = self.recent.lock();
            if recent.len() == RECENT_RECEIPTS {
                recent.pop_front();
            }
            recent.push_back(receipt.clone());
        }
        self.bundles_sent.fetch_add(1, Ordering::Relaxed);

        info!(
            tx = ?receipt.transaction_hash,
            ops = receipt.user_op_hashes.len(),
            "[bundler] Bundle sent"
        );
        Ok(Some(receipt))
    }

    async fn handle_past_events(&self) -> Result<()> {
        let included = std::mem::take(&mut *self.awaiting_inclusion.lock());
        let mut evicted = 0usize;
        for hash in included.iter() {
            // Entries re-admitted after being sent are dropped once included
            if self.pool.remove(hash) {
                evicted += 1;
            }
        }
        debug!(
            reconciled = included.len(),
            evicted,
            "[bundler] Pool reconciled against inclusions"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AdmissionRequest, UserOperation, ValidationVerdict};
    use crate::ports::PendingPool;
    use primitive_types::U256;

    fn request(sender: u8) -> AdmissionRequest {
        let user_op = UserOperation {
            sender: [sender; 20],
            nonce: U256::zero(),
            ..Default::default()
        };
        AdmissionRequest::from_verdict(
            true,
            user_op,
            UserOpHash::from([sender; 32]),
            ValidationVerdict::placeholder(),
        )
    }

    async fn filled_pool(n: u8) -> Arc<InMemoryPendingPool> {
        let pool = Arc::new(InMemoryPendingPool::new(64));
        for sender in 1..=n {
            pool.add_operation(request(sender)).await.unwrap();
        }
        pool
    }

    #[test]
    fn test_zero_bundle_size_rejected() {
        let pool = Arc::new(InMemoryPendingPool::new(1));
        assert!(matches!(
            InMemoryBundleAssembler::new(pool, 0),
            Err(ExecutionError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_pool_sends_nothing() {
        let pool = Arc::new(InMemoryPendingPool::new(4));
        let assembler = InMemoryBundleAssembler::new(pool, 4).unwrap();

        assert_eq!(assembler.send_next_bundle().await.unwrap(), None);
        assert!(assembler.sent_bundles().is_empty());
    }

    #[tokio::test]
    async fn test_bundle_respects_max_size() {
        let pool = filled_pool(5).await;
        let assembler = InMemoryBundleAssembler::new(pool.clone(), 3).unwrap();

        let receipt = assembler.send_next_bundle().await.unwrap().unwrap();
        assert_eq!(receipt.user_op_hashes.len(), 3);
        assert_eq!(receipt.transaction_hash, bundle_hash(&receipt.user_op_hashes));
        assert_eq!(pool.len(), 2);
        assert_eq!(assembler.awaiting_inclusion(), 3);
    }

    #[tokio::test]
    async fn test_consecutive_sends_do_not_overlap() {
        let pool = filled_pool(4).await;
        let assembler = InMemoryBundleAssembler::new(pool, 2).unwrap();

        let first = assembler.send_next_bundle().await.unwrap().unwrap();
        let second = assembler.send_next_bundle().await.unwrap().unwrap();
        assert!(first
            .user_op_hashes
            .iter()
            .all(|hash| !second.user_op_hashes.contains(hash)));
        assert_eq!(assembler.send_next_bundle().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_reconcile_evicts_readmitted_entries() {
        let pool = filled_pool(1).await;
        let assembler = InMemoryBundleAssembler::new(pool.clone(), 4).unwrap();

        assembler.send_next_bundle().await.unwrap();
        pool.add_operation(request(1)).await.unwrap();
        assert_eq!(pool.len(), 1);

        assembler.handle_past_events().await.unwrap();
        assert!(pool.is_empty());
        assert_eq!(assembler.awaiting_inclusion(), 0);
    }

    #[tokio::test]
    async fn test_history_stays_bounded_without_reconciliation() {
        let pool = Arc::new(InMemoryPendingPool::new(16));
        let assembler = InMemoryBundleAssembler::new(pool.clone(), 1).unwrap();
        let total = MAX_AWAITING_INCLUSION + 500;

        for nonce in 0..total {
            let mut req = request(1);
            req.user_op.nonce = U256::from(nonce);
            let mut hash = [0u8; 32];
            hash[24..].copy_from_slice(&(nonce as u64).to_be_bytes());
            req.user_op_hash = UserOpHash::from(hash);
            pool.add_operation(req).await.unwrap();
            assembler.send_next_bundle().await.unwrap().unwrap();
        }

        assert_eq!(assembler.bundles_sent(), total as u64);
        assert_eq!(assembler.sent_bundles().len(), RECENT_RECEIPTS);
        assert_eq!(assembler.awaiting_inclusion(), MAX_AWAITING_INCLUSION);

        let last = assembler.sent_bundles().pop().unwrap();
        let mut expected = [0u8; 32];
        expected[24..].copy_from_slice(&((total - 1) as u64).to_be_bytes());
        assert_eq!(last.user_op_hashes, vec![UserOpHash::from(expected)]);
    }
}
