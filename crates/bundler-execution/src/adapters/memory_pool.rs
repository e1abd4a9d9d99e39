//! In-process pending pool
//!
//! ## Data Structures
//!
//! - `by_hash`: O(1) lookup by operation identity
//! - `by_arrival`: admission order (bundles are taken oldest first)
//! - `by_sender`: nonce slots per sender account
//!
//! ## Invariants
//!
//! - No duplicate identities (checked in `add_operation`)
//! - At most one pending operation per (sender, nonce)
//! - Size never exceeds `capacity`

use crate::domain::{AdmissionRequest, Address, UserOpHash};
use crate::error::AdmissionError;
use crate::ports::PendingPool;
use async_trait::async_trait;
use parking_lot::RwLock;
use primitive_types::U256;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Default pool capacity
pub const DEFAULT_POOL_CAPACITY: usize = 4_096;

/// An admitted operation with its admission sequence number
#[derive(Clone, Debug)]
pub struct PoolEntry {
    /// What was admitted
    pub request: AdmissionRequest,

    /// Monotonic admission counter
    pub sequence: u64,
}

#[derive(Debug, Default)]
struct PoolState {
    by_hash: HashMap<UserOpHash, PoolEntry>,
    by_arrival: BTreeMap<u64, UserOpHash>,
    by_sender: HashMap<Address, BTreeMap<U256, UserOpHash>>,
    next_sequence: u64,
}

impl PoolState {
    fn remove(&mut self, hash: &UserOpHash) -> Option<PoolEntry> {
        let entry = self.by_hash.remove(hash)?;
        self.by_arrival.remove(&entry.sequence);

        let sender = entry.request.user_op.sender;
        if let Some(nonces) = self.by_sender.get_mut(&sender) {
            nonces.remove(&entry.request.user_op.nonce);
            if nonces.is_empty() {
                self.by_sender.remove(&sender);
            }
        }
        Some(entry)
    }
}

/// Pending pool held in memory, keyed by identity
#[derive(Debug)]
pub struct InMemoryPendingPool {
    capacity: usize,
    state: RwLock<PoolState>,
}

impl InMemoryPendingPool {
    /// Creates an empty pool with the given capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: RwLock::new(PoolState::default()),
        }
    }

    /// Returns the configured capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of entries
    pub fn len(&self) -> usize {
        self.state.read().by_hash.len()
    }

    /// Returns true if the pool is empty
    pub fn is_empty(&self) -> bool {
        self.state.read().by_hash.is_empty()
    }

    /// Checks if an identity is in the pool
    pub fn contains(&self, hash: &UserOpHash) -> bool {
        self.state.read().by_hash.contains_key(hash)
    }

    /// Gets an entry by identity
    pub fn get(&self, hash: &UserOpHash) -> Option<PoolEntry> {
        self.state.read().by_hash.get(hash).cloned()
    }

    /// Identities in admission order
    pub fn hashes(&self) -> Vec<UserOpHash> {
        self.state.read().by_arrival.values().copied().collect()
    }

    /// Atomically remove and return up to `max` oldest entries
    pub fn take_batch(&self, max: usize) -> Vec<PoolEntry> {
        let mut state = self.state.write();
        let selected: Vec<UserOpHash> = state.by_arrival.values().take(max).copied().collect();
        selected
            .iter()
            .filter_map(|hash| state.remove(hash))
            .collect()
    }

    /// Remove one entry; returns false if it was not present
    pub fn remove(&self, hash: &UserOpHash) -> bool {
        self.state.write().remove(hash).is_some()
    }
}

impl Default for InMemoryPendingPool {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_CAPACITY)
    }
}

#[async_trait]
impl PendingPool for InMemoryPendingPool {
    async fn add_operation(&self, request: AdmissionRequest) -> Result<(), AdmissionError> {
        let mut state = self.state.write();
        let hash = request.user_op_hash;

        if state.by_hash.contains_key(&hash) {
            return Err(AdmissionError::Duplicate(hash));
        }

        let sender = request.user_op.sender;
        let nonce = request.user_op.nonce;
        if state
            .by_sender
            .get(&sender)
            .is_some_and(|nonces| nonces.contains_key(&nonce))
        {
            return Err(AdmissionError::ConflictingNonce {
                sender,
                nonce: nonce.to_string(),
            });
        }

        if state.by_hash.len() >= self.capacity {
            return Err(AdmissionError::PoolFull {
                capacity: self.capacity,
            });
        }

        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state.by_arrival.insert(sequence, hash);
        state.by_sender.entry(sender).or_default().insert(nonce, hash);
        state.by_hash.insert(hash, PoolEntry { request, sequence });

        debug!(%hash, size = state.by_hash.len(), "[bundler] Pool entry added");
        Ok(())
    }

    async fn count(&self) -> usize {
        self.len()
    }
}
