//! # Bundler Execution Manager
//!
//! **Bounded Context:** Operation intake and bundle scheduling
//!
//! ## Purpose
//!
//! The execution manager is the coordination point between operation intake
//! and bundle production:
//! - Validates each submitted operation and admits it to the pending pool
//! - Decides when a bundle is attempted (threshold, forced, timer)
//! - Drives the periodic auto-bundle and reputation timers
//! - Serializes submission so at most one admission or bundle attempt runs
//!
//! It owns no validation, pooling or assembly algorithm. Those live behind
//! the outbound ports.
//!
//! ## Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Adapters (Outer)                                   │
//! │  - InMemoryPendingPool, InMemoryBundleAssembler     │
//! │  - BasicInputValidator, NoopReputationTracker       │
//! └─────────────────────────────────────────────────────┘
//!                         │
//! ┌─────────────────────────────────────────────────────┐
//! │  Ports (Middle)                                     │
//! │  - Inbound: ExecutionManagerApi                     │
//! │  - Outbound: ValidationCollaborator, PendingPool,   │
//! │    BundleAssembler, ReputationTracker               │
//! └─────────────────────────────────────────────────────┘
//!                         │
//! ┌─────────────────────────────────────────────────────┐
//! │  Domain (Inner - Pure Logic)                        │
//! │  - BundlePolicy (threshold / forced decision)       │
//! │  - GasLimitOverrides                                │
//! │  - UserOperation, AdmissionRequest, BundleReceipt   │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Critical Invariants
//!
//! 1. **Serialized Submission**: at most one admission or bundle attempt in flight
//! 2. **Validate Before Admit**: no operation reaches the pool unvalidated
//! 3. **Single Timer**: at most one auto-bundle and one reputation timer armed
//! 4. **Threshold Gate**: a non-forced attempt proceeds only when `pool >= max_pool_size`
//! 5. **Reconcile On Auto-Mine**: with `max_pool_size == 0`, every send is followed
//!    by pool reconciliation
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! let pool = Arc::new(InMemoryPendingPool::new(DEFAULT_POOL_CAPACITY));
//! let manager = ExecutionManager::new(
//!     Arc::new(BasicInputValidator::new(vec![entry_point], chain_id)),
//!     pool.clone(),
//!     Arc::new(InMemoryBundleAssembler::new(pool, DEFAULT_MAX_BUNDLE_SIZE)?),
//!     Arc::new(NoopReputationTracker::new()),
//! );
//! manager.set_auto_bundler(10, 4);
//! let hash = manager.send_user_operation(op, entry_point).await?;
//! ```
//!
//! ## Module Structure
//!
//! - [`domain`]: Pure domain logic (entities, bundle policy, overrides)
//! - [`ports`]: Hexagonal architecture interfaces (inbound/outbound)
//! - [`adapters`]: In-process collaborator implementations
//! - [`service`]: The execution manager itself
//! - [`utils`]: Identity hashing and input checks

#![warn(missing_docs)]
#![warn(clippy::all)]

/// In-process collaborator implementations
pub mod adapters;
/// Domain models and business logic
pub mod domain;
pub mod ports;
pub mod service;
pub mod utils;

mod config;
mod error;
mod metrics;

pub use config::{parse_quantity, ExecutionConfig};
pub use error::{AdmissionError, ExecutionError, Result, ValidationError};
pub use metrics::Metrics;

// Re-export commonly used types
pub use domain::{
    AdmissionRequest, Address, BundleAttempt, BundleDecision, BundlePolicy, BundleReceipt,
    BundleTrigger, EntryPoint, GasLimitOverrides, ReferencedContracts, ReturnInfo, StakeInfo,
    UserOpHash, UserOperation, ValidationVerdict,
};

pub use ports::{
    BundleAssembler, ExecutionManagerApi, ExecutionStatus, PendingPool, ReputationTracker,
    ValidationCollaborator,
};

pub use adapters::{
    BasicInputValidator, InMemoryBundleAssembler, InMemoryPendingPool, NoopReputationTracker,
    DEFAULT_MAX_BUNDLE_SIZE, DEFAULT_POOL_CAPACITY,
};

pub use service::ExecutionManager;

/// Auto-bundle interval when none is configured (manual mode)
pub const DEFAULT_AUTO_BUNDLE_INTERVAL_SECS: u64 = 0;

/// Threshold when none is configured (auto-mining)
pub const DEFAULT_MAX_POOL_SIZE: usize = 0;

/// Reputation interval when none is configured (disabled)
pub const DEFAULT_REPUTATION_INTERVAL_MS: u64 = 0;
