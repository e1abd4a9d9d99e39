//! Outbound ports (driven side - SPI)
//!
//! Collaborators the execution manager drives. Each implementation owns its
//! own algorithm; the manager only decides when to call it.

use crate::domain::{
    AdmissionRequest, BundleReceipt, EntryPoint, UserOpHash, UserOperation, ValidationVerdict,
};
use crate::error::{AdmissionError, Result, ValidationError};
use async_trait::async_trait;

/// Port: Operation validation and identity
#[async_trait]
pub trait ValidationCollaborator: Send + Sync {
    /// Check well-formedness of an operation against the target entry point
    async fn validate_input_parameters(
        &self,
        user_op: &UserOperation,
        entry_point: &EntryPoint,
    ) -> std::result::Result<(), ValidationError>;

    /// Deterministic identity of the operation for the given entry point
    async fn compute_identity_hash(
        &self,
        user_op: &UserOperation,
        entry_point: &EntryPoint,
    ) -> std::result::Result<UserOpHash, ValidationError>;

    /// Simulate the operation and estimate its cost and attribution.
    ///
    /// The default returns [`ValidationVerdict::placeholder`]. Backends with a
    /// real simulator override this.
    async fn validate_and_estimate(
        &self,
        _user_op: &UserOperation,
        _entry_point: &EntryPoint,
        _user_op_hash: &UserOpHash,
    ) -> std::result::Result<ValidationVerdict, ValidationError> {
        Ok(ValidationVerdict::placeholder())
    }
}

/// Port: Pending pool of admitted operations
///
/// Deduplication by identity is the pool's responsibility.
#[async_trait]
pub trait PendingPool: Send + Sync {
    /// Admit an operation
    async fn add_operation(
        &self,
        request: AdmissionRequest,
    ) -> std::result::Result<(), AdmissionError>;

    /// Current number of entries
    async fn count(&self) -> usize;
}

/// Port: Bundle assembly and submission
///
/// Implementations must not hand the same entry to two overlapping sends.
#[async_trait]
pub trait BundleAssembler: Send + Sync {
    /// Select, assemble and submit the next bundle.
    ///
    /// `Ok(None)` means no entry was eligible.
    async fn send_next_bundle(&self) -> Result<Option<BundleReceipt>>;

    /// Reconcile the pool against inclusions already observed on the ledger
    async fn handle_past_events(&self) -> Result<()>;
}

/// Port: Reputation maintenance
///
/// The tracker owns duration and failure handling of its own work.
#[async_trait]
pub trait ReputationTracker: Send + Sync {
    /// Periodic maintenance hook (decay/recompute scores)
    async fn run_periodic_maintenance(&self);
}
