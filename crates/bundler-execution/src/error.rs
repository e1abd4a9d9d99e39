//! Error types for the execution manager

use crate::domain::{Address, UserOpHash};
use thiserror::Error;

/// Result type alias for execution manager operations
pub type Result<T> = std::result::Result<T, ExecutionError>;

/// Rejections raised while checking an operation before admission.
///
/// The caller must not retry without modifying the operation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Entry point is not served by this bundler
    #[error("Unsupported entry point {0}")]
    UnsupportedEntryPoint(String),

    /// A required field is missing or empty
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// A field is present but cannot be interpreted
    #[error("Malformed {field}: {reason}")]
    MalformedField {
        /// Field name
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// A gas limit that must be positive is zero
    #[error("Zero gas limit: {0}")]
    ZeroGasLimit(&'static str),

    /// Priority fee exceeds the max fee
    #[error("maxPriorityFeePerGas {priority} exceeds maxFeePerGas {max}")]
    PriorityFeeAboveMaxFee {
        /// Priority fee bound
        priority: String,
        /// Max fee bound
        max: String,
    },

    /// Identity hash could not be computed
    #[error("Failed to compute operation hash: {0}")]
    HashUnavailable(String),

    /// Simulation rejected the operation
    #[error("Simulation failed: {0}")]
    SimulationFailed(String),
}

/// Pool-level rejections raised by the pending pool on admission.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AdmissionError {
    /// Identity already present in the pool
    #[error("Operation {0} already in pool")]
    Duplicate(UserOpHash),

    /// Pool has reached capacity
    #[error("Pending pool full (capacity {capacity})")]
    PoolFull {
        /// Configured capacity
        capacity: usize,
    },

    /// Another pending operation already occupies this sender/nonce slot
    #[error("Sender 0x{} already has a pending operation with nonce {nonce}", hex::encode(.sender))]
    ConflictingNonce {
        /// Sender address
        sender: Address,
        /// Conflicting nonce
        nonce: String,
    },

    /// Storage access conflicts with an operation already admitted
    #[error("Conflicting storage access: {0}")]
    ConflictingStorageAccess(String),
}

/// Errors surfaced by the execution manager and its collaborators
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Operation failed input validation
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Pool rejected the operation
    #[error("Admission error: {0}")]
    Admission(#[from] AdmissionError),

    /// Downstream bundle submission failed
    #[error("Submission failure: {0}")]
    SubmissionFailure(String),

    /// Pool reconciliation against observed inclusions failed
    #[error("Reconciliation failure: {0}")]
    ReconciliationFailure(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ExecutionError {
    /// Check if error leaves the operation pending for a later attempt
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::SubmissionFailure(_) | Self::ReconciliationFailure(_)
        )
    }

    /// Check if error belongs to the submitter and must be returned to them
    pub fn is_attributable_to_submitter(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Admission(_))
    }
}
