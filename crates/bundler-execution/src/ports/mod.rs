//! Hexagonal architecture ports

pub mod inbound;
pub mod outbound;

pub use inbound::{ExecutionManagerApi, ExecutionStatus};
pub use outbound::{BundleAssembler, PendingPool, ReputationTracker, ValidationCollaborator};
