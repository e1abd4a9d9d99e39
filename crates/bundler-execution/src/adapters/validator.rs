//! Input validator without a simulation backend
//!
//! Checks the entry point and input parameters, computes the canonical
//! identity, and keeps the placeholder verdict from the port.

use crate::domain::{EntryPoint, UserOpHash, UserOperation};
use crate::error::ValidationError;
use crate::ports::ValidationCollaborator;
use crate::utils::{user_op_hash, CompositeCheck, InputCheck};
use async_trait::async_trait;
use tracing::trace;

/// Validator for a fixed set of entry points on one chain
pub struct BasicInputValidator {
    supported_entry_points: Vec<EntryPoint>,
    chain_id: u64,
    checks: CompositeCheck,
}

impl BasicInputValidator {
    /// Creates a validator running the standard checks
    pub fn new(supported_entry_points: Vec<EntryPoint>, chain_id: u64) -> Self {
        Self::with_checks(supported_entry_points, chain_id, CompositeCheck::standard())
    }

    /// Creates a validator with a custom check chain
    pub fn with_checks(
        supported_entry_points: Vec<EntryPoint>,
        chain_id: u64,
        checks: CompositeCheck,
    ) -> Self {
        Self {
            supported_entry_points,
            chain_id,
            checks,
        }
    }

    /// Chain id mixed into every identity
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn ensure_supported(&self, entry_point: &EntryPoint) -> Result<(), ValidationError> {
        if self.supported_entry_points.contains(entry_point) {
            Ok(())
        } else {
            Err(ValidationError::UnsupportedEntryPoint(format!(
                "0x{}",
                hex::encode(entry_point)
            )))
        }
    }
}

#[async_trait]
impl ValidationCollaborator for BasicInputValidator {
    async fn validate_input_parameters(
        &self,
        user_op: &UserOperation,
        entry_point: &EntryPoint,
    ) -> Result<(), ValidationError> {
        self.ensure_supported(entry_point)?;
        self.checks.check(user_op)?;
        trace!(sender = %hex::encode(user_op.sender), "[bundler] Input parameters ok");
        Ok(())
    }

    async fn compute_identity_hash(
        &self,
        user_op: &UserOperation,
        entry_point: &EntryPoint,
    ) -> Result<UserOpHash, ValidationError> {
        self.ensure_supported(entry_point)?;
        Ok(user_op_hash(user_op, entry_point, self.chain_id))
    }
}
