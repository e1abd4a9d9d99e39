//! Operator-configured limit overrides, applied before validation

use super::entities::UserOperation;
use primitive_types::U256;
use serde::Deserialize;

/// Replacement values for an operation's resource-limit fields.
///
/// Each `Some` field replaces the operation's value. Overrides are applied
/// before the operation reaches validation and never afterwards.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct GasLimitOverrides {
    /// Verification cost bound
    pub verification_gas_limit: Option<U256>,

    /// Execution cost bound
    pub call_gas_limit: Option<U256>,

    /// Pre-verification gas
    pub pre_verification_gas: Option<U256>,

    /// Base-fee bound
    pub max_fee_per_gas: Option<U256>,

    /// Priority-fee bound
    pub max_priority_fee_per_gas: Option<U256>,
}

impl GasLimitOverrides {
    /// True if no field is overridden
    pub fn is_empty(&self) -> bool {
        self.verification_gas_limit.is_none()
            && self.call_gas_limit.is_none()
            && self.pre_verification_gas.is_none()
            && self.max_fee_per_gas.is_none()
            && self.max_priority_fee_per_gas.is_none()
    }

    /// Apply overrides in place
    pub fn apply(&self, op: &mut UserOperation) {
        if let Some(v) = self.verification_gas_limit {
            op.verification_gas_limit = v;
        }
        if let Some(v) = self.call_gas_limit {
            op.call_gas_limit = v;
        }
        if let Some(v) = self.pre_verification_gas {
            op.pre_verification_gas = v;
        }
        if let Some(v) = self.max_fee_per_gas {
            op.max_fee_per_gas = v;
        }
        if let Some(v) = self.max_priority_fee_per_gas {
            op.max_priority_fee_per_gas = v;
        }
    }
}
