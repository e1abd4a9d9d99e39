//! Input-parameter checks for operations

use crate::domain::UserOperation;
use crate::error::ValidationError;

/// Trait for a single input check
pub trait InputCheck {
    /// Check one operation
    fn check(&self, op: &UserOperation) -> Result<(), ValidationError>;
}

/// Signature must be present
pub struct SignatureCheck;

impl InputCheck for SignatureCheck {
    fn check(&self, op: &UserOperation) -> Result<(), ValidationError> {
        if op.signature.is_empty() {
            return Err(ValidationError::MissingField("signature"));
        }
        Ok(())
    }
}

/// `initCode` and `paymasterAndData` are either empty or start with an address
pub struct AddressPrefixCheck;

impl AddressPrefixCheck {
    fn check_field(field: &'static str, bytes: &[u8]) -> Result<(), ValidationError> {
        if !bytes.is_empty() && bytes.len() < 20 {
            return Err(ValidationError::MalformedField {
                field,
                reason: format!("{} bytes, expected 0 or at least 20", bytes.len()),
            });
        }
        Ok(())
    }
}

impl InputCheck for AddressPrefixCheck {
    fn check(&self, op: &UserOperation) -> Result<(), ValidationError> {
        Self::check_field("initCode", &op.init_code)?;
        Self::check_field("paymasterAndData", &op.paymaster_and_data)
    }
}

/// Gas bounds must be usable
pub struct GasFieldsCheck;

impl InputCheck for GasFieldsCheck {
    fn check(&self, op: &UserOperation) -> Result<(), ValidationError> {
        if op.verification_gas_limit.is_zero() {
            return Err(ValidationError::ZeroGasLimit("verificationGasLimit"));
        }
        if op.pre_verification_gas.is_zero() {
            return Err(ValidationError::ZeroGasLimit("preVerificationGas"));
        }
        if op.max_priority_fee_per_gas > op.max_fee_per_gas {
            return Err(ValidationError::PriorityFeeAboveMaxFee {
                priority: op.max_priority_fee_per_gas.to_string(),
                max: op.max_fee_per_gas.to_string(),
            });
        }
        Ok(())
    }
}

/// Composite check that runs multiple checks in order
pub struct CompositeCheck {
    checks: Vec<Box<dyn InputCheck + Send + Sync>>,
}

impl CompositeCheck {
    /// Creates an empty composite check
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    /// Adds a check to the chain
    pub fn add_check<C: InputCheck + Send + Sync + 'static>(mut self, check: C) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    /// The standard set: signature, address prefixes, gas fields
    pub fn standard() -> Self {
        Self::new()
            .add_check(SignatureCheck)
            .add_check(AddressPrefixCheck)
            .add_check(GasFieldsCheck)
    }
}

impl Default for CompositeCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl InputCheck for CompositeCheck {
    fn check(&self, op: &UserOperation) -> Result<(), ValidationError> {
        for check in &self.checks {
            check.check(op)?;
        }
        Ok(())
    }
}
