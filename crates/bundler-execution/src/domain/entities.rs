//! Domain entities for the execution manager

use primitive_types::{H256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 20-byte Ethereum-style address.
pub type Address = [u8; 20];

/// Entry point contract an operation targets.
pub type EntryPoint = Address;

/// Canonical identity of an operation (keyed in the pending pool).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserOpHash(pub H256);

impl UserOpHash {
    /// Raw hash bytes
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl From<[u8; 32]> for UserOpHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(H256::from(bytes))
    }
}

impl fmt::Display for UserOpHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0.as_bytes()))
    }
}

/// Client-submitted operation awaiting validation and bundling.
///
/// Limit fields may only be adjusted before validation; once the operation
/// enters the pipeline it is treated as immutable.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserOperation {
    /// Account the operation executes from
    pub sender: Address,

    /// Anti-replay nonce
    pub nonce: U256,

    /// Factory address followed by factory calldata (empty for deployed accounts)
    pub init_code: Vec<u8>,

    /// Calldata executed on the sender account
    pub call_data: Vec<u8>,

    /// Execution cost bound
    pub call_gas_limit: U256,

    /// Verification cost bound
    pub verification_gas_limit: U256,

    /// Gas charged for bundle overhead
    pub pre_verification_gas: U256,

    /// Base-fee bound
    pub max_fee_per_gas: U256,

    /// Priority-fee bound
    pub max_priority_fee_per_gas: U256,

    /// Paymaster address followed by paymaster data (empty if self-paying)
    pub paymaster_and_data: Vec<u8>,

    /// Account signature over the operation hash
    pub signature: Vec<u8>,
}

impl UserOperation {
    /// Factory address taken from the first 20 bytes of `init_code`
    pub fn factory(&self) -> Option<Address> {
        leading_address(&self.init_code)
    }

    /// Paymaster address taken from the first 20 bytes of `paymaster_and_data`
    pub fn paymaster(&self) -> Option<Address> {
        leading_address(&self.paymaster_and_data)
    }
}

fn leading_address(bytes: &[u8]) -> Option<Address> {
    let head = bytes.get(..20)?;
    let mut addr = [0u8; 20];
    addr.copy_from_slice(head);
    Some(addr)
}

/// Stake attribution for a participant (sender, paymaster, factory, aggregator)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeInfo {
    /// Participant address
    pub addr: Address,

    /// Stake deposited with the entry point
    pub stake: U256,

    /// Unstake delay in seconds
    pub unstake_delay_sec: u64,
}

/// Cost estimate and validity window returned by simulation
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnInfo {
    /// Gas consumed before execution
    pub pre_op_gas: U256,

    /// Amount the payer must prefund
    pub prefund: U256,

    /// Signature check failed (aggregated/deferred signatures)
    pub sig_failed: bool,

    /// Operation valid from this timestamp (0 = immediately)
    pub valid_after: u64,

    /// Operation valid until this timestamp (0 = no expiry)
    pub valid_until: u64,
}

/// External contracts touched during validation, for storage-access tracking
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferencedContracts {
    /// Contract addresses
    pub addresses: Vec<Address>,

    /// Digest over the contracts' code
    pub hash: H256,
}

/// Result of validating one operation. Created once, never mutated.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    /// Cost breakdown
    pub return_info: ReturnInfo,

    /// Sender attribution
    pub sender_info: StakeInfo,

    /// Contracts referenced during validation
    pub referenced_contracts: ReferencedContracts,

    /// Paymaster attribution
    pub paymaster_info: Option<StakeInfo>,

    /// Factory attribution
    pub factory_info: Option<StakeInfo>,

    /// Aggregator attribution
    pub aggregator_info: Option<StakeInfo>,
}

impl ValidationVerdict {
    /// Conservative verdict used when no simulation backend is plugged in:
    /// zeroed cost estimates and empty attribution.
    pub fn placeholder() -> Self {
        Self::default()
    }

    /// True if the verdict carries no estimate at all
    pub fn is_placeholder(&self) -> bool {
        *self == Self::placeholder()
    }
}

/// Everything the pending pool needs to admit one operation.
#[derive(Clone, Debug)]
pub struct AdmissionRequest {
    /// Submitted through this bundler's own intake (not gossiped)
    pub is_local: bool,

    /// The operation itself
    pub user_op: UserOperation,

    /// Canonical identity
    pub user_op_hash: UserOpHash,

    /// Prefund estimate from the verdict
    pub prefund: U256,

    /// Referenced contracts from the verdict
    pub referenced_contracts: ReferencedContracts,

    /// Sender attribution
    pub sender_info: StakeInfo,

    /// Paymaster attribution
    pub paymaster_info: Option<StakeInfo>,

    /// Factory attribution
    pub factory_info: Option<StakeInfo>,

    /// Aggregator attribution
    pub aggregator_info: Option<StakeInfo>,
}

impl AdmissionRequest {
    /// Build an admission request from a validated operation and its verdict
    pub fn from_verdict(
        is_local: bool,
        user_op: UserOperation,
        user_op_hash: UserOpHash,
        verdict: ValidationVerdict,
    ) -> Self {
        Self {
            is_local,
            user_op,
            user_op_hash,
            prefund: verdict.return_info.prefund,
            referenced_contracts: verdict.referenced_contracts,
            sender_info: verdict.sender_info,
            paymaster_info: verdict.paymaster_info,
            factory_info: verdict.factory_info,
            aggregator_info: verdict.aggregator_info,
        }
    }
}

/// Receipt for a bundle handed to the downstream ledger
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleReceipt {
    /// Hash of the submitted bundle transaction
    pub transaction_hash: H256,

    /// Operations included, in bundle order
    pub user_op_hashes: Vec<UserOpHash>,
}

/// Outcome of one `attempt_bundle` call
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BundleAttempt {
    /// Threshold not met and not forced; nothing happened
    Skipped {
        /// Pool size observed
        pool_size: usize,
        /// Threshold in force
        threshold: usize,
    },

    /// Assembler ran but found no eligible entries
    NothingToSend,

    /// A bundle was submitted
    Sent(BundleReceipt),
}

impl BundleAttempt {
    /// Receipt, if a bundle went out
    pub fn receipt(&self) -> Option<&BundleReceipt> {
        match self {
            Self::Sent(receipt) => Some(receipt),
            _ => None,
        }
    }

    /// True if the policy did not proceed
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}
