//! Hashing utilities for operation identity
//!
//! Identity follows the entry point's `getUserOpHash`:
//!
//! ```text
//! keccak256(abi.encode(keccak256(pack(op)), entryPoint, chainId))
//! ```
//!
//! where `pack` ABI-encodes every static field and replaces each dynamic
//! field (`initCode`, `callData`, `paymasterAndData`) by its keccak256.
//! The signature is not part of the identity.

use crate::domain::{Address, EntryPoint, UserOpHash, UserOperation};
use primitive_types::{H256, U256};
use sha3::{Digest, Keccak256};

/// Compute Keccak-256 hash of data
#[inline]
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Left-pad an address into a 32-byte ABI word
#[inline]
fn address_word(addr: &Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(addr);
    word
}

/// Big-endian 32-byte ABI word
#[inline]
fn u256_word(value: &U256) -> [u8; 32] {
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    word
}

/// ABI-encode an operation without its signature, dynamic fields hashed
pub fn pack_user_op(op: &UserOperation) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(32 * 10);

    bytes.extend_from_slice(&address_word(&op.sender));
    bytes.extend_from_slice(&u256_word(&op.nonce));
    bytes.extend_from_slice(&keccak256(&op.init_code));
    bytes.extend_from_slice(&keccak256(&op.call_data));
    bytes.extend_from_slice(&u256_word(&op.call_gas_limit));
    bytes.extend_from_slice(&u256_word(&op.verification_gas_limit));
    bytes.extend_from_slice(&u256_word(&op.pre_verification_gas));
    bytes.extend_from_slice(&u256_word(&op.max_fee_per_gas));
    bytes.extend_from_slice(&u256_word(&op.max_priority_fee_per_gas));
    bytes.extend_from_slice(&keccak256(&op.paymaster_and_data));

    bytes
}

/// Canonical identity of an operation for an entry point on a chain
pub fn user_op_hash(op: &UserOperation, entry_point: &EntryPoint, chain_id: u64) -> UserOpHash {
    let mut bytes = Vec::with_capacity(96);
    bytes.extend_from_slice(&keccak256(&pack_user_op(op)));
    bytes.extend_from_slice(&address_word(entry_point));
    bytes.extend_from_slice(&u256_word(&U256::from(chain_id)));
    UserOpHash::from(keccak256(&bytes))
}

/// Hash identifying a bundle by its ordered contents
pub fn bundle_hash(user_op_hashes: &[UserOpHash]) -> H256 {
    let mut bytes = Vec::with_capacity(user_op_hashes.len() * 32);
    for hash in user_op_hashes {
        bytes.extend_from_slice(hash.as_bytes());
    }
    H256::from(keccak256(&bytes))
}
