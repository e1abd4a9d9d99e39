//! Utility modules for the execution manager

pub mod hashing;
pub mod validation;

pub use hashing::{bundle_hash, keccak256, pack_user_op, user_op_hash};
pub use validation::{AddressPrefixCheck, CompositeCheck, GasFieldsCheck, InputCheck, SignatureCheck};
