//! Reference adapters for the outbound ports
//!
//! In-process implementations used by the node binary and the tests.

pub mod assembler;
pub mod memory_pool;
pub mod reputation;
pub mod validator;

pub use assembler::{
    InMemoryBundleAssembler, DEFAULT_MAX_BUNDLE_SIZE, MAX_AWAITING_INCLUSION, RECENT_RECEIPTS,
};
pub use memory_pool::{InMemoryPendingPool, PoolEntry, DEFAULT_POOL_CAPACITY};
pub use reputation::NoopReputationTracker;
pub use validator::BasicInputValidator;
