//! Auto-bundling policy (threshold-or-forced)
//!
//! Both the admission path and the auto-bundle timer go through
//! [`BundlePolicy::decide`], so they observe the same threshold rule.

use serde::{Deserialize, Serialize};

/// Why a bundling attempt proceeds
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BundleTrigger {
    /// Timer or manual trigger; pool size ignored
    Forced,
    /// Pool size reached the configured threshold
    Threshold,
}

/// Decision taken by the policy for one attempt
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BundleDecision {
    /// Ask the assembler for the next bundle
    Proceed(BundleTrigger),
    /// Quiescent: not forced and below threshold
    Skip,
}

impl BundleDecision {
    /// True if the assembler should be called
    pub fn proceeds(&self) -> bool {
        matches!(self, Self::Proceed(_))
    }
}

/// Size-threshold policy.
///
/// A threshold of `0` is auto-mining: every admission is sent immediately and
/// the pool is reconciled against observed inclusions after each send.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundlePolicy {
    /// Pool size at which a non-forced attempt proceeds
    pub max_pool_size: usize,
}

impl BundlePolicy {
    /// Create a policy with the given threshold
    pub fn new(max_pool_size: usize) -> Self {
        Self { max_pool_size }
    }

    /// Decide whether an attempt proceeds
    pub fn decide(&self, force: bool, pool_size: usize) -> BundleDecision {
        if force {
            BundleDecision::Proceed(BundleTrigger::Forced)
        } else if pool_size >= self.max_pool_size {
            BundleDecision::Proceed(BundleTrigger::Threshold)
        } else {
            BundleDecision::Skip
        }
    }

    /// Auto-mining mode (threshold 0)
    pub fn is_auto_mining(&self) -> bool {
        self.max_pool_size == 0
    }

    /// Whether the pool must be reconciled after a send
    pub fn reconciles_after_send(&self) -> bool {
        self.is_auto_mining()
    }
}
