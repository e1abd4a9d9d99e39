//! Domain layer - Pure logic for the execution manager
//!
//! No I/O and no async in here. The service layer owns locking and timers.
//!
//! ## Entities
//!
//! - [`UserOperation`]: client request with resource-limit fields
//! - [`ValidationVerdict`]: cost estimate and attribution, created once per admission
//! - [`AdmissionRequest`]: what the pending pool receives
//! - [`BundleReceipt`] / [`BundleAttempt`]: outcomes of a bundling attempt
//!
//! ## Services
//!
//! - [`BundlePolicy`]: threshold-or-forced decision shared by every trigger
//! - [`GasLimitOverrides`]: limit adjustment applied strictly before validation

mod entities;
pub mod overrides;
pub mod policy;

pub use entities::*;
pub use overrides::GasLimitOverrides;
pub use policy::{BundleDecision, BundlePolicy, BundleTrigger};
