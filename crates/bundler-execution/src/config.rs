//! Configuration types for the execution manager

use crate::domain::GasLimitOverrides;
use crate::error::{ExecutionError, Result};
use primitive_types::U256;
use serde::Deserialize;
use std::env;

/// Runtime configuration for the execution manager
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Auto-bundle interval in seconds (0 = manual mode)
    pub auto_bundle_interval_secs: u64,

    /// Pool size that triggers a bundle on admission (0 = auto-mining)
    pub max_pool_size: usize,

    /// Reputation maintenance cadence in milliseconds (0 = disabled)
    pub reputation_interval_ms: u64,

    /// Limit overrides applied before validation
    pub gas_overrides: Option<GasLimitOverrides>,
}

impl ExecutionConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `BUNDLER_AUTO_BUNDLE_INTERVAL`: seconds (default: 0)
    /// - `BUNDLER_MAX_POOL_SIZE`: threshold (default: 0, auto-mining)
    /// - `BUNDLER_REPUTATION_INTERVAL_MS`: milliseconds (default: 0)
    /// - `BUNDLER_OVERRIDE_VERIFICATION_GAS_LIMIT`, `BUNDLER_OVERRIDE_CALL_GAS_LIMIT`,
    ///   `BUNDLER_OVERRIDE_PRE_VERIFICATION_GAS`, `BUNDLER_OVERRIDE_MAX_FEE_PER_GAS`,
    ///   `BUNDLER_OVERRIDE_MAX_PRIORITY_FEE_PER_GAS`: hex (`0x`) or decimal quantities
    pub fn from_env() -> Result<Self> {
        let overrides = GasLimitOverrides {
            verification_gas_limit: quantity_var("BUNDLER_OVERRIDE_VERIFICATION_GAS_LIMIT")?,
            call_gas_limit: quantity_var("BUNDLER_OVERRIDE_CALL_GAS_LIMIT")?,
            pre_verification_gas: quantity_var("BUNDLER_OVERRIDE_PRE_VERIFICATION_GAS")?,
            max_fee_per_gas: quantity_var("BUNDLER_OVERRIDE_MAX_FEE_PER_GAS")?,
            max_priority_fee_per_gas: quantity_var("BUNDLER_OVERRIDE_MAX_PRIORITY_FEE_PER_GAS")?,
        };

        let config = Self {
            auto_bundle_interval_secs: number_var("BUNDLER_AUTO_BUNDLE_INTERVAL")?.unwrap_or(0),
            max_pool_size: number_var("BUNDLER_MAX_POOL_SIZE")?.unwrap_or(0),
            reputation_interval_ms: number_var("BUNDLER_REPUTATION_INTERVAL_MS")?.unwrap_or(0),
            gas_overrides: (!overrides.is_empty()).then_some(overrides),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would make every operation invalid
    pub fn validate(&self) -> Result<()> {
        if let Some(overrides) = &self.gas_overrides {
            if let (Some(priority), Some(max)) = (
                overrides.max_priority_fee_per_gas,
                overrides.max_fee_per_gas,
            ) {
                if priority > max {
                    return Err(ExecutionError::InvalidConfig(format!(
                        "priority fee override {} exceeds max fee override {}",
                        priority, max
                    )));
                }
            }
        }
        Ok(())
    }

    /// True if no auto-bundle timer is configured
    pub fn is_manual(&self) -> bool {
        self.auto_bundle_interval_secs == 0
    }
}

fn number_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ExecutionError::InvalidConfig(format!("{}={} is not a number", name, raw))),
        Err(_) => Ok(None),
    }
}

fn quantity_var(name: &str) -> Result<Option<U256>> {
    match env::var(name) {
        Ok(raw) => parse_quantity(&raw)
            .map(Some)
            .ok_or_else(|| ExecutionError::InvalidConfig(format!("{}={} is not a quantity", name, raw))),
        Err(_) => Ok(None),
    }
}

/// Parse a `0x`-prefixed hex or decimal quantity
pub fn parse_quantity(raw: &str) -> Option<U256> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) if !hex.is_empty() => U256::from_str_radix(hex, 16).ok(),
        Some(_) => None,
        None => U256::from_dec_str(raw).ok(),
    }
}
