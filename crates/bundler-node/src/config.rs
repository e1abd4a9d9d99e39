//! Node configuration for the in-process collaborators.

use bundler_execution::{EntryPoint, DEFAULT_MAX_BUNDLE_SIZE, DEFAULT_POOL_CAPACITY};
use std::env;
use thiserror::Error;

/// EntryPoint v0.6 deployment address
pub const DEFAULT_ENTRY_POINT: &str = "0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789";

/// Local development chain id
pub const DEFAULT_CHAIN_ID: u64 = 1337;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Variable present but unparsable
    #[error("{name}={value} is invalid: {reason}")]
    InvalidVar {
        /// Variable name
        name: &'static str,
        /// Raw value
        value: String,
        /// What went wrong
        reason: String,
    },

    /// No entry point configured
    #[error("at least one entry point must be configured")]
    NoEntryPoints,

    /// Pool cannot hold any operation
    #[error("pool capacity must be greater than 0")]
    ZeroPoolCapacity,
}

/// Configuration for the bundler node.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Pending pool capacity
    pub pool_capacity: usize,

    /// Maximum operations per bundle
    pub max_bundle_size: usize,

    /// Chain id mixed into operation identities
    pub chain_id: u64,

    /// Entry points accepted by the validator
    pub entry_points: Vec<EntryPoint>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            pool_capacity: DEFAULT_POOL_CAPACITY,
            max_bundle_size: DEFAULT_MAX_BUNDLE_SIZE,
            chain_id: DEFAULT_CHAIN_ID,
            entry_points: parse_entry_points(DEFAULT_ENTRY_POINT).unwrap_or_default(),
        }
    }
}

impl NodeConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `BUNDLER_POOL_CAPACITY`: pending pool capacity (default: 4096)
    /// - `BUNDLER_MAX_BUNDLE_SIZE`: operations per bundle (default: 16)
    /// - `BUNDLER_CHAIN_ID`: chain id (default: 1337)
    /// - `BUNDLER_ENTRY_POINTS`: comma-separated `0x` addresses (default: EntryPoint v0.6)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let entry_points = match env::var("BUNDLER_ENTRY_POINTS") {
            Ok(raw) => parse_entry_points(&raw).map_err(|reason| ConfigError::InvalidVar {
                name: "BUNDLER_ENTRY_POINTS",
                value: raw.clone(),
                reason,
            })?,
            Err(_) => defaults.entry_points,
        };

        let config = Self {
            pool_capacity: number_var("BUNDLER_POOL_CAPACITY")?.unwrap_or(defaults.pool_capacity),
            max_bundle_size: number_var("BUNDLER_MAX_BUNDLE_SIZE")?
                .unwrap_or(defaults.max_bundle_size),
            chain_id: number_var("BUNDLER_CHAIN_ID")?.unwrap_or(defaults.chain_id),
            entry_points,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration can be wired
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entry_points.is_empty() {
            return Err(ConfigError::NoEntryPoints);
        }
        if self.pool_capacity == 0 {
            return Err(ConfigError::ZeroPoolCapacity);
        }
        Ok(())
    }
}

fn number_var<T>(name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidVar {
                name,
                value: raw.clone(),
                reason: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

/// Parse a comma-separated list of `0x`-prefixed 20-byte addresses
pub fn parse_entry_points(raw: &str) -> Result<Vec<EntryPoint>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            let digits = s.strip_prefix("0x").unwrap_or(s);
            let bytes = hex::decode(digits).map_err(|e| format!("{}: {}", s, e))?;
            EntryPoint::try_from(bytes.as_slice())
                .map_err(|_| format!("{}: expected 20 bytes, got {}", s, bytes.len()))
        })
        .collect()
}
