//! Startup configuration.

use std::path::Path;

use eyre::WrapErr;
use ns_volume::DEFAULT_CHUNK_BIT_SIZE;
use serde::Deserialize;

use crate::{OwnerId, Permissions};

/// A TPS ceiling granted by holding a permission node.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MaxTpsTier {
    pub permission: String,
    pub max_tps: f64,
}

/// Configuration, loaded once at startup.
///
/// Every field has a default, so an empty JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NorestoneConfig {
    /// Fixed rate of the host update loop.
    pub host_tps: f64,
    /// Requested rate of a freshly compiled simulation.
    pub default_sim_tps: f64,
    /// Volume chunk edge is `2^chunk_bit_size`.
    pub chunk_bit_size: u8,
    /// Largest selection, in blocks.
    pub max_selection_volume: Option<u64>,
    /// Longest selection edge, in blocks.
    pub max_selection_side: Option<i32>,
    /// Refuse selections that overlap another owner's simulation.
    pub reject_overlapping_selections: bool,
    /// TPS ceiling for owners matching no tier.
    pub default_max_tps: f64,
    pub max_tps_tiers: Vec<MaxTpsTier>,
}

impl Default for NorestoneConfig {
    fn default() -> Self {
        Self {
            host_tps: 20.0,
            default_sim_tps: 20.0,
            chunk_bit_size: DEFAULT_CHUNK_BIT_SIZE,
            max_selection_volume: None,
            max_selection_side: None,
            reject_overlapping_selections: true,
            default_max_tps: 20.0,
            max_tps_tiers: Vec::new(),
        }
    }
}

impl NorestoneConfig {
    /// Read a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read config {}", path.display()))?;
        Self::from_json(&raw).wrap_err_with(|| format!("invalid config {}", path.display()))
    }

    pub fn from_json(raw: &str) -> eyre::Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> eyre::Result<()> {
        if !(self.host_tps.is_finite() && self.host_tps > 0.0) {
            eyre::bail!("host_tps must be positive, got {}", self.host_tps);
        }
        if !(self.default_sim_tps.is_finite() && self.default_sim_tps > 0.0) {
            eyre::bail!("default_sim_tps must be positive, got {}", self.default_sim_tps);
        }
        if !(1..=8).contains(&self.chunk_bit_size) {
            eyre::bail!("chunk_bit_size must be in 1..=8, got {}", self.chunk_bit_size);
        }
        Ok(())
    }

    /// The highest TPS ceiling among the default and every tier `owner` holds.
    pub fn max_tps_for(&self, owner: OwnerId, perms: &impl Permissions) -> f64 {
        self.max_tps_tiers
            .iter()
            .filter(|tier| perms.has_permission(owner, &tier.permission))
            .map(|tier| tier.max_tps)
            .fold(self.default_max_tps, f64::max)
    }
}
