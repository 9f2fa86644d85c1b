//! Retention policy configuration.
//!
//! A [`DispenserPolicy`] maps scenario names (one per kind of dispensed object, e.g.
//! `"parameter_infos"`) to the [`Retention`] their dispenser should use. Policies are plain
//! data and can be loaded from TOML:
//!
//! ```toml
//! default = "permanent"
//! shards = 32
//!
//! [scenarios]
//! parameter_infos = "weak_value"
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::store::{AnyStore, DEFAULT_SHARDS, DispenserKey};

/// How long a dispenser keeps published entries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Retention {
	/// Every entry lives as long as the dispenser.
	#[default]
	Permanent,
	/// An entry lives as long as some caller holds its value.
	WeakValue,
}

/// Policy loading failures.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
	#[error("invalid dispenser policy: {0}")]
	Parse(#[from] toml::de::Error),

	#[error("shard count must be a non-zero power of two, got {0}")]
	InvalidShardCount(usize),
}

/// Scenario to retention table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispenserPolicy {
	/// Retention for scenarios without an explicit entry.
	pub default: Retention,
	/// Shard count for permanent stores.
	pub shards: usize,
	pub scenarios: BTreeMap<String, Retention>,
}

impl Default for DispenserPolicy {
	fn default() -> Self {
		Self {
			default: Retention::Permanent,
			shards: DEFAULT_SHARDS,
			scenarios: BTreeMap::new(),
		}
	}
}

impl DispenserPolicy {
	/// Parses and validates a policy from TOML source.
	pub fn from_toml_str(source: &str) -> Result<Self, PolicyError> {
		let policy: Self = toml::from_str(source)?;
		policy.validate()?;
		Ok(policy)
	}

	pub fn validate(&self) -> Result<(), PolicyError> {
		if self.shards == 0 || !self.shards.is_power_of_two() {
			return Err(PolicyError::InvalidShardCount(self.shards));
		}
		Ok(())
	}

	/// Sets the retention for one scenario.
	pub fn with_scenario(mut self, scenario: impl Into<String>, retention: Retention) -> Self {
		self.scenarios.insert(scenario.into(), retention);
		self
	}

	/// Returns the retention configured for `scenario`, falling back to the default.
	pub fn retention_for(&self, scenario: &str) -> Retention {
		match self.scenarios.get(scenario) {
			Some(&retention) => retention,
			None => {
				tracing::debug!(
					scenario,
					retention = ?self.default,
					"no scenario override; using default retention"
				);
				self.default
			}
		}
	}

	/// Builds an empty store for `scenario`.
	pub fn store_for<K, V>(&self, scenario: &str) -> AnyStore<K, V>
	where
		K: DispenserKey,
	{
		AnyStore::for_retention(self.retention_for(scenario), self.shards)
	}
}
