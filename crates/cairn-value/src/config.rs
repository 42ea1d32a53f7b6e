use serde::{Deserialize, Serialize};

use crate::error::{ValueError, ValueResult};

/// Chunking parameters for persistent collections.
///
/// Capacities only shape the internal tree. They never affect a
/// collection's [`Ref`](cairn_ref::Ref), so collections built with different
/// configs compare equal when their contents do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    /// Maximum number of elements stored in one leaf chunk.
    pub leaf_capacity: usize,
    /// Maximum number of children under one branch node.
    pub branch_capacity: usize,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            leaf_capacity: 32,
            branch_capacity: 32,
        }
    }
}

impl CollectionConfig {
    /// Smallest capacity that still lets nodes split in two.
    pub const MIN_CAPACITY: usize = 2;

    /// Parse a config from TOML, falling back to defaults for absent keys.
    pub fn from_toml_str(s: &str) -> ValueResult<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that both capacities are usable.
    pub fn validate(&self) -> ValueResult<()> {
        if self.leaf_capacity < Self::MIN_CAPACITY {
            return Err(ValueError::InvalidConfig(format!(
                "leaf_capacity must be at least {}, got {}",
                Self::MIN_CAPACITY,
                self.leaf_capacity
            )));
        }
        if self.branch_capacity < Self::MIN_CAPACITY {
            return Err(ValueError::InvalidConfig(format!(
                "branch_capacity must be at least {}, got {}",
                Self::MIN_CAPACITY,
                self.branch_capacity
            )));
        }
        Ok(())
    }

    /// Raises any capacity below [`Self::MIN_CAPACITY`] to the minimum.
    pub(crate) fn clamped(self) -> Self {
        Self {
            leaf_capacity: self.leaf_capacity.max(Self::MIN_CAPACITY),
            branch_capacity: self.branch_capacity.max(Self::MIN_CAPACITY),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = CollectionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.leaf_capacity, 32);
        assert_eq!(config.branch_capacity, 32);
    }

    #[test]
    fn parses_partial_toml() {
        let config = CollectionConfig::from_toml_str("leaf_capacity = 4\n").unwrap();
        assert_eq!(config.leaf_capacity, 4);
        assert_eq!(config.branch_capacity, 32);
    }

    #[test]
    fn rejects_tiny_capacities() {
        let err = CollectionConfig::from_toml_str("branch_capacity = 1\n").unwrap_err();
        assert!(matches!(err, ValueError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = CollectionConfig::from_toml_str("leaf_capacity = \"big\"").unwrap_err();
        assert!(matches!(err, ValueError::Config(_)));
    }

    #[test]
    fn serde_roundtrip() {
        let config = CollectionConfig {
            leaf_capacity: 8,
            branch_capacity: 4,
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: CollectionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
        let defaulted: CollectionConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(defaulted, CollectionConfig::default());
    }

    #[test]
    fn clamping_enforces_minimum() {
        let config = CollectionConfig {
            leaf_capacity: 0,
            branch_capacity: 1,
        }
        .clamped();
        assert!(config.validate().is_ok());
    }
}
