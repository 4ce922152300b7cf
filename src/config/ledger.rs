//! Ledger configuration loading from config.toml
//!
//! Every setting has a default, so an empty file (or no file at all) gives the
//! behavior of the mobile app: 100 retained logs, a $0.25 threshold for the
//! savings explanation, five top categories and storage failures swallowed.

use crate::core::pricing::StaticPriceTable;
use crate::errors::{Error, Result};
use crate::models::PriceRange;
use crate::storage::FailurePolicy;
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Maximum number of savings logs kept; the oldest are dropped first
    pub retention_cap: usize,
    /// Minimum absolute savings for an item to appear in the explanation text
    pub significant_difference: f64,
    /// Number of categories reported in the weekly rollup
    pub top_categories: usize,
    /// What to do when storage fails
    pub failure_policy: FailurePolicy,
    /// Replacement reference table; the built-in table is used when empty
    pub reference_prices: Vec<ReferencePriceConfig>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            retention_cap: 100,
            significant_difference: 0.25,
            top_categories: 5,
            failure_policy: FailurePolicy::Swallow,
            reference_prices: Vec::new(),
        }
    }
}

/// One reference price entry
#[derive(Debug, Clone, Deserialize)]
pub struct ReferencePriceConfig {
    /// Item name, matched case-insensitively
    pub name: String,
    /// Average price in the area
    pub average: f64,
    /// Lowest price in the area
    pub low: f64,
    /// Highest price in the area
    pub high: f64,
}

impl LedgerConfig {
    /// Builds the reference table this configuration asks for.
    ///
    /// Entries whose prices are not ordered `low <= average <= high` are
    /// skipped with a warning.
    #[must_use]
    pub fn price_table(&self) -> StaticPriceTable {
        if self.reference_prices.is_empty() {
            return StaticPriceTable::default();
        }

        StaticPriceTable::new(self.reference_prices.iter().filter_map(|entry| {
            let range = PriceRange::new(entry.average, entry.low, entry.high);
            if range.low <= range.average && range.average <= range.high {
                Some((entry.name.clone(), range))
            } else {
                warn!("Skipping reference price '{}': range is not ordered", entry.name);
                None
            }
        }))
    }
}

/// Loads ledger configuration from a TOML file
///
/// # Errors
/// Returns `Error::Config` if the file cannot be read or the TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<LedgerConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads configuration from `path`, using defaults when the file does not exist.
///
/// # Errors
/// Returns `Error::Config` if the file exists but cannot be parsed.
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> Result<LedgerConfig> {
    if path.as_ref().exists() {
        load_config(path)
    } else {
        warn!(
            "Config file {:?} not found, using defaults",
            path.as_ref()
        );
        Ok(LedgerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::pricing::PriceSource;

    #[test]
    fn test_parse_ledger_config() {
        let toml_str = r#"
            retention_cap = 50
            failure_policy = "surface"

            [[reference_prices]]
            name = "oat milk"
            average = 4.59
            low = 3.99
            high = 5.49

            [[reference_prices]]
            name = "broken"
            average = 9.0
            low = 10.0
            high = 11.0
        "#;

        let config: LedgerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.retention_cap, 50);
        assert_eq!(config.failure_policy, FailurePolicy::Surface);
        assert_eq!(config.significant_difference, 0.25);
        assert_eq!(config.top_categories, 5);
        assert_eq!(config.reference_prices.len(), 2);

        let table = config.price_table();
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup("oat milk").unwrap().average, 4.59);
        assert!(table.lookup("broken").is_none());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: LedgerConfig = toml::from_str("").unwrap();
        assert_eq!(config.retention_cap, 100);
        assert_eq!(config.failure_policy, FailurePolicy::Swallow);
        assert_eq!(config.price_table().len(), StaticPriceTable::default().len());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = load_config_or_default("definitely/not/here/config.toml").unwrap();
        assert_eq!(config.retention_cap, 100);
    }

    #[test]
    fn test_load_config_missing_file_is_error() {
        let err = load_config("definitely/not/here/config.toml").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
