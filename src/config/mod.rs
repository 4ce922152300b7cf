/// Database configuration and connection management
pub mod database;

/// Ledger settings loaded from config.toml
pub mod ledger;

pub use ledger::{LedgerConfig, ReferencePriceConfig, load_config, load_config_or_default};
