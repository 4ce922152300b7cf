//! Unified error types for the savings ledger.

use thiserror::Error;

/// Every failure the crate can report.
///
/// Storage-related variants only reach callers when the ledger or goal
/// tracker runs with [`FailurePolicy::Surface`](crate::storage::FailurePolicy::Surface);
/// under the default swallow policy they are logged and degraded instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description of the problem
        message: String,
    },

    /// The SQL backend rejected a query or was unreachable
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A persisted collection was not valid JSON for its record type
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A key-value backend failed for a reason other than SQL
    #[error("Storage error: {message}")]
    Storage {
        /// Human-readable description of the problem
        message: String,
    },

    /// A monetary amount was zero, negative, or not finite where that is not allowed
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// A goal period would end past the supported calendar range
    #[error("Date out of range: {date}")]
    DateOutOfRange {
        /// Start day of the period that could not be extended
        date: chrono::NaiveDate,
    },
}

impl Error {
    /// Whether this error came from the persistence layer (and is therefore
    /// subject to the configured failure policy).
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Serialization(_) | Self::Storage { .. }
        )
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_classification() {
        assert!(
            Error::Storage {
                message: "disk full".to_string()
            }
            .is_storage()
        );
        assert!(Error::Database(sea_orm::DbErr::Custom("boom".to_string())).is_storage());
        assert!(!Error::InvalidAmount { amount: -1.0 }.is_storage());
        assert!(
            !Error::Config {
                message: "bad".to_string()
            }
            .is_storage()
        );
    }

    #[test]
    fn test_error_display() {
        let err = Error::InvalidAmount { amount: 0.0 };
        assert_eq!(err.to_string(), "Invalid amount: 0");
    }
}
