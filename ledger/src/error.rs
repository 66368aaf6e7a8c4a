//! Error types for the ledger

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Referenced entity does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind (Account, Inventory, ...)
        entity: &'static str,
        /// Identifier that failed to resolve
        id: String,
    },

    /// Entity already exists (duplicate registration)
    #[error("{entity} already exists: {id}")]
    AlreadyExists {
        /// Entity kind
        entity: &'static str,
        /// Conflicting identifier
        id: String,
    },

    /// Non-positive monetary amount
    #[error("Amount must be positive, got {0}")]
    InvalidAmount(Decimal),

    /// Non-positive quantity
    #[error("Quantity must be positive, got {0}")]
    InvalidQuantity(u32),

    /// Debit rejected: balance lower than the requested amount
    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance {
        /// Balance at the time of the check
        available: Decimal,
        /// Amount the operation needed
        required: Decimal,
    },

    /// Deduction rejected: stock lower than the requested quantity
    #[error("Insufficient stock: available {available}, requested {requested}")]
    InsufficientStock {
        /// Stock at the time of the check
        available: u32,
        /// Quantity the operation needed
        requested: u32,
    },

    /// Version predicate failed at commit time (retried internally)
    #[error("Version conflict on {entity} {id}")]
    VersionConflict {
        /// Entity kind
        entity: &'static str,
        /// Identifier of the contended record
        id: String,
    },

    /// Optimistic retries exhausted; the operation performed zero mutation
    #[error("Concurrency conflict after {attempts} attempts")]
    ConcurrencyConflict {
        /// Number of read-compute-commit cycles attempted
        attempts: u32,
    },

    /// Payment gateway failure
    #[error("Payment gateway error: {0}")]
    Gateway(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for [`Error::NotFound`]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Error::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Shorthand for [`Error::AlreadyExists`]
    pub fn already_exists(entity: &'static str, id: impl ToString) -> Self {
        Error::AlreadyExists {
            entity,
            id: id.to_string(),
        }
    }

    /// True for the internal conflict the retry loop absorbs
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, Error::VersionConflict { .. })
    }
}
