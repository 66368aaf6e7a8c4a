//! Error types for reconciliation

use chrono::NaiveDate;
use thiserror::Error;

/// Result type for reconciliation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Reconciliation errors
#[derive(Error, Debug)]
pub enum Error {
    /// Catalog lookup failure
    #[error("Catalog error: {0}")]
    Catalog(#[from] catalog::Error),

    /// Ledger read failure
    #[error("Ledger error: {0}")]
    Ledger(#[from] ledger::Error),

    /// No report exists for the requested merchant and date
    #[error("No reconciliation report for merchant {merchant} on {date}")]
    ReportNotFound {
        /// Merchant whose report was requested
        merchant: String,
        /// Report date
        date: NaiveDate,
    },

    /// Scheduler configuration rejected
    #[error("Configuration error: {0}")]
    Config(String),
}
