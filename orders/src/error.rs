//! Error types for order processing

use crate::types::OrderStatus;
use thiserror::Error;

/// Result type for order operations
pub type Result<T> = std::result::Result<T, Error>;

/// Order processing errors
#[derive(Error, Debug)]
pub enum Error {
    /// Ledger-level failure (balances, stock)
    #[error("Ledger error: {0}")]
    Ledger(#[from] ledger::Error),

    /// Catalog lookup failure
    #[error("Catalog error: {0}")]
    Catalog(#[from] catalog::Error),

    /// Referenced order does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind
        entity: &'static str,
        /// Identifier that failed to resolve
        id: String,
    },

    /// Order status transition not allowed from the current state
    #[error("Invalid order state transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status
        from: OrderStatus,
        /// Requested status
        to: OrderStatus,
    },

    /// Settlement failed after the order was created; the order is FAILED
    /// and any partial money movement has been compensated
    #[error("Order {order_number} failed: {reason}")]
    ProcessingFailed {
        /// Order number of the failed order
        order_number: String,
        /// Underlying cause
        reason: String,
    },
}

impl Error {
    /// Shorthand for [`Error::NotFound`]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Error::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
