//! Error types for the catalog

use thiserror::Error;

/// Result type for catalog operations
pub type Result<T> = std::result::Result<T, Error>;

/// Catalog errors
#[derive(Error, Debug)]
pub enum Error {
    /// Referenced entity does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind (User, Merchant, Product)
        entity: &'static str,
        /// Identifier that failed to resolve
        id: String,
    },

    /// A product with the same (merchant, sku) already exists
    #[error("Product already registered for merchant {merchant}: {sku}")]
    DuplicateSku {
        /// Owning merchant
        merchant: String,
        /// Conflicting SKU
        sku: String,
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
