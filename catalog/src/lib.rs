//! Mercato Catalog
//!
//! User, merchant and product registry: the read accessors the order
//! orchestrator and the reconciliation batch resolve actors through.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod error;
pub mod registry;
pub mod types;

// Re-exports
pub use error::{Error, Result};
pub use registry::Catalog;
pub use types::{Merchant, MerchantId, Product, User, UserId};
