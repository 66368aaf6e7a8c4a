//! Mercato Orders
//!
//! Purchase orchestration over the catalog and the balance and inventory
//! ledgers: PENDING order creation, the settlement chain with explicit
//! compensation on partial failure, refunds, and the sales queries the
//! reconciliation batch consumes.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod engine;
pub mod error;
pub mod store;
pub mod types;

// Re-exports
pub use engine::OrderEngine;
pub use error::{Error, Result};
pub use store::OrderStore;
pub use types::{Order, OrderId, OrderStatus, Payment, PaymentStatus};
