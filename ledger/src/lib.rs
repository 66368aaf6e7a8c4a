//! Mercato Ledger
//!
//! Versioned balance and inventory records with append-only audit
//! journals, mutated under optimistic concurrency control with bounded
//! retry.
//!
//! # Architecture
//!
//! - **Versioned rows**: every balance/stock record carries a monotonic
//!   version counter checked at commit time
//! - **Append-only journals**: each mutation writes one immutable audit
//!   entry with before/after values, atomically with the record update
//! - **Bounded retry**: a losing writer re-runs its whole
//!   read-compute-commit cycle a fixed number of times, then surfaces a
//!   concurrency conflict
//!
//! # Invariants
//!
//! - Balance >= 0 and stock >= 0 at all times
//! - The journal's chain of before/after values reconstructs the current
//!   value exactly
//! - A rejected operation performs zero mutation

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod balance;
pub mod config;
pub mod error;
pub mod gateway;
pub mod inventory;
pub mod store;
pub mod types;

// Re-exports
pub use balance::BalanceLedger;
pub use config::{Config, RetryConfig};
pub use error::{Error, Result};
pub use gateway::{MockGateway, PaymentGateway};
pub use inventory::InventoryLedger;
pub use types::{
    BalanceEntry, BalanceEntryType, BalanceRecord, Currency, OwnerId, ProductId, StockEntry,
    StockEntryType, StockRecord,
};
