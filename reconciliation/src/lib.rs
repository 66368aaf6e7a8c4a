//! Mercato Reconciliation
//!
//! Daily comparison of each merchant's stored settlement balance against
//! the sales calculated from COMPLETED orders, with an idempotent report
//! per (merchant, date), a best-effort batch over all merchants, and a
//! background scheduler that runs the batch once per day.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod engine;
pub mod error;
pub mod report;
pub mod scheduler;

// Re-exports
pub use engine::{BatchSummary, ReconciliationEngine};
pub use error::{Error, Result};
pub use report::{ReconciliationReport, ReconciliationStatus};
pub use scheduler::{ReconciliationScheduler, SchedulerConfig};
