//! Payment gateway seam for account recharge
//!
//! The gateway is an opaque synchronous dependency: it either returns an
//! external transaction reference or fails. It is used only for recharge,
//! never for order settlement.

use crate::{error::Result, types::OwnerId};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// External payment gateway
pub trait PaymentGateway: Send + Sync {
    /// Charge the external side and return its transaction reference
    fn process_recharge(&self, owner: OwnerId, amount: Decimal) -> Result<String>;
}

/// In-process gateway that always succeeds
///
/// Stands in for the banking integration; issues `TXN-XXXXXXXX`
/// references and counts invocations.
#[derive(Default)]
pub struct MockGateway {
    calls: AtomicU64,
}

impl MockGateway {
    /// Create a mock gateway
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recharge calls processed
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}

impl PaymentGateway for MockGateway {
    fn process_recharge(&self, owner: OwnerId, amount: Decimal) -> Result<String> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        let reference = format!(
            "TXN-{}",
            Uuid::new_v4().simple().to_string()[..8].to_uppercase()
        );
        tracing::info!(%owner, %amount, reference, "Recharge processed by gateway");
        Ok(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_gateway_reference_format() {
        let gateway = MockGateway::new();
        let reference = gateway
            .process_recharge(OwnerId::generate(), Decimal::new(1000, 2))
            .unwrap();
        assert!(reference.starts_with("TXN-"));
        assert_eq!(reference.len(), 12);
        assert_eq!(gateway.calls(), 1);
    }
}
