//! Reconciliation report types

use catalog::MerchantId;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Outcome of comparing the stored balance against calculated sales
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReconciliationStatus {
    /// Stored balance equals calculated sales exactly
    Matched,
    /// Any non-zero difference, in either direction
    Discrepancy,
}

impl fmt::Display for ReconciliationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReconciliationStatus::Matched => "MATCHED",
            ReconciliationStatus::Discrepancy => "DISCREPANCY",
        };
        write!(f, "{s}")
    }
}

/// One merchant's reconciliation result for one calendar date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// Report id
    pub id: Uuid,

    /// Reconciled merchant
    pub merchant: MerchantId,

    /// Calendar date the sales window covers
    pub report_date: NaiveDate,

    /// Merchant's stored settlement balance at reconciliation time
    pub account_balance: Decimal,

    /// Sum of COMPLETED order totals created on `report_date`
    pub calculated_sales: Decimal,

    /// `account_balance - calculated_sales`; sign is preserved
    pub discrepancy: Decimal,

    /// Matched only when the discrepancy is exactly zero
    pub status: ReconciliationStatus,

    /// When the report was produced
    pub created_at: DateTime<Utc>,
}

impl ReconciliationReport {
    /// Build a report; status follows from the discrepancy
    pub fn new(
        merchant: MerchantId,
        report_date: NaiveDate,
        account_balance: Decimal,
        calculated_sales: Decimal,
    ) -> Self {
        let discrepancy = account_balance - calculated_sales;
        let status = if discrepancy.is_zero() {
            ReconciliationStatus::Matched
        } else {
            ReconciliationStatus::Discrepancy
        };
        Self {
            id: Uuid::new_v4(),
            merchant,
            report_date,
            account_balance,
            calculated_sales,
            discrepancy,
            status,
            created_at: Utc::now(),
        }
    }

    /// True when the balances did not match
    pub fn has_discrepancy(&self) -> bool {
        self.status == ReconciliationStatus::Discrepancy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn test_matched_when_exactly_equal() {
        let report = ReconciliationReport::new(
            MerchantId::generate(),
            date(),
            Decimal::new(50000, 2),
            Decimal::new(50000, 2),
        );
        assert_eq!(report.status, ReconciliationStatus::Matched);
        assert_eq!(report.discrepancy, Decimal::ZERO);
        assert!(!report.has_discrepancy());
    }

    #[test]
    fn test_discrepancy_preserves_sign() {
        let surplus = ReconciliationReport::new(
            MerchantId::generate(),
            date(),
            Decimal::new(52000, 2),
            Decimal::new(50000, 2),
        );
        assert_eq!(surplus.discrepancy, Decimal::new(2000, 2));
        assert!(surplus.has_discrepancy());

        let shortfall = ReconciliationReport::new(
            MerchantId::generate(),
            date(),
            Decimal::new(48000, 2),
            Decimal::new(50000, 2),
        );
        assert_eq!(shortfall.discrepancy, Decimal::new(-2000, 2));
        assert!(shortfall.has_discrepancy());
    }
}
