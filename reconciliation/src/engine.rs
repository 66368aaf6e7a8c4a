//! Daily reconciliation
//!
//! Compares each merchant's stored settlement balance against the sales
//! calculated from COMPLETED orders of one calendar date. Reconciliation
//! only observes and reports; it never mutates a ledger. One report per
//! (merchant, date) is produced, re-runs return the stored report.

use crate::{
    error::{Error, Result},
    report::ReconciliationReport,
};
use catalog::{Catalog, MerchantId};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use dashmap::DashMap;
use ledger::BalanceLedger;
use orders::OrderEngine;
use std::sync::Arc;

/// Per-merchant outcome counts of one batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    /// Date the batch reconciled
    pub report_date: NaiveDate,
    /// Merchants with a report after the run (fresh or pre-existing)
    pub reconciled: usize,
    /// Merchants whose reconciliation errored; the rest still ran
    pub failed: usize,
}

/// Produces and stores per-(merchant, date) reconciliation reports
pub struct ReconciliationEngine {
    catalog: Arc<Catalog>,
    balances: Arc<BalanceLedger>,
    orders: Arc<OrderEngine>,
    reports: DashMap<(MerchantId, NaiveDate), ReconciliationReport>,
}

impl ReconciliationEngine {
    /// Create an engine over the shared catalog, balance ledger and orders
    pub fn new(
        catalog: Arc<Catalog>,
        balances: Arc<BalanceLedger>,
        orders: Arc<OrderEngine>,
    ) -> Self {
        Self {
            catalog,
            balances,
            orders,
            reports: DashMap::new(),
        }
    }

    /// Reconcile one merchant for one calendar date
    ///
    /// Idempotent: a second call for the same (merchant, date) is a no-op
    /// that returns the stored report unchanged.
    pub fn reconcile(&self, merchant: MerchantId, date: NaiveDate) -> Result<ReconciliationReport> {
        match self.reports.entry((merchant, date)) {
            dashmap::mapref::entry::Entry::Occupied(existing) => {
                tracing::warn!(
                    %merchant,
                    %date,
                    "Reconciliation already performed, returning stored report"
                );
                Ok(existing.get().clone())
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                let report = self.build_report(merchant, date)?;
                if report.has_discrepancy() {
                    tracing::warn!(
                        %merchant,
                        %date,
                        balance = %report.account_balance,
                        sales = %report.calculated_sales,
                        discrepancy = %report.discrepancy,
                        "Reconciliation discrepancy detected"
                    );
                } else {
                    tracing::info!(
                        %merchant,
                        %date,
                        balance = %report.account_balance,
                        "Reconciliation matched"
                    );
                }
                slot.insert(report.clone());
                Ok(report)
            }
        }
    }

    fn build_report(&self, merchant: MerchantId, date: NaiveDate) -> Result<ReconciliationReport> {
        let seller = self.catalog.merchant(merchant)?;
        let account_balance = self.balances.balance(seller.account)?;

        let (start, end) = day_window(date);
        let calculated_sales = self.orders.completed_sales_total(merchant, start, end);

        Ok(ReconciliationReport::new(
            merchant,
            date,
            account_balance,
            calculated_sales,
        ))
    }

    /// Reconcile one merchant for yesterday
    pub fn reconcile_yesterday(&self, merchant: MerchantId) -> Result<ReconciliationReport> {
        self.reconcile(merchant, yesterday())
    }

    /// Reconcile every registered merchant for one date, best effort
    ///
    /// A failing merchant is logged and counted; it never stops the batch.
    pub fn reconcile_all(&self, date: NaiveDate) -> BatchSummary {
        let merchants = self.catalog.merchants();
        tracing::info!(%date, merchants = merchants.len(), "Reconciliation batch started");

        let mut summary = BatchSummary {
            report_date: date,
            reconciled: 0,
            failed: 0,
        };
        for merchant in merchants {
            match self.reconcile(merchant.id, date) {
                Ok(_) => summary.reconciled += 1,
                Err(err) => {
                    tracing::error!(
                        merchant = %merchant.id,
                        %date,
                        error = %err,
                        "Merchant reconciliation failed"
                    );
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            %date,
            reconciled = summary.reconciled,
            failed = summary.failed,
            "Reconciliation batch finished"
        );
        summary
    }

    /// Reconcile every registered merchant for yesterday
    pub fn reconcile_all_yesterday(&self) -> BatchSummary {
        self.reconcile_all(yesterday())
    }

    /// Stored report for a (merchant, date), if one exists
    pub fn report(&self, merchant: MerchantId, date: NaiveDate) -> Result<ReconciliationReport> {
        self.reports
            .get(&(merchant, date))
            .map(|r| r.clone())
            .ok_or_else(|| Error::ReportNotFound {
                merchant: merchant.to_string(),
                date,
            })
    }

    /// All stored reports of a merchant, newest date first
    pub fn reports_for_merchant(&self, merchant: MerchantId) -> Vec<ReconciliationReport> {
        let mut reports: Vec<_> = self
            .reports
            .iter()
            .filter(|entry| entry.key().0 == merchant)
            .map(|entry| entry.value().clone())
            .collect();
        reports.sort_by(|a, b| b.report_date.cmp(&a.report_date));
        reports
    }
}

/// Inclusive UTC window covering one calendar date
fn day_window(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(NaiveTime::MIN).and_utc();
    let end = start + Duration::days(1) - Duration::nanoseconds(1);
    (start, end)
}

fn yesterday() -> NaiveDate {
    Utc::now().date_naive() - chrono::Days::new(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ReconciliationStatus;
    use ledger::{Config, Currency, InventoryLedger};
    use rust_decimal::Decimal;

    struct Fixture {
        catalog: Arc<Catalog>,
        balances: Arc<BalanceLedger>,
        inventory: Arc<InventoryLedger>,
        orders: Arc<OrderEngine>,
        engine: ReconciliationEngine,
    }

    impl Fixture {
        fn new() -> Self {
            let config = Config::default();
            let catalog = Arc::new(Catalog::new());
            let balances = Arc::new(BalanceLedger::new(&config));
            let inventory = Arc::new(InventoryLedger::new(&config));
            let orders = Arc::new(OrderEngine::new(
                catalog.clone(),
                balances.clone(),
                inventory.clone(),
            ));
            let engine =
                ReconciliationEngine::new(catalog.clone(), balances.clone(), orders.clone());
            Self {
                catalog,
                balances,
                inventory,
                orders,
                engine,
            }
        }

        /// Merchant with one product at 10.00 and a funded buyer
        async fn seed(&self) -> (catalog::User, catalog::Merchant) {
            let user = self.catalog.register_user("Alice", "alice@example.com");
            let merchant = self.catalog.register_merchant("Widgets Inc");
            let product = self
                .catalog
                .register_product(
                    merchant.id,
                    "SKU-1",
                    "Widget",
                    Decimal::new(1000, 2),
                    Currency::USD,
                )
                .unwrap();

            self.balances
                .open_account(user.account, Currency::USD)
                .unwrap();
            self.balances
                .open_account(merchant.account, Currency::USD)
                .unwrap();
            self.balances
                .credit(user.account, Decimal::new(100000, 2), None)
                .await
                .unwrap();
            self.inventory
                .add_stock(product.id, 100, "RESTOCK-1")
                .await
                .unwrap();
            (user, merchant)
        }
    }

    #[tokio::test]
    async fn test_matched_when_balance_equals_sales() {
        let fx = Fixture::new();
        let (user, merchant) = fx.seed().await;

        fx.orders
            .place_order(user.id, merchant.id, "SKU-1", 3)
            .await
            .unwrap(); // 30.00
        fx.orders
            .place_order(user.id, merchant.id, "SKU-1", 2)
            .await
            .unwrap(); // 20.00

        let today = Utc::now().date_naive();
        let report = fx.engine.reconcile(merchant.id, today).unwrap();
        assert_eq!(report.account_balance, Decimal::new(5000, 2));
        assert_eq!(report.calculated_sales, Decimal::new(5000, 2));
        assert_eq!(report.status, ReconciliationStatus::Matched);
    }

    #[tokio::test]
    async fn test_discrepancy_from_out_of_band_credit() {
        let fx = Fixture::new();
        let (user, merchant) = fx.seed().await;

        fx.orders
            .place_order(user.id, merchant.id, "SKU-1", 5)
            .await
            .unwrap(); // 50.00

        // Money that reached the balance outside any order
        fx.balances
            .credit(merchant.account, Decimal::new(2000, 2), None)
            .await
            .unwrap();

        let today = Utc::now().date_naive();
        let report = fx.engine.reconcile(merchant.id, today).unwrap();
        assert_eq!(report.status, ReconciliationStatus::Discrepancy);
        assert_eq!(report.discrepancy, Decimal::new(2000, 2));
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent() {
        let fx = Fixture::new();
        let (user, merchant) = fx.seed().await;

        fx.orders
            .place_order(user.id, merchant.id, "SKU-1", 1)
            .await
            .unwrap();

        let today = Utc::now().date_naive();
        let first = fx.engine.reconcile(merchant.id, today).unwrap();

        // State changes after the first run must not leak into a re-run
        fx.balances
            .credit(merchant.account, Decimal::new(9900, 2), None)
            .await
            .unwrap();

        let second = fx.engine.reconcile(merchant.id, today).unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.account_balance, first.account_balance);
        assert_eq!(fx.engine.reports_for_merchant(merchant.id).len(), 1);
    }

    #[tokio::test]
    async fn test_batch_isolates_failing_merchant() {
        let fx = Fixture::new();
        let (user, merchant) = fx.seed().await;
        // Merchant with no opened balance account: its reconciliation fails
        fx.catalog.register_merchant("Ghost Shop");

        fx.orders
            .place_order(user.id, merchant.id, "SKU-1", 2)
            .await
            .unwrap();

        let today = Utc::now().date_naive();
        let summary = fx.engine.reconcile_all(today);
        assert_eq!(summary.reconciled, 1);
        assert_eq!(summary.failed, 1);

        // The healthy merchant still got its report
        assert!(fx.engine.report(merchant.id, today).is_ok());
    }

    #[tokio::test]
    async fn test_report_lookup_missing() {
        let fx = Fixture::new();
        let (_, merchant) = fx.seed().await;

        let result = fx
            .engine
            .report(merchant.id, Utc::now().date_naive());
        assert!(matches!(result, Err(Error::ReportNotFound { .. })));
    }

    #[test]
    fn test_day_window_covers_whole_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let (start, end) = day_window(date);
        assert_eq!(start.date_naive(), date);
        assert_eq!(end.date_naive(), date);
        assert!(end > start);
        assert_eq!(
            (end + Duration::nanoseconds(1)).date_naive(),
            date + chrono::Days::new(1)
        );
    }
}
