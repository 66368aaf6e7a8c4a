//! Balance mutation with optimistic-concurrency retry
//!
//! Every mutation runs a read-compute-commit cycle: snapshot the record
//! with its version, validate the business rule against the snapshot, and
//! commit with the version as predicate. A losing writer repeats the whole
//! cycle with the original inputs, never with a cached intermediate value.

use crate::{
    config::RetryConfig,
    error::{Error, Result},
    gateway::PaymentGateway,
    store::BalanceStore,
    types::{BalanceEntry, BalanceEntryType, BalanceRecord, Currency, OwnerId},
    Config,
};
use rust_decimal::Decimal;
use tokio::time::{sleep, Duration};

/// The balance ledger: versioned balance rows plus their audit journals
///
/// User accounts and merchant accounts are both rows of this ledger,
/// keyed by opaque [`OwnerId`].
pub struct BalanceLedger {
    store: BalanceStore,
    retry: RetryConfig,
}

impl BalanceLedger {
    /// Create a ledger with the given configuration
    pub fn new(config: &Config) -> Self {
        Self {
            store: BalanceStore::new(),
            retry: config.retry,
        }
    }

    /// Open a zero-balance account for an owner
    pub fn open_account(&self, owner: OwnerId, currency: Currency) -> Result<BalanceRecord> {
        let record = self.store.open(owner, currency)?;
        tracing::info!(%owner, currency = %record.currency, "Account opened");
        Ok(record)
    }

    /// Current balance for an owner
    pub fn balance(&self, owner: OwnerId) -> Result<Decimal> {
        Ok(self.store.snapshot(owner)?.balance)
    }

    /// Current balance record (including version and timestamps)
    pub fn account(&self, owner: OwnerId) -> Result<BalanceRecord> {
        self.store.snapshot(owner)
    }

    /// Audit journal for an owner, oldest entry first
    pub fn history(&self, owner: OwnerId) -> Result<Vec<BalanceEntry>> {
        self.store.journal(owner)
    }

    /// Add funds to a balance
    pub async fn credit(
        &self,
        owner: OwnerId,
        amount: Decimal,
        reference: Option<&str>,
    ) -> Result<BalanceRecord> {
        if amount <= Decimal::ZERO {
            return Err(Error::InvalidAmount(amount));
        }

        let record = self
            .mutate(owner, |snapshot| {
                let after = snapshot.balance + amount;
                let entry = BalanceEntry::new(
                    owner,
                    BalanceEntryType::Credit,
                    amount,
                    snapshot.balance,
                    after,
                    reference.map(str::to_string),
                );
                Ok((after, entry))
            })
            .await?;

        tracing::info!(
            %owner,
            %amount,
            balance = %record.balance,
            "Account credited"
        );
        Ok(record)
    }

    /// Remove funds from a balance
    ///
    /// Fails with [`Error::InsufficientBalance`] when the balance is lower
    /// than `amount`; the rejection performs zero mutation.
    pub async fn debit(
        &self,
        owner: OwnerId,
        amount: Decimal,
        reference: &str,
    ) -> Result<BalanceRecord> {
        if amount <= Decimal::ZERO {
            return Err(Error::InvalidAmount(amount));
        }

        let record = self
            .mutate(owner, |snapshot| {
                if snapshot.balance < amount {
                    return Err(Error::InsufficientBalance {
                        available: snapshot.balance,
                        required: amount,
                    });
                }
                let after = snapshot.balance - amount;
                let entry = BalanceEntry::new(
                    owner,
                    BalanceEntryType::Debit,
                    amount,
                    snapshot.balance,
                    after,
                    Some(reference.to_string()),
                );
                Ok((after, entry))
            })
            .await?;

        tracing::info!(
            %owner,
            %amount,
            balance = %record.balance,
            reference,
            "Account debited"
        );
        Ok(record)
    }

    /// Add funds obtained through the external payment gateway
    ///
    /// The gateway is called once; the returned transaction reference is
    /// recorded on the audit entry. A gateway failure aborts with zero
    /// mutation.
    pub async fn recharge(
        &self,
        owner: OwnerId,
        amount: Decimal,
        gateway: &dyn PaymentGateway,
    ) -> Result<BalanceRecord> {
        if amount <= Decimal::ZERO {
            return Err(Error::InvalidAmount(amount));
        }

        // Resolve the account before charging the gateway
        self.store.snapshot(owner)?;

        let reference = gateway.process_recharge(owner, amount)?;

        let record = self
            .mutate(owner, |snapshot| {
                let after = snapshot.balance + amount;
                let entry = BalanceEntry::new(
                    owner,
                    BalanceEntryType::Recharge,
                    amount,
                    snapshot.balance,
                    after,
                    Some(reference.clone()),
                );
                Ok((after, entry))
            })
            .await?;

        tracing::info!(
            %owner,
            %amount,
            balance = %record.balance,
            reference,
            "Account recharged"
        );
        Ok(record)
    }

    /// Read-compute-commit cycle with bounded retry
    async fn mutate<F>(&self, owner: OwnerId, compute: F) -> Result<BalanceRecord>
    where
        F: Fn(&BalanceRecord) -> Result<(Decimal, BalanceEntry)>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;

            let snapshot = self.store.snapshot(owner)?;
            let (new_balance, entry) = compute(&snapshot)?;

            match self.store.commit(owner, snapshot.version, new_balance, entry) {
                Ok(record) => return Ok(record),
                Err(err) if err.is_version_conflict() => {
                    if attempt >= self.retry.max_attempts {
                        tracing::warn!(%owner, attempt, "Optimistic retries exhausted");
                        return Err(Error::ConcurrencyConflict { attempts: attempt });
                    }
                    tracing::debug!(%owner, attempt, "Version conflict, retrying");
                    sleep(Duration::from_millis(self.retry.backoff_ms)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MockGateway;

    fn ledger() -> BalanceLedger {
        BalanceLedger::new(&Config::default())
    }

    fn funded(ledger: &BalanceLedger, amount: Decimal) -> OwnerId {
        let owner = OwnerId::generate();
        ledger.open_account(owner, Currency::USD).unwrap();
        // Seed directly through the store so tests control the exact state
        let entry = BalanceEntry::new(
            owner,
            BalanceEntryType::Credit,
            amount,
            Decimal::ZERO,
            amount,
            None,
        );
        ledger.store.commit(owner, 0, amount, entry).unwrap();
        owner
    }

    #[tokio::test]
    async fn test_debit_writes_audit_entry() {
        let ledger = ledger();
        let owner = funded(&ledger, Decimal::new(10000, 2)); // 100.00

        let record = ledger
            .debit(owner, Decimal::new(3000, 2), "ORD-1")
            .await
            .unwrap();
        assert_eq!(record.balance, Decimal::new(7000, 2)); // 70.00

        let history = ledger.history(owner).unwrap();
        let entry = history.last().unwrap();
        assert_eq!(entry.entry_type, BalanceEntryType::Debit);
        assert_eq!(entry.balance_before, Decimal::new(10000, 2));
        assert_eq!(entry.balance_after, Decimal::new(7000, 2));
        assert_eq!(entry.reference.as_deref(), Some("ORD-1"));
    }

    #[tokio::test]
    async fn test_debit_insufficient_balance_leaves_state_unchanged() {
        let ledger = ledger();
        let owner = funded(&ledger, Decimal::new(5000, 2)); // 50.00

        let err = ledger
            .debit(owner, Decimal::new(8000, 2), "ORD-2")
            .await
            .unwrap_err();
        match err {
            Error::InsufficientBalance {
                available,
                required,
            } => {
                assert_eq!(available, Decimal::new(5000, 2));
                assert_eq!(required, Decimal::new(8000, 2));
            }
            other => panic!("unexpected error: {other}"),
        }

        assert_eq!(ledger.balance(owner).unwrap(), Decimal::new(5000, 2));
        assert_eq!(ledger.history(owner).unwrap().len(), 1); // only the seed
    }

    #[tokio::test]
    async fn test_non_positive_amounts_rejected() {
        let ledger = ledger();
        let owner = funded(&ledger, Decimal::new(1000, 2));

        assert!(matches!(
            ledger.credit(owner, Decimal::ZERO, None).await,
            Err(Error::InvalidAmount(_))
        ));
        assert!(matches!(
            ledger.debit(owner, Decimal::new(-100, 2), "X").await,
            Err(Error::InvalidAmount(_))
        ));
    }

    #[tokio::test]
    async fn test_debit_unknown_owner() {
        let ledger = ledger();
        let result = ledger
            .debit(OwnerId::generate(), Decimal::new(100, 2), "ORD-3")
            .await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_recharge_records_gateway_reference() {
        let ledger = ledger();
        let owner = OwnerId::generate();
        ledger.open_account(owner, Currency::USD).unwrap();

        let gateway = MockGateway::new();
        let record = ledger
            .recharge(owner, Decimal::new(25000, 2), &gateway)
            .await
            .unwrap();
        assert_eq!(record.balance, Decimal::new(25000, 2));

        let history = ledger.history(owner).unwrap();
        let entry = history.last().unwrap();
        assert_eq!(entry.entry_type, BalanceEntryType::Recharge);
        assert!(entry.reference.as_deref().unwrap().starts_with("TXN-"));
    }

    #[tokio::test]
    async fn test_recharge_unknown_owner_does_not_hit_gateway() {
        let ledger = ledger();
        let gateway = MockGateway::new();

        let result = ledger
            .recharge(OwnerId::generate(), Decimal::new(100, 2), &gateway)
            .await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_debit_credit_nets_to_zero() {
        use std::sync::Arc;

        let mut config = Config::default();
        // Tight loops conflict more often than real traffic; give the
        // mutators room so no operation exhausts its retries.
        config.retry.max_attempts = 20;
        config.retry.backoff_ms = 2;

        let ledger = Arc::new(BalanceLedger::new(&config));
        let owner = OwnerId::generate();
        ledger.open_account(owner, Currency::USD).unwrap();
        ledger
            .credit(owner, Decimal::new(100000, 2), None)
            .await
            .unwrap();

        let n = 25;
        let amount = Decimal::new(700, 2); // 7.00

        let debits = {
            let ledger = ledger.clone();
            tokio::spawn(async move {
                for i in 0..n {
                    ledger
                        .debit(owner, amount, &format!("DBT-{i}"))
                        .await
                        .unwrap();
                }
            })
        };
        let credits = {
            let ledger = ledger.clone();
            tokio::spawn(async move {
                for _ in 0..n {
                    ledger.credit(owner, amount, None).await.unwrap();
                }
            })
        };

        debits.await.unwrap();
        credits.await.unwrap();

        // Net zero, no lost update
        assert_eq!(ledger.balance(owner).unwrap(), Decimal::new(100000, 2));
        // Seed entry + 2N mutations
        assert_eq!(ledger.history(owner).unwrap().len(), 1 + 2 * n);
    }
}
