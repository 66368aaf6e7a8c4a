//! Stock mutation with optimistic-concurrency retry
//!
//! Same discipline as the balance ledger, scoped per product: snapshot
//! with version, validate, commit with the version as predicate, retry
//! the whole cycle on conflict.

use crate::{
    config::RetryConfig,
    error::{Error, Result},
    store::StockStore,
    types::{ProductId, StockEntry, StockEntryType, StockRecord},
    Config,
};
use tokio::time::{sleep, Duration};

/// The inventory ledger: versioned stock rows plus their audit journals
pub struct InventoryLedger {
    store: StockStore,
    retry: RetryConfig,
}

impl InventoryLedger {
    /// Create a ledger with the given configuration
    pub fn new(config: &Config) -> Self {
        Self {
            store: StockStore::new(),
            retry: config.retry,
        }
    }

    /// Units on hand for a product
    pub fn stock(&self, product: ProductId) -> Result<u32> {
        Ok(self.store.snapshot(product)?.quantity)
    }

    /// Current stock record (including version and timestamps)
    pub fn record(&self, product: ProductId) -> Result<StockRecord> {
        self.store.snapshot(product)
    }

    /// Audit journal for a product, oldest entry first
    pub fn history(&self, product: ProductId) -> Result<Vec<StockEntry>> {
        self.store.journal(product)
    }

    /// Add units to a product's stock
    ///
    /// A zero-quantity row is created on first use for the product.
    pub async fn add_stock(
        &self,
        product: ProductId,
        quantity: u32,
        reference: &str,
    ) -> Result<StockRecord> {
        if quantity == 0 {
            return Err(Error::InvalidQuantity(quantity));
        }

        // First use creates the row the retry cycle operates on
        self.store.snapshot_or_create(product);

        let record = self
            .mutate(product, |snapshot| {
                let after = snapshot.quantity + quantity;
                let entry = StockEntry::new(
                    product,
                    StockEntryType::Add,
                    quantity,
                    snapshot.quantity,
                    after,
                    Some(reference.to_string()),
                );
                Ok((after, entry))
            })
            .await?;

        tracing::info!(
            %product,
            quantity,
            stock = record.quantity,
            reference,
            "Stock added"
        );
        Ok(record)
    }

    /// Remove units from a product's stock
    ///
    /// Fails with [`Error::InsufficientStock`] when fewer units are on hand
    /// than requested; the rejection performs zero mutation.
    pub async fn deduct_stock(
        &self,
        product: ProductId,
        quantity: u32,
        reference: &str,
    ) -> Result<StockRecord> {
        if quantity == 0 {
            return Err(Error::InvalidQuantity(quantity));
        }

        let record = self
            .mutate(product, |snapshot| {
                if snapshot.quantity < quantity {
                    return Err(Error::InsufficientStock {
                        available: snapshot.quantity,
                        requested: quantity,
                    });
                }
                let after = snapshot.quantity - quantity;
                let entry = StockEntry::new(
                    product,
                    StockEntryType::Deduct,
                    quantity,
                    snapshot.quantity,
                    after,
                    Some(reference.to_string()),
                );
                Ok((after, entry))
            })
            .await?;

        tracing::info!(
            %product,
            quantity,
            stock = record.quantity,
            reference,
            "Stock deducted"
        );
        Ok(record)
    }

    /// Read-compute-commit cycle with bounded retry
    async fn mutate<F>(&self, product: ProductId, compute: F) -> Result<StockRecord>
    where
        F: Fn(&StockRecord) -> Result<(u32, StockEntry)>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;

            let snapshot = self.store.snapshot(product)?;
            let (new_quantity, entry) = compute(&snapshot)?;

            match self
                .store
                .commit(product, snapshot.version, new_quantity, entry)
            {
                Ok(record) => return Ok(record),
                Err(err) if err.is_version_conflict() => {
                    if attempt >= self.retry.max_attempts {
                        tracing::warn!(%product, attempt, "Optimistic retries exhausted");
                        return Err(Error::ConcurrencyConflict { attempts: attempt });
                    }
                    tracing::debug!(%product, attempt, "Version conflict, retrying");
                    sleep(Duration::from_millis(self.retry.backoff_ms)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
