//! Keyed storage for versioned records and their audit journals
//!
//! Each row couples a versioned record with its append-only journal. A
//! commit runs under the map's entry guard, so the version check, the
//! record update and the journal append form one atomic unit of work:
//! readers never observe a balance without its matching audit row.
//!
//! Commits fail fast with `VersionConflict` when the version predicate
//! does not hold; the mutators' retry loop owns the recovery policy.

use crate::{
    error::{Error, Result},
    types::{BalanceEntry, BalanceRecord, Currency, OwnerId, ProductId, StockEntry, StockRecord},
};
use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;

struct BalanceRow {
    record: BalanceRecord,
    journal: Vec<BalanceEntry>,
}

/// In-process store for balance rows, keyed by owner
#[derive(Default)]
pub struct BalanceStore {
    rows: DashMap<OwnerId, BalanceRow>,
}

impl BalanceStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
        }
    }

    /// Create a balance row with an opening balance of zero
    pub fn open(&self, owner: OwnerId, currency: Currency) -> Result<BalanceRecord> {
        let now = Utc::now();
        let record = BalanceRecord {
            owner,
            balance: Decimal::ZERO,
            currency,
            version: 0,
            created_at: now,
            updated_at: now,
        };

        match self.rows.entry(owner) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(Error::already_exists("Account", owner))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(BalanceRow {
                    record: record.clone(),
                    journal: Vec::new(),
                });
                Ok(record)
            }
        }
    }

    /// Read the current record (a consistent snapshot, including its version)
    pub fn snapshot(&self, owner: OwnerId) -> Result<BalanceRecord> {
        self.rows
            .get(&owner)
            .map(|row| row.record.clone())
            .ok_or_else(|| Error::not_found("Account", owner))
    }

    /// Commit a mutation if the version is unchanged since the snapshot
    ///
    /// On success the version increments and `entry` is appended to the
    /// journal in the same critical section.
    pub fn commit(
        &self,
        owner: OwnerId,
        expected_version: u64,
        new_balance: Decimal,
        entry: BalanceEntry,
    ) -> Result<BalanceRecord> {
        let mut row = self
            .rows
            .get_mut(&owner)
            .ok_or_else(|| Error::not_found("Account", owner))?;

        if row.record.version != expected_version {
            return Err(Error::VersionConflict {
                entity: "Account",
                id: owner.to_string(),
            });
        }

        row.record.balance = new_balance;
        row.record.version += 1;
        row.record.updated_at = Utc::now();
        row.journal.push(entry);

        Ok(row.record.clone())
    }

    /// Full audit journal for an owner, oldest first
    pub fn journal(&self, owner: OwnerId) -> Result<Vec<BalanceEntry>> {
        self.rows
            .get(&owner)
            .map(|row| row.journal.clone())
            .ok_or_else(|| Error::not_found("Account", owner))
    }
}

struct StockRow {
    record: StockRecord,
    journal: Vec<StockEntry>,
}

/// In-process store for stock rows, keyed by product
#[derive(Default)]
pub struct StockStore {
    rows: DashMap<ProductId, StockRow>,
}

impl StockStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
        }
    }

    /// Read the current record for a product
    pub fn snapshot(&self, product: ProductId) -> Result<StockRecord> {
        self.rows
            .get(&product)
            .map(|row| row.record.clone())
            .ok_or_else(|| Error::not_found("Inventory", product))
    }

    /// Read the current record, creating a zero-quantity row on first use
    pub fn snapshot_or_create(&self, product: ProductId) -> StockRecord {
        let row = self.rows.entry(product).or_insert_with(|| {
            let now = Utc::now();
            StockRow {
                record: StockRecord {
                    product,
                    quantity: 0,
                    version: 0,
                    created_at: now,
                    updated_at: now,
                },
                journal: Vec::new(),
            }
        });
        row.record.clone()
    }

    /// Commit a mutation if the version is unchanged since the snapshot
    pub fn commit(
        &self,
        product: ProductId,
        expected_version: u64,
        new_quantity: u32,
        entry: StockEntry,
    ) -> Result<StockRecord> {
        let mut row = self
            .rows
            .get_mut(&product)
            .ok_or_else(|| Error::not_found("Inventory", product))?;

        if row.record.version != expected_version {
            return Err(Error::VersionConflict {
                entity: "Inventory",
                id: product.to_string(),
            });
        }

        row.record.quantity = new_quantity;
        row.record.version += 1;
        row.record.updated_at = Utc::now();
        row.journal.push(entry);

        Ok(row.record.clone())
    }

    /// Full audit journal for a product, oldest first
    pub fn journal(&self, product: ProductId) -> Result<Vec<StockEntry>> {
        self.rows
            .get(&product)
            .map(|row| row.journal.clone())
            .ok_or_else(|| Error::not_found("Inventory", product))
    }
}
