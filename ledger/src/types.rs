//! Core types for the balance and inventory ledgers
//!
//! All monetary values use exact decimal arithmetic; identifiers are
//! opaque UUIDs with no ordering assumptions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque identifier of a balance owner (a user account or a merchant account)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(Uuid);

impl OwnerId {
    /// Mint a fresh owner id
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Underlying UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque product identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(Uuid);

impl ProductId {
    /// Mint a fresh product id
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Underlying UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ISO 4217 currency code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Currency {
    /// US Dollar
    USD,
    /// Euro
    EUR,
    /// British Pound
    GBP,
}

impl Currency {
    /// ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
        }
    }

    /// Parse from an ISO 4217 code
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "USD" => Some(Currency::USD),
            "EUR" => Some(Currency::EUR),
            "GBP" => Some(Currency::GBP),
            _ => None,
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::USD
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A versioned balance row
///
/// The version counter increments on every committed mutation and is the
/// predicate for optimistic concurrency control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceRecord {
    /// Owner of the balance
    pub owner: OwnerId,

    /// Current balance, always >= 0
    pub balance: Decimal,

    /// Currency of the balance
    pub currency: Currency,

    /// Monotonic version counter
    pub version: u64,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
}

/// Kind of a balance journal entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceEntryType {
    /// Funds removed from the balance
    Debit,
    /// Funds added to the balance
    Credit,
    /// Funds added via the external payment gateway
    Recharge,
}

impl fmt::Display for BalanceEntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BalanceEntryType::Debit => "DEBIT",
            BalanceEntryType::Credit => "CREDIT",
            BalanceEntryType::Recharge => "RECHARGE",
        };
        write!(f, "{}", s)
    }
}

/// Immutable audit record of one balance mutation
///
/// Entries are append-only: they are never updated or deleted after the
/// commit that produced them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceEntry {
    /// Unique entry id
    pub entry_id: Uuid,

    /// Owner of the mutated balance
    pub owner: OwnerId,

    /// Kind of mutation
    pub entry_type: BalanceEntryType,

    /// Mutation amount (always positive; direction given by `entry_type`)
    pub amount: Decimal,

    /// Balance before the mutation
    pub balance_before: Decimal,

    /// Balance after the mutation
    pub balance_after: Decimal,

    /// External reference (order number, gateway transaction id, ...)
    pub reference: Option<String>,

    /// Entry creation timestamp
    pub created_at: DateTime<Utc>,
}

impl BalanceEntry {
    /// Build an entry for a mutation about to be committed
    pub fn new(
        owner: OwnerId,
        entry_type: BalanceEntryType,
        amount: Decimal,
        balance_before: Decimal,
        balance_after: Decimal,
        reference: Option<String>,
    ) -> Self {
        Self {
            entry_id: Uuid::new_v4(),
            owner,
            entry_type,
            amount,
            balance_before,
            balance_after,
            reference,
            created_at: Utc::now(),
        }
    }
}

/// A versioned stock row, one per product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockRecord {
    /// Product this row tracks
    pub product: ProductId,

    /// Units on hand, always >= 0
    pub quantity: u32,

    /// Monotonic version counter
    pub version: u64,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
}

/// Kind of a stock journal entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockEntryType {
    /// Units added to stock
    Add,
    /// Units removed from stock
    Deduct,
}

impl fmt::Display for StockEntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StockEntryType::Add => "ADD",
            StockEntryType::Deduct => "DEDUCT",
        };
        write!(f, "{}", s)
    }
}

/// Immutable audit record of one stock mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockEntry {
    /// Unique entry id
    pub entry_id: Uuid,

    /// Product of the mutated row
    pub product: ProductId,

    /// Kind of mutation
    pub entry_type: StockEntryType,

    /// Mutation quantity (always positive; direction given by `entry_type`)
    pub quantity: u32,

    /// Quantity before the mutation
    pub quantity_before: u32,

    /// Quantity after the mutation
    pub quantity_after: u32,

    /// External reference (order number, restock reference, ...)
    pub reference: Option<String>,

    /// Entry creation timestamp
    pub created_at: DateTime<Utc>,
}

impl StockEntry {
    /// Build an entry for a mutation about to be committed
    pub fn new(
        product: ProductId,
        entry_type: StockEntryType,
        quantity: u32,
        quantity_before: u32,
        quantity_after: u32,
        reference: Option<String>,
    ) -> Self {
        Self {
            entry_id: Uuid::new_v4(),
            product,
            entry_type,
            quantity,
            quantity_before,
            quantity_after,
            reference,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_parse() {
        assert_eq!(Currency::parse("USD"), Some(Currency::USD));
        assert_eq!(Currency::parse("GBP"), Some(Currency::GBP));
        assert_eq!(Currency::parse("XXX"), None);
    }

    #[test]
    fn test_entry_type_display() {
        assert_eq!(BalanceEntryType::Recharge.to_string(), "RECHARGE");
        assert_eq!(StockEntryType::Deduct.to_string(), "DEDUCT");
    }

    #[test]
    fn test_owner_id_roundtrip() {
        let id = Uuid::new_v4();
        let owner = OwnerId::from_uuid(id);
        assert_eq!(owner.as_uuid(), id);
        assert_eq!(owner.to_string(), id.to_string());
    }
}
