//! Registry record types

use chrono::{DateTime, Utc};
use ledger::{Currency, OwnerId, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque user identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Mint a fresh user id
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque merchant identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MerchantId(Uuid);

impl MerchantId {
    /// Mint a fresh merchant id
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for MerchantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered buyer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// User id
    pub id: UserId,

    /// Display name
    pub name: String,

    /// Contact email
    pub email: String,

    /// Owner id of the user's prepaid balance in the ledger
    pub account: OwnerId,

    /// Registration timestamp
    pub created_at: DateTime<Utc>,
}

/// A registered seller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Merchant {
    /// Merchant id
    pub id: MerchantId,

    /// Display name
    pub name: String,

    /// Owner id of the merchant's settlement balance in the ledger
    pub account: OwnerId,

    /// Registration timestamp
    pub created_at: DateTime<Utc>,
}

/// A priced product sold by a merchant, unique per (merchant, sku)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Product id
    pub id: ProductId,

    /// Owning merchant
    pub merchant: MerchantId,

    /// Stock keeping unit, unique within the merchant
    pub sku: String,

    /// Display name
    pub name: String,

    /// Unit price
    pub price: Decimal,

    /// Price currency
    pub currency: Currency,

    /// Registration timestamp
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Total price for `quantity` units
    pub fn total_price(&self, quantity: u32) -> ledger::Result<Decimal> {
        if quantity == 0 {
            return Err(ledger::Error::InvalidQuantity(quantity));
        }
        Ok(self.price * Decimal::from(quantity))
    }
}
