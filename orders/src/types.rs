//! Order and payment record types

use crate::error::{Error, Result};
use catalog::{MerchantId, UserId};
use chrono::{DateTime, Utc};
use ledger::{Currency, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque order identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Mint a fresh order id
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Created, settlement not finished
    Pending,
    /// Settled: money moved, stock deducted, payment recorded
    Completed,
    /// Settlement failed, any partial movement compensated
    Failed,
    /// Completed order reversed after the fact
    Refunded,
}

impl OrderStatus {
    /// Terminal states never transition again, except COMPLETED -> REFUNDED
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Failed => "FAILED",
            OrderStatus::Refunded => "REFUNDED",
        };
        write!(f, "{s}")
    }
}

/// A purchase of `quantity` units of one product by one buyer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Order id
    pub id: OrderId,

    /// Human-facing order number, used as the ledger reference
    pub order_number: String,

    /// Buying user
    pub buyer: UserId,

    /// Selling merchant
    pub merchant: MerchantId,

    /// Purchased product
    pub product: ProductId,

    /// SKU at time of purchase
    pub sku: String,

    /// Units purchased
    pub quantity: u32,

    /// Unit price at time of purchase
    pub unit_price: Decimal,

    /// `unit_price * quantity`
    pub total_amount: Decimal,

    /// Settlement currency
    pub currency: Currency,

    /// Current lifecycle state
    pub status: OrderStatus,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last transition timestamp
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Create a new PENDING order with a generated order number
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        buyer: UserId,
        merchant: MerchantId,
        product: ProductId,
        sku: impl Into<String>,
        quantity: u32,
        unit_price: Decimal,
        total_amount: Decimal,
        currency: Currency,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::generate(),
            order_number: generate_order_number(now),
            buyer,
            merchant,
            product,
            sku: sku.into(),
            quantity,
            unit_price,
            total_amount,
            currency,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// PENDING -> COMPLETED
    pub fn mark_completed(&mut self) -> Result<()> {
        self.transition(OrderStatus::Pending, OrderStatus::Completed)
    }

    /// PENDING -> FAILED
    pub fn mark_failed(&mut self) -> Result<()> {
        self.transition(OrderStatus::Pending, OrderStatus::Failed)
    }

    /// COMPLETED -> REFUNDED
    pub fn mark_refunded(&mut self) -> Result<()> {
        self.transition(OrderStatus::Completed, OrderStatus::Refunded)
    }

    fn transition(&mut self, from: OrderStatus, to: OrderStatus) -> Result<()> {
        if self.status != from {
            return Err(Error::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Lifecycle of a payment record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// Submitted, not yet settled
    Pending,
    /// Settled against the prepaid balance
    Completed,
    /// Settlement failed, no money moved on this record
    Failed,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Completed => "COMPLETED",
            PaymentStatus::Failed => "FAILED",
        };
        write!(f, "{s}")
    }
}

/// Record of one settlement attempt against an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// Payment id
    pub id: Uuid,

    /// Order this payment settles
    pub order: OrderId,

    /// Payment method
    pub method: String,

    /// Amount settled
    pub amount: Decimal,

    /// Outcome of the attempt
    pub status: PaymentStatus,

    /// Transaction id, present only on completed payments
    pub transaction_id: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// A completed prepaid settlement with a generated transaction id
    pub fn completed(order: OrderId, amount: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            order,
            method: "PREPAID_ACCOUNT".to_string(),
            amount,
            status: PaymentStatus::Completed,
            transaction_id: Some(generate_transaction_id()),
            created_at: Utc::now(),
        }
    }

    /// A failed settlement attempt; carries no transaction id
    pub fn failed(order: OrderId, amount: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            order,
            method: "PREPAID_ACCOUNT".to_string(),
            amount,
            status: PaymentStatus::Failed,
            transaction_id: None,
            created_at: Utc::now(),
        }
    }

    /// A completed refund back onto the buyer's balance
    pub fn refund(order: OrderId, amount: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            order,
            method: "REFUND".to_string(),
            amount,
            status: PaymentStatus::Completed,
            transaction_id: Some(generate_transaction_id()),
            created_at: Utc::now(),
        }
    }
}

/// `ORD-<yyyyMMddHHmmss>-<6 hex>` order number
fn generate_order_number(at: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..6].to_uppercase();
    format!("ORD-{}-{}", at.format("%Y%m%d%H%M%S"), suffix)
}

/// `PAY-<8 hex>` payment transaction id
fn generate_transaction_id() -> String {
    format!(
        "PAY-{}",
        Uuid::new_v4().simple().to_string()[..8].to_uppercase()
    )
}
