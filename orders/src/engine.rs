//! Order orchestration
//!
//! `place_order` chains the full purchase flow: resolve actors, advisory
//! stock and balance pre-checks, persist a PENDING order, then settle it
//! (debit buyer, credit merchant, deduct stock, record payment). No lock
//! is held across the chain; each ledger mutation re-validates under its
//! own version-checked commit, and a failure partway is compensated with
//! explicit reversal entries before the order is marked FAILED.

use crate::{
    error::{Error, Result},
    store::OrderStore,
    types::{Order, OrderId, OrderStatus, Payment},
};
use catalog::{Catalog, MerchantId, UserId};
use chrono::{DateTime, Utc};
use ledger::{BalanceLedger, InventoryLedger, OwnerId};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Orchestrates purchases across the catalog and both ledgers
pub struct OrderEngine {
    catalog: Arc<Catalog>,
    balances: Arc<BalanceLedger>,
    inventory: Arc<InventoryLedger>,
    store: OrderStore,
}

impl OrderEngine {
    /// Create an engine over the shared catalog and ledgers
    pub fn new(
        catalog: Arc<Catalog>,
        balances: Arc<BalanceLedger>,
        inventory: Arc<InventoryLedger>,
    ) -> Self {
        Self {
            catalog,
            balances,
            inventory,
            store: OrderStore::new(),
        }
    }

    /// Place an order for `quantity` units of the merchant's `sku`
    ///
    /// Pre-check failures (unknown actors, insufficient stock or balance)
    /// reject before any order record exists. Once the PENDING order is
    /// persisted, a settlement failure marks it FAILED, records a failed
    /// payment and surfaces [`Error::ProcessingFailed`].
    pub async fn place_order(
        &self,
        buyer: UserId,
        merchant: MerchantId,
        sku: &str,
        quantity: u32,
    ) -> Result<Order> {
        tracing::info!(%buyer, %merchant, sku, quantity, "Processing order");

        let user = self.catalog.user(buyer)?;
        let seller = self.catalog.merchant(merchant)?;
        let product = self.catalog.product_by_sku(merchant, sku)?;

        let total_amount = product.total_price(quantity)?;

        // Advisory pre-checks: cheap rejection before an order record is
        // created. The mutators re-validate under version-checked commits.
        let available = self.inventory.stock(product.id)?;
        if available < quantity {
            return Err(ledger::Error::InsufficientStock {
                available,
                requested: quantity,
            }
            .into());
        }
        let balance = self.balances.balance(user.account)?;
        if balance < total_amount {
            return Err(ledger::Error::InsufficientBalance {
                available: balance,
                required: total_amount,
            }
            .into());
        }

        let mut order = Order::new(
            buyer,
            merchant,
            product.id,
            sku,
            quantity,
            product.price,
            total_amount,
            product.currency,
        );
        self.store.insert(order.clone());
        tracing::info!(order = %order.order_number, %total_amount, "Order created");

        match self.settle(&order, user.account, seller.account).await {
            Ok(()) => {
                order.mark_completed()?;
                self.store.update(order.clone());
                tracing::info!(order = %order.order_number, "Order completed");
                Ok(order)
            }
            Err(cause) => {
                tracing::error!(
                    order = %order.order_number,
                    error = %cause,
                    "Order settlement failed"
                );
                order.mark_failed()?;
                self.store.update(order.clone());
                self.store.record_payment(Payment::failed(order.id, total_amount));
                Err(Error::ProcessingFailed {
                    order_number: order.order_number,
                    reason: cause.to_string(),
                })
            }
        }
    }

    /// Debit buyer, credit merchant, deduct stock, record the payment
    ///
    /// Each step that fails after money moved triggers reversal entries
    /// for the steps already committed, newest first.
    async fn settle(
        &self,
        order: &Order,
        buyer_account: OwnerId,
        merchant_account: OwnerId,
    ) -> Result<()> {
        self.balances
            .debit(buyer_account, order.total_amount, &order.order_number)
            .await?;

        if let Err(err) = self
            .balances
            .credit(merchant_account, order.total_amount, Some(&order.order_number))
            .await
        {
            self.compensate_debit(buyer_account, order).await;
            return Err(err.into());
        }

        if let Err(err) = self
            .inventory
            .deduct_stock(order.product, order.quantity, &order.order_number)
            .await
        {
            self.compensate_credit(merchant_account, order).await;
            self.compensate_debit(buyer_account, order).await;
            return Err(err.into());
        }

        self.store
            .record_payment(Payment::completed(order.id, order.total_amount));
        Ok(())
    }

    /// Reversal entry undoing a committed debit
    async fn compensate_debit(&self, account: OwnerId, order: &Order) {
        let reference = format!("{}-REV", order.order_number);
        if let Err(err) = self
            .balances
            .credit(account, order.total_amount, Some(&reference))
            .await
        {
            tracing::error!(
                order = %order.order_number,
                error = %err,
                "Compensation failed: debit not reversed"
            );
        }
    }

    /// Reversal entry undoing a committed credit
    async fn compensate_credit(&self, account: OwnerId, order: &Order) {
        let reference = format!("{}-REV", order.order_number);
        if let Err(err) = self
            .balances
            .debit(account, order.total_amount, &reference)
            .await
        {
            tracing::error!(
                order = %order.order_number,
                error = %err,
                "Compensation failed: credit not reversed"
            );
        }
    }

    /// Reverse a COMPLETED order: money back to the buyer, stock back on
    /// the shelf, a refund payment recorded, status REFUNDED
    pub async fn refund_order(&self, id: OrderId) -> Result<Order> {
        let mut order = self.store.get(id)?;
        if order.status != OrderStatus::Completed {
            return Err(Error::InvalidTransition {
                from: order.status,
                to: OrderStatus::Refunded,
            });
        }

        let user = self.catalog.user(order.buyer)?;
        let seller = self.catalog.merchant(order.merchant)?;
        let reference = format!("{}-REFUND", order.order_number);

        self.balances
            .debit(seller.account, order.total_amount, &reference)
            .await?;

        if let Err(err) = self
            .balances
            .credit(user.account, order.total_amount, Some(&reference))
            .await
        {
            // Undo the merchant debit so the refund nets to zero movement
            self.compensate_debit(seller.account, &order).await;
            return Err(err.into());
        }

        if let Err(err) = self
            .inventory
            .add_stock(order.product, order.quantity, &reference)
            .await
        {
            tracing::error!(
                order = %order.order_number,
                error = %err,
                "Refund stock restore failed, reversing balance movements"
            );
            self.compensate_credit(user.account, &order).await;
            self.compensate_debit(seller.account, &order).await;
            return Err(err.into());
        }

        order.mark_refunded()?;
        self.store.update(order.clone());
        self.store
            .record_payment(Payment::refund(order.id, order.total_amount));
        tracing::info!(order = %order.order_number, "Order refunded");
        Ok(order)
    }

    /// Look up an order by id
    pub fn order(&self, id: OrderId) -> Result<Order> {
        self.store.get(id)
    }

    /// Look up an order by order number
    pub fn order_by_number(&self, number: &str) -> Result<Order> {
        self.store.get_by_number(number)
    }

    /// Payment records of an order, oldest first
    pub fn payments(&self, id: OrderId) -> Vec<Payment> {
        self.store.payments(id)
    }

    /// All orders of a merchant
    pub fn orders_for_merchant(&self, merchant: MerchantId) -> Vec<Order> {
        self.store.orders_for_merchant(merchant)
    }

    /// Stock on hand for every product of a merchant
    ///
    /// Products that never received stock report zero.
    pub fn merchant_stock_levels(
        &self,
        merchant: MerchantId,
    ) -> Result<Vec<(catalog::Product, u32)>> {
        self.catalog
            .products_for_merchant(merchant)
            .into_iter()
            .map(|product| {
                let on_hand = match self.inventory.stock(product.id) {
                    Ok(quantity) => quantity,
                    Err(ledger::Error::NotFound { .. }) => 0,
                    Err(err) => return Err(err.into()),
                };
                Ok((product, on_hand))
            })
            .collect()
    }

    /// Sum of COMPLETED order totals for a merchant created in `[start, end]`
    pub fn completed_sales_total(
        &self,
        merchant: MerchantId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Decimal {
        self.store.completed_sales_total(merchant, start, end)
    }
}
