//! In-memory order and payment store

use crate::{
    error::{Error, Result},
    types::{Order, OrderId, OrderStatus, Payment},
};
use catalog::MerchantId;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;

/// Concurrent store of orders and their payment records
#[derive(Default)]
pub struct OrderStore {
    orders: DashMap<OrderId, Order>,
    by_number: DashMap<String, OrderId>,
    payments: DashMap<OrderId, Vec<Payment>>,
}

impl OrderStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Persist a freshly created order
    pub fn insert(&self, order: Order) {
        self.by_number.insert(order.order_number.clone(), order.id);
        self.orders.insert(order.id, order);
    }

    /// Replace an order after a state transition
    pub fn update(&self, order: Order) {
        self.orders.insert(order.id, order);
    }

    /// Look up an order by id
    pub fn get(&self, id: OrderId) -> Result<Order> {
        self.orders
            .get(&id)
            .map(|o| o.clone())
            .ok_or_else(|| Error::not_found("Order", id))
    }

    /// Look up an order by order number
    pub fn get_by_number(&self, number: &str) -> Result<Order> {
        let id = self
            .by_number
            .get(number)
            .map(|entry| *entry)
            .ok_or_else(|| Error::not_found("Order", number))?;
        self.get(id)
    }

    /// Append a payment record to an order
    pub fn record_payment(&self, payment: Payment) {
        self.payments.entry(payment.order).or_default().push(payment);
    }

    /// Payment records of an order, oldest first
    pub fn payments(&self, id: OrderId) -> Vec<Payment> {
        self.payments
            .get(&id)
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    /// All orders of a merchant, in no particular order
    pub fn orders_for_merchant(&self, merchant: MerchantId) -> Vec<Order> {
        self.orders
            .iter()
            .filter(|o| o.merchant == merchant)
            .map(|o| o.clone())
            .collect()
    }

    /// Sum of COMPLETED order totals for a merchant created in `[start, end]`
    ///
    /// Refunded orders are excluded: the refund moved the money back, so
    /// they no longer count as sales.
    pub fn completed_sales_total(
        &self,
        merchant: MerchantId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Decimal {
        self.orders
            .iter()
            .filter(|o| {
                o.merchant == merchant
                    && o.status == OrderStatus::Completed
                    && o.created_at >= start
                    && o.created_at <= end
            })
            .map(|o| o.total_amount)
            .sum()
    }
}
