// Marketplace demo - walks one trading day end to end:
// registration, recharge, orders (including a failed settlement),
// a refund, and the daily reconciliation batch.

use anyhow::Result;
use catalog::Catalog;
use ledger::{BalanceLedger, Config, Currency, InventoryLedger, MockGateway};
use orders::OrderEngine;
use reconciliation::ReconciliationEngine;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("\n=== Mercato Marketplace Demo ===\n");

    let config = Config::default();
    let catalog = Arc::new(Catalog::new());
    let balances = Arc::new(BalanceLedger::new(&config));
    let inventory = Arc::new(InventoryLedger::new(&config));
    let engine = Arc::new(OrderEngine::new(
        catalog.clone(),
        balances.clone(),
        inventory.clone(),
    ));
    let reconciliation =
        ReconciliationEngine::new(catalog.clone(), balances.clone(), engine.clone());

    // --- Registration ---
    let alice = catalog.register_user("Alice", "alice@example.com");
    let shop = catalog.register_merchant("Widgets Inc");
    let widget = catalog.register_product(
        shop.id,
        "WIDGET-STD",
        "Standard Widget",
        Decimal::new(2500, 2), // 25.00
        Currency::USD,
    )?;

    balances.open_account(alice.account, Currency::USD)?;
    balances.open_account(shop.account, Currency::USD)?;
    inventory.add_stock(widget.id, 50, "RESTOCK-1").await?;

    // --- Recharge through the payment gateway ---
    let gateway = MockGateway::new();
    let account = balances
        .recharge(alice.account, Decimal::new(20000, 2), &gateway)
        .await?;
    println!("Alice recharged, balance: {}", account.balance);

    // --- A successful order ---
    let order = engine
        .place_order(alice.id, shop.id, "WIDGET-STD", 3)
        .await?;
    println!(
        "Order {} completed for {} {}",
        order.order_number, order.total_amount, order.currency
    );

    // --- An order that exceeds the balance ---
    match engine.place_order(alice.id, shop.id, "WIDGET-STD", 20).await {
        Ok(_) => println!("unexpected success"),
        Err(err) => println!("Oversized order rejected: {err}"),
    }

    // --- A refund ---
    let returned = engine
        .place_order(alice.id, shop.id, "WIDGET-STD", 1)
        .await?;
    engine.refund_order(returned.id).await?;
    println!("Order {} refunded", returned.order_number);

    println!("\nAlice balance:    {}", balances.balance(alice.account)?);
    println!("Merchant balance: {}", balances.balance(shop.account)?);
    println!("Widgets on hand:  {}", inventory.stock(widget.id)?);

    // --- Reconciliation for today's trading ---
    let today = chrono::Utc::now().date_naive();
    let report = reconciliation.reconcile(shop.id, today)?;
    println!("\nReconciliation report:");
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
