//! Full marketplace flow: recharge, orders, refund, reconciliation

use catalog::Catalog;
use ledger::{BalanceLedger, Config, Currency, InventoryLedger, MockGateway};
use orders::{OrderEngine, OrderStatus};
use reconciliation::{ReconciliationEngine, ReconciliationStatus};
use rust_decimal::Decimal;
use std::sync::Arc;

struct Marketplace {
    catalog: Arc<Catalog>,
    balances: Arc<BalanceLedger>,
    inventory: Arc<InventoryLedger>,
    orders: Arc<OrderEngine>,
    reconciliation: ReconciliationEngine,
}

impl Marketplace {
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
        let reconciliation =
            ReconciliationEngine::new(catalog.clone(), balances.clone(), orders.clone());
        Self {
            catalog,
            balances,
            inventory,
            orders,
            reconciliation,
        }
    }
}

#[tokio::test]
async fn test_recharge_order_refund_reconcile() {
    let m = Marketplace::new();

    let user = m.catalog.register_user("Alice", "alice@example.com");
    let merchant = m.catalog.register_merchant("Widgets Inc");
    let product = m
        .catalog
        .register_product(
            merchant.id,
            "WIDGET-STD",
            "Standard Widget",
            Decimal::new(2500, 2), // 25.00
            Currency::USD,
        )
        .unwrap();

    m.balances.open_account(user.account, Currency::USD).unwrap();
    m.balances
        .open_account(merchant.account, Currency::USD)
        .unwrap();
    m.inventory
        .add_stock(product.id, 40, "RESTOCK-1")
        .await
        .unwrap();

    // Fund the buyer through the gateway
    let gateway = MockGateway::new();
    m.balances
        .recharge(user.account, Decimal::new(20000, 2), &gateway)
        .await
        .unwrap(); // 200.00
    assert_eq!(gateway.calls(), 1);

    // Two purchases, one of which is refunded afterwards
    let kept = m
        .orders
        .place_order(user.id, merchant.id, "WIDGET-STD", 3)
        .await
        .unwrap(); // 75.00
    let returned = m
        .orders
        .place_order(user.id, merchant.id, "WIDGET-STD", 2)
        .await
        .unwrap(); // 50.00
    assert_eq!(kept.status, OrderStatus::Completed);

    m.orders.refund_order(returned.id).await.unwrap();

    // Buyer: 200.00 - 75.00; merchant: 75.00; shelf: 40 - 3
    assert_eq!(
        m.balances.balance(user.account).unwrap(),
        Decimal::new(12500, 2)
    );
    assert_eq!(
        m.balances.balance(merchant.account).unwrap(),
        Decimal::new(7500, 2)
    );
    assert_eq!(m.inventory.stock(product.id).unwrap(), 37);

    // Reconciliation sees balance == sales (the refund dropped out of both)
    let today = chrono::Utc::now().date_naive();
    let report = m.reconciliation.reconcile(merchant.id, today).unwrap();
    assert_eq!(report.status, ReconciliationStatus::Matched);
    assert_eq!(report.calculated_sales, Decimal::new(7500, 2));
}

#[tokio::test]
async fn test_failed_settlement_does_not_distort_reconciliation() {
    let m = Marketplace::new();

    let user = m.catalog.register_user("Bob", "bob@example.com");
    let merchant = m.catalog.register_merchant("Gadgets Ltd");
    let product = m
        .catalog
        .register_product(
            merchant.id,
            "GADGET-1",
            "Gadget",
            Decimal::new(1500, 2),
            Currency::USD,
        )
        .unwrap();

    m.balances.open_account(user.account, Currency::USD).unwrap();
    m.balances
        .credit(user.account, Decimal::new(10000, 2), None)
        .await
        .unwrap();
    m.inventory
        .add_stock(product.id, 5, "RESTOCK-1")
        .await
        .unwrap();

    // Merchant account opened only after a failed attempt: the first order
    // fails at the credit step and is compensated.
    let err = m
        .orders
        .place_order(user.id, merchant.id, "GADGET-1", 1)
        .await
        .unwrap_err();
    assert!(matches!(err, orders::Error::ProcessingFailed { .. }));

    m.balances
        .open_account(merchant.account, Currency::USD)
        .unwrap();
    m.orders
        .place_order(user.id, merchant.id, "GADGET-1", 2)
        .await
        .unwrap(); // 30.00

    let today = chrono::Utc::now().date_naive();
    let report = m.reconciliation.reconcile(merchant.id, today).unwrap();

    // Only the completed order counts; the failed one left no money behind
    assert_eq!(report.calculated_sales, Decimal::new(3000, 2));
    assert_eq!(report.status, ReconciliationStatus::Matched);
}
