mod support;

use smartshop_common::Money;
use smartshop_engine::{
    db_types::{OrderStatus, PaymentMethod},
    order_objects::OrderRequest,
    payment_objects::PaymentRequest,
    OrderFlowApi,
    SettlementApi,
    ShopError,
    TierApi,
};

use crate::support::{
    prepare_env::{prepare_test_env, random_db_path},
    product_stock,
    seed_client,
    seed_client_with_stats,
    seed_product,
};

fn cash(order_id: i64, amount: Money) -> PaymentRequest {
    PaymentRequest::new(order_id, amount, PaymentMethod::Cash { receipt_number: None })
}

#[tokio::test]
async fn full_order_lifecycle() {
    let db = prepare_test_env(&random_db_path()).await;
    let client_id = seed_client(&db, "Amina", "amina@example.com").await;
    let product_id = seed_product(&db, "Espresso machine", Money::from_dh(100), 10).await;
    let orders = OrderFlowApi::new(db.clone());
    let settlement = SettlementApi::new(db.clone());

    let request = OrderRequest::new(client_id).with_item(product_id, 2, Money::from_dh(100));
    let order = orders.create_order(request).await.unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.subtotal, Money::from_dh(200));
    assert_eq!(order.discount, Money::ZERO);
    assert_eq!(order.vat, Money::from_dh(40));
    assert_eq!(order.total, Money::from_dh(240));
    assert_eq!(order.remaining, Money::from_dh(240));

    let result = settlement
        .add_payment(PaymentRequest::new(
            order.id,
            Money::from_dh(240),
            PaymentMethod::Cash { receipt_number: Some("R-1001".into()) },
        ))
        .await
        .unwrap();
    assert_eq!(result.remaining, Money::ZERO);
    assert!(settlement.is_fully_paid(order.id).await.unwrap());

    let confirmed = orders.confirm_order(order.id).await.unwrap();
    assert_eq!(confirmed.status, OrderStatus::Confirmed);
    assert_eq!(product_stock(&db, product_id).await, 8);

    let client = TierApi::new(db.clone()).fetch_client(client_id).await.unwrap();
    assert_eq!(client.total_orders, 1);
    assert_eq!(client.total_spent, Money::from_dh(240));
}

#[tokio::test]
async fn infeasible_order_is_recorded_as_rejected() {
    let db = prepare_test_env(&random_db_path()).await;
    let client_id = seed_client(&db, "Karim", "karim@example.com").await;
    let product_id = seed_product(&db, "Desk lamp", Money::from_dh(50), 1).await;
    let orders = OrderFlowApi::new(db.clone());
    let settlement = SettlementApi::new(db.clone());

    let order =
        orders.create_order(OrderRequest::new(client_id).with_item(product_id, 2, Money::from_dh(50))).await.unwrap();
    assert_eq!(order.status, OrderStatus::Rejected);
    assert!(order.subtotal.is_zero());
    assert!(order.discount.is_zero());
    assert!(order.total.is_zero());
    assert!(order.remaining.is_zero());
    // The line items are kept as part of the audit record
    let with_items = orders.order_with_items(order.id).await.unwrap();
    assert_eq!(with_items.items.len(), 1);
    assert_eq!(with_items.items[0].quantity, 2);
    // Stock is untouched
    assert_eq!(product_stock(&db, product_id).await, 1);
    // Payments may still be recorded against a rejected order
    let result = settlement.add_payment(cash(order.id, Money::EPSILON)).await.unwrap();
    assert_eq!(result.payment.sequence_number, 1);
}

#[tokio::test]
async fn canceled_orders_are_terminal() {
    let db = prepare_test_env(&random_db_path()).await;
    let client_id = seed_client(&db, "Leila", "leila@example.com").await;
    let product_id = seed_product(&db, "Notebook", Money::from_dh(20), 100).await;
    let orders = OrderFlowApi::new(db.clone());
    let settlement = SettlementApi::new(db.clone());

    let order =
        orders.create_order(OrderRequest::new(client_id).with_item(product_id, 1, Money::from_dh(20))).await.unwrap();
    let canceled = orders.cancel_order(order.id).await.unwrap();
    assert_eq!(canceled.status, OrderStatus::Canceled);

    let err = settlement.add_payment(cash(order.id, Money::from_dh(10))).await.unwrap_err();
    assert!(matches!(err, ShopError::OrderNotPayable { status: OrderStatus::Canceled, .. }));
    let err = orders.confirm_order(order.id).await.unwrap_err();
    assert!(matches!(err, ShopError::InvalidOrderStatusChange { from: OrderStatus::Canceled, .. }));
    let err = orders.cancel_order(order.id).await.unwrap_err();
    assert!(matches!(err, ShopError::InvalidOrderStatusChange { from: OrderStatus::Canceled, .. }));
}

#[tokio::test]
async fn confirm_requires_full_payment() {
    let db = prepare_test_env(&random_db_path()).await;
    let client_id = seed_client(&db, "Omar", "omar@example.com").await;
    let product_id = seed_product(&db, "Kettle", Money::from_dh(100), 5).await;
    let orders = OrderFlowApi::new(db.clone());
    let settlement = SettlementApi::new(db.clone());

    let order =
        orders.create_order(OrderRequest::new(client_id).with_item(product_id, 1, Money::from_dh(100))).await.unwrap();
    // 120 total, pay only 100
    settlement.add_payment(cash(order.id, Money::from_dh(100))).await.unwrap();
    let err = orders.confirm_order(order.id).await.unwrap_err();
    assert!(matches!(err, ShopError::OrderNotFullyPaid { remaining, .. } if remaining == Money::from_dh(20)));
    assert_eq!(product_stock(&db, product_id).await, 5);
}

#[tokio::test]
async fn double_confirm_fails_without_double_decrement() {
    let db = prepare_test_env(&random_db_path()).await;
    let client_id = seed_client(&db, "Nadia", "nadia@example.com").await;
    let product_id = seed_product(&db, "Blender", Money::from_dh(100), 5).await;
    let orders = OrderFlowApi::new(db.clone());
    let settlement = SettlementApi::new(db.clone());

    let order =
        orders.create_order(OrderRequest::new(client_id).with_item(product_id, 1, Money::from_dh(100))).await.unwrap();
    settlement.add_payment(cash(order.id, Money::from_dh(120))).await.unwrap();
    orders.confirm_order(order.id).await.unwrap();
    assert_eq!(product_stock(&db, product_id).await, 4);

    let err = orders.confirm_order(order.id).await.unwrap_err();
    assert!(matches!(err, ShopError::InvalidOrderStatusChange { from: OrderStatus::Confirmed, .. }));
    assert_eq!(product_stock(&db, product_id).await, 4);
}

#[tokio::test]
async fn stock_race_at_confirmation_rolls_back() {
    let db = prepare_test_env(&random_db_path()).await;
    let client_id = seed_client(&db, "Yassine", "yassine@example.com").await;
    let product_id = seed_product(&db, "Monitor", Money::from_dh(100), 5).await;
    let orders = OrderFlowApi::new(db.clone());
    let settlement = SettlementApi::new(db.clone());

    // Both orders pass the feasibility check at creation time (5 in stock, 4 requested each)
    let first =
        orders.create_order(OrderRequest::new(client_id).with_item(product_id, 4, Money::from_dh(100))).await.unwrap();
    let second =
        orders.create_order(OrderRequest::new(client_id).with_item(product_id, 4, Money::from_dh(100))).await.unwrap();
    assert_eq!(first.status, OrderStatus::Pending);
    assert_eq!(second.status, OrderStatus::Pending);

    settlement.add_payment(cash(first.id, Money::from_dh(480))).await.unwrap();
    settlement.add_payment(cash(second.id, Money::from_dh(480))).await.unwrap();

    orders.confirm_order(first.id).await.unwrap();
    assert_eq!(product_stock(&db, product_id).await, 1);

    // The loser of the race fails cleanly: still pending, no partial decrement
    let err = orders.confirm_order(second.id).await.unwrap_err();
    assert!(matches!(err, ShopError::InsufficientStock { requested: 4, available: 1, .. }));
    let second = orders.fetch_order(second.id).await.unwrap();
    assert_eq!(second.status, OrderStatus::Pending);
    assert_eq!(product_stock(&db, product_id).await, 1);
}

#[tokio::test]
async fn malformed_promo_code_fails_creation() {
    let db = prepare_test_env(&random_db_path()).await;
    let client_id = seed_client(&db, "Sara", "sara@example.com").await;
    let product_id = seed_product(&db, "Chair", Money::from_dh(500), 10).await;
    let orders = OrderFlowApi::new(db.clone());

    let request = OrderRequest::new(client_id).with_item(product_id, 2, Money::from_dh(500)).with_promo_code("promo-abc5");
    let err = orders.create_order(request).await.unwrap_err();
    assert!(matches!(err, ShopError::InvalidPromoCode(_)));
}

#[tokio::test]
async fn tier_and_promo_discounts_are_additive() {
    let db = prepare_test_env(&random_db_path()).await;
    let client_id =
        seed_client_with_stats(&db, "Hicham", "hicham@example.com", "Gold", 12, Money::from_dh(6_000)).await;
    let product_id = seed_product(&db, "Speaker", Money::from_dh(500), 10).await;
    let orders = OrderFlowApi::new(db.clone());

    let request =
        OrderRequest::new(client_id).with_item(product_id, 2, Money::from_dh(500)).with_promo_code("PROMO-ABC5");
    let order = orders.create_order(request).await.unwrap();
    assert_eq!(order.subtotal, Money::from_dh(1_000));
    assert_eq!(order.discount, Money::from_dh(150));
    assert_eq!(order.vat, Money::from_dh(170));
    assert_eq!(order.total, Money::from_dh(1_020));
    assert_eq!(order.promo_code.as_deref(), Some("PROMO-ABC5"));
}

#[tokio::test]
async fn unknown_references_are_not_found() {
    let db = prepare_test_env(&random_db_path()).await;
    let client_id = seed_client(&db, "Rachid", "rachid@example.com").await;
    let product_id = seed_product(&db, "Mouse", Money::from_dh(15), 10).await;
    let orders = OrderFlowApi::new(db.clone());

    let err = orders
        .create_order(OrderRequest::new(999).with_item(product_id, 1, Money::from_dh(15)))
        .await
        .unwrap_err();
    assert!(matches!(err, ShopError::ClientNotFound(999)));

    let err =
        orders.create_order(OrderRequest::new(client_id).with_item(999, 1, Money::from_dh(15))).await.unwrap_err();
    assert!(matches!(err, ShopError::ProductNotFound(999)));

    let err = orders.fetch_order(999).await.unwrap_err();
    assert!(matches!(err, ShopError::OrderNotFound(999)));
}

#[tokio::test]
async fn degenerate_requests_are_rejected() {
    let db = prepare_test_env(&random_db_path()).await;
    let client_id = seed_client(&db, "Imane", "imane@example.com").await;
    let product_id = seed_product(&db, "Cable", Money::from_dh(5), 10).await;
    let orders = OrderFlowApi::new(db.clone());

    let err = orders.create_order(OrderRequest::new(client_id)).await.unwrap_err();
    assert!(matches!(err, ShopError::EmptyOrder));

    let err = orders
        .create_order(OrderRequest::new(client_id).with_item(product_id, 0, Money::from_dh(5)))
        .await
        .unwrap_err();
    assert!(matches!(err, ShopError::InvalidQuantity { quantity: 0, .. }));
}
