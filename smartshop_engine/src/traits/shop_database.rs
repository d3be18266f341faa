use smartshop_common::Money;
use thiserror::Error;

use crate::db_types::{
    Client,
    NewOrder,
    NewPayment,
    Order,
    OrderItem,
    OrderStatus,
    Payment,
    PaymentStatus,
    Product,
};

/// The storage collaborator backing the engine.
///
/// Implementations must make each multi-step method a single atomic unit: sequence-number assignment,
/// the remaining-amount check, and the stock decrement on confirmation all read shared state before
/// writing it, and two concurrent callers must never both pass the same check. Failures leave no
/// partial state behind.
#[allow(async_fn_in_trait)]
pub trait ShopDatabase: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    async fn fetch_client(&self, client_id: i64) -> Result<Client, ShopError>;

    /// Fetches the products for the given ids. Fails with [`ShopError::ProductNotFound`] if any id is
    /// unknown or refers to a soft-deleted product. The result preserves the order of `product_ids`.
    async fn fetch_products(&self, product_ids: &[i64]) -> Result<Vec<Product>, ShopError>;

    /// Persists a priced order together with its line items in one transaction.
    /// Returns the stored order record.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, ShopError>;

    async fn fetch_order(&self, order_id: i64) -> Result<Order, ShopError>;

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, ShopError>;

    /// All payments recorded against the order, in sequence-number order.
    async fn fetch_payments_for_order(&self, order_id: i64) -> Result<Vec<Payment>, ShopError>;

    async fn fetch_payment(&self, payment_id: i64) -> Result<Payment, ShopError>;

    /// Appends a payment to an order's settlement ledger. In a single transaction:
    /// * the order is checked to be in a payable status,
    /// * the remaining amount is recomputed from the settled-payments ledger and the overpayment guard
    ///   is applied,
    /// * the next gapless sequence number is assigned,
    /// * the payment is stored with its method-derived initial status,
    /// * the order's cached remaining amount is refreshed.
    ///
    /// Returns the stored payment and the order's remaining amount after the insert.
    async fn add_payment(&self, payment: NewPayment) -> Result<(Payment, Money), ShopError>;

    /// Transitions a payment out of `Pending`. Settled and rejected payments are immutable.
    /// Refreshes the order's cached remaining amount, but never confirms the order itself.
    ///
    /// Returns the updated payment and the order's remaining amount after the change.
    async fn update_payment_status(
        &self,
        payment_id: i64,
        status: PaymentStatus,
    ) -> Result<(Payment, Money), ShopError>;

    /// The order's remaining amount, recomputed from the settled-payments ledger and clamped at zero.
    /// The cached `remaining` column on the order row is never trusted.
    async fn remaining_amount(&self, order_id: i64) -> Result<Money, ShopError>;

    /// Confirms a fully paid pending order. In a single transaction:
    /// * the order must be `Pending` and its ledger-recomputed remaining amount within tolerance of zero,
    /// * stock is decremented for every line item; any shortfall aborts the whole confirmation,
    /// * the client's aggregate stats are incremented and their tier re-derived.
    ///
    /// Returns the confirmed order.
    async fn confirm_order(&self, order_id: i64) -> Result<Order, ShopError>;

    /// Cancels a pending order. No stock or client-stat side effects.
    async fn cancel_order(&self, order_id: i64) -> Result<Order, ShopError>;

    /// Re-derives the client's tier from their persisted aggregate stats and stores it.
    /// Returns the updated client record.
    async fn recalculate_tier(&self, client_id: i64) -> Result<Client, ShopError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), ShopError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum ShopError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("The requested client {0} does not exist")]
    ClientNotFound(i64),
    #[error("The requested product {0} does not exist")]
    ProductNotFound(i64),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(i64),
    #[error("The requested payment {0} does not exist")]
    PaymentNotFound(i64),
    #[error("An order must contain at least one line item")]
    EmptyOrder,
    #[error("Line item quantity must be positive, got {quantity} for product {product_id}")]
    InvalidQuantity { product_id: i64, quantity: i64 },
    #[error("Invalid promo code: {0}")]
    InvalidPromoCode(String),
    #[error("Illegal order status change: {from} -> {to}")]
    InvalidOrderStatusChange { from: OrderStatus, to: OrderStatus },
    #[error("Illegal payment status change: {from} -> {to}")]
    InvalidPaymentStatusChange { from: PaymentStatus, to: PaymentStatus },
    #[error("Order {order_id} is {status} and cannot accept payments")]
    OrderNotPayable { order_id: i64, status: OrderStatus },
    #[error("Payment amount must be positive, got {0}")]
    InvalidPaymentAmount(Money),
    #[error("Payment of {amount} exceeds the remaining {remaining} on the order")]
    PaymentExceedsRemaining { amount: Money, remaining: Money },
    #[error("Cash payments are capped at {limit} per payment, got {amount}")]
    CashLimitExceeded { amount: Money, limit: Money },
    #[error("{method} payments require a {field}")]
    MissingPaymentField { method: String, field: String },
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock { product_id: i64, requested: i64, available: i64 },
    #[error("Order {order_id} is not fully paid: {remaining} remaining")]
    OrderNotFullyPaid { order_id: i64, remaining: Money },
}

impl From<sqlx::Error> for ShopError {
    fn from(e: sqlx::Error) -> Self {
        ShopError::DatabaseError(e.to_string())
    }
}
