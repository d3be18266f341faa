//! `SqliteDatabase` is a concrete implementation of the SmartShop engine storage backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements the [`ShopDatabase`] trait. Every multi-step
//! operation runs inside a single transaction, so the read-then-write sections (sequence numbers, the remaining-amount
//! guard, stock decrements) cannot interleave between two concurrent callers.
use std::fmt::Debug;

use log::*;
use smartshop_common::Money;
use sqlx::SqlitePool;

use super::db::{clients, db_url, new_pool, orders, payments, products};
use crate::{
    db_types::{Client, NewOrder, NewPayment, Order, OrderItem, OrderStatus, Payment, PaymentStatus, Product, Tier},
    traits::{ShopDatabase, ShopError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

/// The remaining amount derived from the ledger. Settled payments can legitimately overshoot the total by the
/// epsilon tolerance, so the result is clamped at zero.
fn remaining_from(total: Money, settled: Money) -> Money {
    let remaining = total - settled;
    if remaining.is_negative() {
        Money::ZERO
    } else {
        remaining
    }
}

impl ShopDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_client(&self, client_id: i64) -> Result<Client, ShopError> {
        let mut conn = self.pool.acquire().await?;
        let client = clients::fetch_client(client_id, &mut conn).await?.ok_or(ShopError::ClientNotFound(client_id))?;
        Ok(client)
    }

    async fn fetch_products(&self, product_ids: &[i64]) -> Result<Vec<Product>, ShopError> {
        let mut conn = self.pool.acquire().await?;
        products::fetch_products(product_ids, &mut conn).await
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, ShopError> {
        let mut tx = self.pool.begin().await?;
        let stored = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order #{} for client #{} saved with total {}", stored.id, stored.client_id, stored.total);
        Ok(stored)
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Order, ShopError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?.ok_or(ShopError::OrderNotFound(order_id))?;
        Ok(order)
    }

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, ShopError> {
        let mut conn = self.pool.acquire().await?;
        let items = orders::fetch_order_items(order_id, &mut conn).await?;
        Ok(items)
    }

    async fn fetch_payments_for_order(&self, order_id: i64) -> Result<Vec<Payment>, ShopError> {
        let mut conn = self.pool.acquire().await?;
        let payments = payments::fetch_payments_for_order(order_id, &mut conn).await?;
        Ok(payments)
    }

    async fn fetch_payment(&self, payment_id: i64) -> Result<Payment, ShopError> {
        let mut conn = self.pool.acquire().await?;
        let payment =
            payments::fetch_payment(payment_id, &mut conn).await?.ok_or(ShopError::PaymentNotFound(payment_id))?;
        Ok(payment)
    }

    async fn add_payment(&self, payment: NewPayment) -> Result<(Payment, Money), ShopError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order(payment.order_id, &mut tx)
            .await?
            .ok_or(ShopError::OrderNotFound(payment.order_id))?;
        if !order.status.is_payable() {
            return Err(ShopError::OrderNotPayable { order_id: order.id, status: order.status });
        }
        let settled = payments::settled_total(order.id, &mut tx).await?;
        let remaining = remaining_from(order.total, settled);
        if payment.amount > remaining + Money::EPSILON {
            return Err(ShopError::PaymentExceedsRemaining { amount: payment.amount, remaining });
        }
        let seq = payments::next_sequence_number(order.id, &mut tx).await?;
        let status = payment.method.initial_status();
        let stored = payments::insert_payment(payment, status, seq, &mut tx).await?;
        let settled = payments::settled_total(order.id, &mut tx).await?;
        let remaining = remaining_from(order.total, settled);
        orders::update_remaining(order.id, remaining, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️💰️ Payment #{} of {} against order #{}. {remaining} remains outstanding", stored.id, stored.amount, order.id);
        Ok((stored, remaining))
    }

    async fn update_payment_status(
        &self,
        payment_id: i64,
        status: PaymentStatus,
    ) -> Result<(Payment, Money), ShopError> {
        let mut tx = self.pool.begin().await?;
        let payment =
            payments::fetch_payment(payment_id, &mut tx).await?.ok_or(ShopError::PaymentNotFound(payment_id))?;
        trace!("🗃️ Payment #{payment_id} is currently {}", payment.status);
        if !payment.status.can_transition_to(status) {
            return Err(ShopError::InvalidPaymentStatusChange { from: payment.status, to: status });
        }
        let updated = payments::update_payment_status(payment_id, status, &mut tx).await?;
        let order = orders::fetch_order(updated.order_id, &mut tx)
            .await?
            .ok_or(ShopError::OrderNotFound(updated.order_id))?;
        let settled = payments::settled_total(order.id, &mut tx).await?;
        let remaining = remaining_from(order.total, settled);
        orders::update_remaining(order.id, remaining, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️💰️ Payment #{payment_id} is now {status}. {remaining} remains outstanding on order #{}", order.id);
        Ok((updated, remaining))
    }

    async fn remaining_amount(&self, order_id: i64) -> Result<Money, ShopError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?.ok_or(ShopError::OrderNotFound(order_id))?;
        let settled = payments::settled_total(order_id, &mut conn).await?;
        Ok(remaining_from(order.total, settled))
    }

    async fn confirm_order(&self, order_id: i64) -> Result<Order, ShopError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order(order_id, &mut tx).await?.ok_or(ShopError::OrderNotFound(order_id))?;
        if !order.status.can_transition_to(OrderStatus::Confirmed) {
            return Err(ShopError::InvalidOrderStatusChange { from: order.status, to: OrderStatus::Confirmed });
        }
        let settled = payments::settled_total(order_id, &mut tx).await?;
        let remaining = remaining_from(order.total, settled);
        if remaining > Money::EPSILON {
            return Err(ShopError::OrderNotFullyPaid { order_id, remaining });
        }
        let items = orders::fetch_order_items(order_id, &mut tx).await?;
        for item in &items {
            products::decrement_stock(item.product_id, item.quantity, &mut tx).await?;
        }
        let confirmed = orders::update_order_status(order_id, OrderStatus::Confirmed, &mut tx).await?;
        let client = clients::incr_client_stats(confirmed.client_id, confirmed.total, &mut tx).await?;
        let tier = Tier::for_stats(client.total_orders, client.total_spent);
        if tier != client.tier {
            clients::update_tier(client.id, tier, &mut tx).await?;
            debug!("🗃️ Client #{} promoted from {} to {tier}", client.id, client.tier);
        }
        tx.commit().await?;
        debug!("🗃️✅️ Order #{order_id} confirmed. {} decremented across {} products", confirmed.total, items.len());
        Ok(confirmed)
    }

    async fn cancel_order(&self, order_id: i64) -> Result<Order, ShopError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order(order_id, &mut tx).await?.ok_or(ShopError::OrderNotFound(order_id))?;
        if !order.status.can_transition_to(OrderStatus::Canceled) {
            return Err(ShopError::InvalidOrderStatusChange { from: order.status, to: OrderStatus::Canceled });
        }
        let canceled = orders::update_order_status(order_id, OrderStatus::Canceled, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order #{order_id} canceled");
        Ok(canceled)
    }

    async fn recalculate_tier(&self, client_id: i64) -> Result<Client, ShopError> {
        let mut tx = self.pool.begin().await?;
        let client = clients::fetch_client(client_id, &mut tx).await?.ok_or(ShopError::ClientNotFound(client_id))?;
        let tier = Tier::for_stats(client.total_orders, client.total_spent);
        let client = clients::update_tier(client_id, tier, &mut tx).await?;
        tx.commit().await?;
        trace!("🗃️ Client #{client_id} tier recalculated to {tier}");
        Ok(client)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
