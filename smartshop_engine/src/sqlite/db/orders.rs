use log::debug;
use smartshop_common::Money;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewOrder, Order, OrderItem, OrderStatus},
    traits::ShopError,
};

/// Inserts a priced order and its line items. This is not atomic on its own. Embed this call inside a transaction
/// and pass `&mut *tx` as the connection argument.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, ShopError> {
    let stored: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                client_id,
                status,
                subtotal,
                discount,
                vat,
                total,
                remaining,
                promo_code
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *;
        "#,
    )
    .bind(order.client_id)
    .bind(order.status.to_string())
    .bind(order.subtotal)
    .bind(order.discount)
    .bind(order.vat)
    .bind(order.total)
    .bind(order.total)
    .bind(order.promo_code)
    .fetch_one(&mut *conn)
    .await?;
    for item in &order.items {
        sqlx::query(
            r#"
                INSERT INTO order_items (order_id, product_id, quantity, unit_price, line_total)
                VALUES ($1, $2, $3, $4, $5);
            "#,
        )
        .bind(stored.id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.line_total())
        .execute(&mut *conn)
        .await?;
    }
    debug!("📝️ Order #{} inserted as {} with {} line items", stored.id, stored.status, order.items.len());
    Ok(stored)
}

pub async fn fetch_order(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_items(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

pub(crate) async fn update_order_status(
    id: i64,
    status: OrderStatus,
    conn: &mut SqliteConnection,
) -> Result<Order, ShopError> {
    let order = sqlx::query_as(
        "UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(status.to_string())
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or(ShopError::OrderNotFound(id))?;
    Ok(order)
}

/// Refreshes the cached `remaining` column. The cache is for read paths only; settlement decisions are always made
/// against the ledger-derived value the caller passes in here.
pub(crate) async fn update_remaining(
    id: i64,
    remaining: Money,
    conn: &mut SqliteConnection,
) -> Result<Order, ShopError> {
    let order = sqlx::query_as(
        "UPDATE orders SET remaining = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(remaining)
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or(ShopError::OrderNotFound(id))?;
    Ok(order)
}
