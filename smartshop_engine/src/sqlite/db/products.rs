use log::trace;
use sqlx::SqliteConnection;

use crate::{db_types::Product, traits::ShopError};

/// Fetches one live product. Soft-deleted products are treated as absent.
pub async fn fetch_product(id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as("SELECT * FROM products WHERE id = $1 AND deleted = 0")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(product)
}

/// Fetches the products for the given ids, preserving the order of `ids`. Any unknown or soft-deleted id fails the
/// whole fetch.
pub async fn fetch_products(ids: &[i64], conn: &mut SqliteConnection) -> Result<Vec<Product>, ShopError> {
    let mut products = Vec::with_capacity(ids.len());
    for id in ids {
        let product = fetch_product(*id, &mut *conn).await?.ok_or(ShopError::ProductNotFound(*id))?;
        products.push(product);
    }
    Ok(products)
}

/// Decrements the product's stock by `qty`, failing without a write if the stock on hand is insufficient.
/// Run this inside the confirmation transaction so that two orders cannot both pass the check.
pub async fn decrement_stock(product_id: i64, qty: i64, conn: &mut SqliteConnection) -> Result<(), ShopError> {
    let product =
        fetch_product(product_id, &mut *conn).await?.ok_or(ShopError::ProductNotFound(product_id))?;
    if product.stock < qty {
        return Err(ShopError::InsufficientStock { product_id, requested: qty, available: product.stock });
    }
    sqlx::query("UPDATE products SET stock = stock - $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(qty)
        .bind(product_id)
        .execute(conn)
        .await?;
    trace!("🗃️ Product #{product_id} stock decremented by {qty}");
    Ok(())
}
