use log::debug;
use smartshop_common::Money;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Client, Tier},
    traits::ShopError,
};

pub async fn fetch_client(id: i64, conn: &mut SqliteConnection) -> Result<Option<Client>, sqlx::Error> {
    let client = sqlx::query_as("SELECT * FROM clients WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(client)
}

/// Folds one confirmed order into the client's lifetime aggregates. These columns only ever grow; cancellations and
/// rejections never touch them.
pub async fn incr_client_stats(id: i64, spent: Money, conn: &mut SqliteConnection) -> Result<Client, ShopError> {
    let client: Client = sqlx::query_as(
        r#"
            UPDATE clients SET
                total_orders = total_orders + 1,
                total_spent = total_spent + $1,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $2
            RETURNING *;
        "#,
    )
    .bind(spent)
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or(ShopError::ClientNotFound(id))?;
    debug!("🗃️ Client #{id} stats updated: {} orders, {} spent", client.total_orders, client.total_spent);
    Ok(client)
}

pub async fn update_tier(id: i64, tier: Tier, conn: &mut SqliteConnection) -> Result<Client, ShopError> {
    let client = sqlx::query_as(
        "UPDATE clients SET tier = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(tier.to_string())
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or(ShopError::ClientNotFound(id))?;
    Ok(client)
}
