pub mod prepare_env;

use smartshop_common::Money;
use smartshop_engine::SqliteDatabase;

pub async fn seed_client(db: &SqliteDatabase, name: &str, email: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO clients (name, email) VALUES ($1, $2) RETURNING id")
        .bind(name)
        .bind(email)
        .fetch_one(db.pool())
        .await
        .expect("Error seeding client")
}

pub async fn seed_client_with_stats(
    db: &SqliteDatabase,
    name: &str,
    email: &str,
    tier: &str,
    total_orders: i64,
    total_spent: Money,
) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO clients (name, email, tier, total_orders, total_spent) VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(name)
    .bind(email)
    .bind(tier)
    .bind(total_orders)
    .bind(total_spent)
    .fetch_one(db.pool())
    .await
    .expect("Error seeding client")
}

pub async fn seed_product(db: &SqliteDatabase, name: &str, unit_price: Money, stock: i64) -> i64 {
    sqlx::query_scalar("INSERT INTO products (name, unit_price, stock) VALUES ($1, $2, $3) RETURNING id")
        .bind(name)
        .bind(unit_price)
        .bind(stock)
        .fetch_one(db.pool())
        .await
        .expect("Error seeding product")
}

pub async fn product_stock(db: &SqliteDatabase, product_id: i64) -> i64 {
    sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_one(db.pool())
        .await
        .expect("Error fetching product stock")
}
