use chrono::NaiveDate;
use log::debug;
use smartshop_common::Money;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewPayment, Payment, PaymentMethod, PaymentStatus},
    traits::ShopError,
};

pub async fn fetch_payment(id: i64, conn: &mut SqliteConnection) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as("SELECT * FROM payments WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(payment)
}

/// All payments for the order, in sequence-number order. This is the order they arrived in.
pub async fn fetch_payments_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Payment>, sqlx::Error> {
    let payments = sqlx::query_as("SELECT * FROM payments WHERE order_id = $1 ORDER BY sequence_number")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(payments)
}

/// The sum of settled payment amounts for the order. The source of truth for the remaining amount.
pub async fn settled_total(order_id: i64, conn: &mut SqliteConnection) -> Result<Money, sqlx::Error> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(amount), 0) FROM payments WHERE order_id = $1 AND status = 'Settled'",
    )
    .bind(order_id)
    .fetch_one(conn)
    .await?;
    Ok(Money::from_centimes(total))
}

/// The next gapless sequence number for the order. Must be called inside the same transaction that inserts the
/// payment, or two concurrent payments can be assigned the same number.
pub async fn next_sequence_number(order_id: i64, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let max: i64 = sqlx::query_scalar(
        "SELECT COALESCE(MAX(sequence_number), 0) FROM payments WHERE order_id = $1",
    )
    .bind(order_id)
    .fetch_one(conn)
    .await?;
    Ok(max + 1)
}

/// Inserts a payment with the given status and sequence number. The method-specific fields are flattened into
/// nullable columns; the `method` discriminator says which of them are meaningful.
pub async fn insert_payment(
    payment: NewPayment,
    status: PaymentStatus,
    sequence_number: i64,
    conn: &mut SqliteConnection,
) -> Result<Payment, ShopError> {
    type Fields = (Option<String>, Option<String>, Option<String>, Option<NaiveDate>, Option<String>, Option<String>);
    let (receipt, check_number, check_bank, check_due_date, transfer_reference, transfer_bank): Fields =
        match payment.method.clone() {
            PaymentMethod::Cash { receipt_number } => (receipt_number, None, None, None, None, None),
            PaymentMethod::Cheque { check_number, bank, due_date } => {
                (None, Some(check_number), Some(bank), Some(due_date), None, None)
            },
            PaymentMethod::Transfer { reference, bank } => (None, None, None, None, Some(reference), Some(bank)),
        };
    let stored: Payment = sqlx::query_as(
        r#"
            INSERT INTO payments (
                order_id,
                amount,
                method,
                status,
                sequence_number,
                receipt_number,
                check_number,
                check_bank,
                check_due_date,
                transfer_reference,
                transfer_bank
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *;
        "#,
    )
    .bind(payment.order_id)
    .bind(payment.amount)
    .bind(payment.method.code())
    .bind(status.to_string())
    .bind(sequence_number)
    .bind(receipt)
    .bind(check_number)
    .bind(check_bank)
    .bind(check_due_date)
    .bind(transfer_reference)
    .bind(transfer_bank)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Payment #{} ({}, seq {sequence_number}) recorded against order #{}", stored.id, stored.method, stored.order_id);
    Ok(stored)
}

pub(crate) async fn update_payment_status(
    id: i64,
    status: PaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<Payment, ShopError> {
    let payment = sqlx::query_as(
        "UPDATE payments SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(status.to_string())
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or(ShopError::PaymentNotFound(id))?;
    Ok(payment)
}
