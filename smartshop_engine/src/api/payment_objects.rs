use serde::{Deserialize, Serialize};
use smartshop_common::Money;

use crate::db_types::{Payment, PaymentMethod};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub order_id: i64,
    pub amount: Money,
    #[serde(flatten)]
    pub method: PaymentMethod,
}

impl PaymentRequest {
    pub fn new(order_id: i64, amount: Money, method: PaymentMethod) -> Self {
        Self { order_id, amount, method }
    }
}

/// The outcome of recording or settling a payment: the payment record and the order's remaining amount afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementResult {
    pub payment: Payment,
    pub remaining: Money,
}

/// A full settlement ledger for one order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentsResult {
    pub order_id: i64,
    /// Sum of settled payment amounts only. Pending and rejected payments do not count.
    pub total_settled: Money,
    pub payments: Vec<Payment>,
}
