use std::fmt::Debug;

use log::*;
use smartshop_common::Money;

use crate::{
    api::payment_objects::{PaymentRequest, PaymentsResult, SettlementResult},
    db_types::{NewPayment, Payment, PaymentMethod, PaymentStatus},
    traits::{ShopDatabase, ShopError},
};

/// The legal ceiling on a single cash payment, enforced regardless of the order's remaining amount.
pub const CASH_PAYMENT_LIMIT: Money = Money::from_dh(20_000);

/// `SettlementApi` maintains the payment ledger for orders: recording payments, settling or rejecting deferred
/// ones, and answering "how much is still owed".
pub struct SettlementApi<B> {
    db: B,
}

impl<B> Debug for SettlementApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementApi")
    }
}

impl<B> SettlementApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

fn validate_method(method: &PaymentMethod, amount: Money) -> Result<(), ShopError> {
    let missing = |field: &str| ShopError::MissingPaymentField {
        method: method.code().to_string(),
        field: field.to_string(),
    };
    match method {
        PaymentMethod::Cash { .. } => {
            if amount > CASH_PAYMENT_LIMIT {
                return Err(ShopError::CashLimitExceeded { amount, limit: CASH_PAYMENT_LIMIT });
            }
        },
        PaymentMethod::Cheque { check_number, bank, .. } => {
            if check_number.trim().is_empty() {
                return Err(missing("check number"));
            }
            if bank.trim().is_empty() {
                return Err(missing("bank"));
            }
        },
        PaymentMethod::Transfer { reference, bank } => {
            if reference.trim().is_empty() {
                return Err(missing("reference"));
            }
            if bank.trim().is_empty() {
                return Err(missing("bank"));
            }
        },
    }
    Ok(())
}

impl<B> SettlementApi<B>
where B: ShopDatabase
{
    /// Records a payment against an order's ledger.
    ///
    /// The order must be in a payable status. The amount may not exceed the ledger-derived remaining amount by more
    /// than the epsilon tolerance, cash payments may not exceed the legal ceiling, and the method-specific fields
    /// must be present. Cash settles immediately; cheques and transfers start out pending.
    pub async fn add_payment(&self, request: PaymentRequest) -> Result<SettlementResult, ShopError> {
        if request.amount <= Money::ZERO {
            return Err(ShopError::InvalidPaymentAmount(request.amount));
        }
        validate_method(&request.method, request.amount)?;
        let payment = NewPayment::new(request.order_id, request.amount, request.method);
        let (payment, remaining) = self.db.add_payment(payment).await?;
        debug!(
            "🔄️💰️ Payment #{} of {} ({}) recorded against order #{}. Remaining: {remaining}",
            payment.id, payment.amount, payment.method, payment.order_id
        );
        Ok(SettlementResult { payment, remaining })
    }

    /// Settles or rejects a pending payment. Settled and rejected payments are immutable. The order's remaining
    /// amount is recomputed, but confirming the order stays a separate, caller-invoked step.
    pub async fn update_payment_status(
        &self,
        payment_id: i64,
        status: PaymentStatus,
    ) -> Result<SettlementResult, ShopError> {
        trace!("🔄️💰️ Payment #{payment_id} is being marked as {status}");
        let (payment, remaining) = self.db.update_payment_status(payment_id, status).await?;
        debug!("🔄️💰️ Payment #{payment_id} is now {status}. Remaining on order #{}: {remaining}", payment.order_id);
        Ok(SettlementResult { payment, remaining })
    }

    /// The order's remaining amount, always recomputed from the settled-payments ledger.
    pub async fn remaining_amount(&self, order_id: i64) -> Result<Money, ShopError> {
        self.db.remaining_amount(order_id).await
    }

    pub async fn is_fully_paid(&self, order_id: i64) -> Result<bool, ShopError> {
        let remaining = self.db.remaining_amount(order_id).await?;
        Ok(remaining < Money::EPSILON)
    }

    pub async fn fetch_payment(&self, payment_id: i64) -> Result<Payment, ShopError> {
        self.db.fetch_payment(payment_id).await
    }

    /// The full ledger for an order, in sequence-number order.
    pub async fn payments_for_order(&self, order_id: i64) -> Result<PaymentsResult, ShopError> {
        // Existence check so that an unknown order is an error rather than an empty ledger
        let order = self.db.fetch_order(order_id).await?;
        let payments = self.db.fetch_payments_for_order(order_id).await?;
        let total_settled =
            payments.iter().filter(|p| p.status == PaymentStatus::Settled).map(|p| p.amount).sum();
        Ok(PaymentsResult { order_id: order.id, total_settled, payments })
    }
}
