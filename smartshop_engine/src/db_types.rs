use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use smartshop_common::Money;
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ConversionError(String);

//--------------------------------------        Tier         ---------------------------------------------------------
/// Customer loyalty tier. The ordering of the variants matters: qualification is evaluated from the highest tier
/// downwards, and the derived `Ord` is used to assert monotonicity in tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Type, Serialize, Deserialize)]
pub enum Tier {
    #[default]
    Basic,
    Silver,
    Gold,
    Platinum,
}

impl Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Basic => write!(f, "Basic"),
            Tier::Silver => write!(f, "Silver"),
            Tier::Gold => write!(f, "Gold"),
            Tier::Platinum => write!(f, "Platinum"),
        }
    }
}

impl FromStr for Tier {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Basic" => Ok(Self::Basic),
            "Silver" => Ok(Self::Silver),
            "Gold" => Ok(Self::Gold),
            "Platinum" => Ok(Self::Platinum),
            s => Err(ConversionError(format!("Invalid tier: {s}"))),
        }
    }
}

impl From<String> for Tier {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid tier: {value}. But this conversion cannot fail. Defaulting to Basic");
            Tier::Basic
        })
    }
}

//--------------------------------------       Client        ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub tier: Tier,
    /// Count of confirmed orders. Monotonically non-decreasing; maintained by the order-confirmation flow.
    pub total_orders: i64,
    /// Sum of confirmed order totals. Monotonically non-decreasing; maintained by the order-confirmation flow.
    pub total_spent: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------       Product       ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub unit_price: Money,
    pub stock: i64,
    /// Soft-delete flag. Deleted products cannot be resolved when pricing an order.
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------     OrderStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatus {
    /// The order passed the stock feasibility check and is awaiting settlement.
    Pending,
    /// The order is fully paid and stock has been decremented. Terminal.
    Confirmed,
    /// The order was cancelled while still pending. Terminal.
    Canceled,
    /// Stock was insufficient at creation time. The order is kept as an audit record. Terminal.
    Rejected,
}

impl OrderStatus {
    /// The only caller-invocable transitions. `Rejected` is assigned by the pricing engine at creation time and is
    /// never a transition target on an existing order.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        matches!((self, next), (OrderStatus::Pending, OrderStatus::Confirmed | OrderStatus::Canceled))
    }

    /// Payments may still be recorded against rejected orders (audit trail), but not against finalised ones.
    pub fn is_payable(self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Rejected)
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "Pending"),
            OrderStatus::Confirmed => write!(f, "Confirmed"),
            OrderStatus::Canceled => write!(f, "Canceled"),
            OrderStatus::Rejected => write!(f, "Rejected"),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Confirmed" => Ok(Self::Confirmed),
            "Canceled" => Ok(Self::Canceled),
            "Rejected" => Ok(Self::Rejected),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatus::Pending
        })
    }
}

//--------------------------------------        Order        ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub client_id: i64,
    pub status: OrderStatus,
    pub subtotal: Money,
    pub discount: Money,
    /// The VAT amount charged on this order. The rate itself is the engine constant [`crate::pricing::VAT_RATE_BPS`].
    pub vat: Money,
    pub total: Money,
    /// Cached remaining amount. A convenience for read paths only; settlement always recomputes it from the payment
    /// ledger before acting on it.
    pub remaining: Money,
    pub promo_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      OrderItem      ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

//--------------------------------------       NewOrder      ---------------------------------------------------------
/// A fully priced order, ready to be persisted together with its line items in a single transaction.
/// Produced by the pricing engine; the money fields are never recomputed after creation.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub client_id: i64,
    pub status: OrderStatus,
    pub subtotal: Money,
    pub discount: Money,
    pub vat: Money,
    pub total: Money,
    pub promo_code: Option<String>,
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Money,
}

impl NewOrderItem {
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

//--------------------------------------    PaymentMethod    ---------------------------------------------------------
/// Settlement method, carrying the fields that are only meaningful for that method. Modelling the method-specific
/// fields inside the variant makes an illegal combination (say, a cheque without a due date) unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum PaymentMethod {
    Cash {
        receipt_number: Option<String>,
    },
    Cheque {
        check_number: String,
        bank: String,
        due_date: NaiveDate,
    },
    Transfer {
        reference: String,
        bank: String,
    },
}

impl PaymentMethod {
    pub fn code(&self) -> &'static str {
        match self {
            PaymentMethod::Cash { .. } => "Cash",
            PaymentMethod::Cheque { .. } => "Cheque",
            PaymentMethod::Transfer { .. } => "Transfer",
        }
    }

    /// Cash settles on the spot; cheques and transfers are deferred until explicitly settled.
    pub fn initial_status(&self) -> PaymentStatus {
        match self {
            PaymentMethod::Cash { .. } => PaymentStatus::Settled,
            PaymentMethod::Cheque { .. } | PaymentMethod::Transfer { .. } => PaymentStatus::Pending,
        }
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

//--------------------------------------    PaymentStatus    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// Recorded but not yet collected (deferred cheque or transfer).
    Pending,
    /// Collected. Only settled payments count towards the remaining amount. Terminal.
    Settled,
    /// The cheque bounced or the transfer never arrived. Terminal.
    Rejected,
}

impl PaymentStatus {
    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        matches!((self, next), (PaymentStatus::Pending, PaymentStatus::Settled | PaymentStatus::Rejected))
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "Pending"),
            PaymentStatus::Settled => write!(f, "Settled"),
            PaymentStatus::Rejected => write!(f, "Rejected"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Settled" => Ok(Self::Settled),
            "Rejected" => Ok(Self::Rejected),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------       Payment       ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    pub amount: Money,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// 1-based, gapless within the order, assigned in arrival order. Used for invoice numbering.
    pub sequence_number: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(feature = "sqlite")]
impl FromRow<'_, sqlx::sqlite::SqliteRow> for Payment {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;
        let method: String = row.try_get("method")?;
        let method = match method.as_str() {
            "Cash" => PaymentMethod::Cash { receipt_number: row.try_get("receipt_number")? },
            "Cheque" => PaymentMethod::Cheque {
                check_number: row.try_get("check_number")?,
                bank: row.try_get("check_bank")?,
                due_date: row.try_get("check_due_date")?,
            },
            "Transfer" => PaymentMethod::Transfer {
                reference: row.try_get("transfer_reference")?,
                bank: row.try_get("transfer_bank")?,
            },
            other => {
                return Err(sqlx::Error::ColumnDecode {
                    index: "method".to_string(),
                    source: Box::new(ConversionError(format!("Invalid payment method: {other}"))),
                })
            },
        };
        Ok(Payment {
            id: row.try_get("id")?,
            order_id: row.try_get("order_id")?,
            amount: row.try_get("amount")?,
            method,
            status: row.try_get::<String, _>("status")?.parse().map_err(|e: ConversionError| {
                sqlx::Error::ColumnDecode { index: "status".to_string(), source: Box::new(e) }
            })?,
            sequence_number: row.try_get("sequence_number")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

//--------------------------------------      NewPayment     ---------------------------------------------------------
/// A validated payment, ready to be appended to an order's settlement ledger.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub order_id: i64,
    pub amount: Money,
    pub method: PaymentMethod,
}

impl NewPayment {
    pub fn new(order_id: i64, amount: Money, method: PaymentMethod) -> Self {
        Self { order_id, amount, method }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn order_status_transitions() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Canceled));
        assert!(!Pending.can_transition_to(Rejected));
        for terminal in [Confirmed, Canceled, Rejected] {
            for target in [Pending, Confirmed, Canceled, Rejected] {
                assert!(!terminal.can_transition_to(target), "{terminal} -> {target} must be rejected");
            }
        }
    }

    #[test]
    fn payable_statuses() {
        assert!(OrderStatus::Pending.is_payable());
        assert!(OrderStatus::Rejected.is_payable());
        assert!(!OrderStatus::Confirmed.is_payable());
        assert!(!OrderStatus::Canceled.is_payable());
    }

    #[test]
    fn payment_status_transitions() {
        use PaymentStatus::*;
        assert!(Pending.can_transition_to(Settled));
        assert!(Pending.can_transition_to(Rejected));
        assert!(!Settled.can_transition_to(Rejected));
        assert!(!Settled.can_transition_to(Pending));
        assert!(!Rejected.can_transition_to(Settled));
    }

    #[test]
    fn cash_settles_immediately() {
        let cash = PaymentMethod::Cash { receipt_number: None };
        assert_eq!(cash.initial_status(), PaymentStatus::Settled);
        let cheque = PaymentMethod::Cheque {
            check_number: "123".into(),
            bank: "BMCE".into(),
            due_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
        };
        assert_eq!(cheque.initial_status(), PaymentStatus::Pending);
        let transfer = PaymentMethod::Transfer { reference: "TRF-1".into(), bank: "CIH".into() };
        assert_eq!(transfer.initial_status(), PaymentStatus::Pending);
    }

    #[test]
    fn payment_method_serialises_with_a_tag() {
        let cheque = PaymentMethod::Cheque {
            check_number: "CHQ-9".into(),
            bank: "BMCE".into(),
            due_date: NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
        };
        let json = serde_json::to_value(&cheque).unwrap();
        assert_eq!(json["method"], "Cheque");
        assert_eq!(json["bank"], "BMCE");
        let back: PaymentMethod = serde_json::from_value(json).unwrap();
        assert_eq!(back, cheque);
    }

    #[test]
    fn tier_ordering() {
        assert!(Tier::Basic < Tier::Silver);
        assert!(Tier::Silver < Tier::Gold);
        assert!(Tier::Gold < Tier::Platinum);
    }
}
