use serde::{Deserialize, Serialize};
use smartshop_common::Money;

use crate::db_types::{Order, OrderItem};

/// A create-order request: who is buying, what, and an optional promo code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub client_id: i64,
    pub items: Vec<LineItemRequest>,
    pub promo_code: Option<String>,
}

impl OrderRequest {
    pub fn new(client_id: i64) -> Self {
        Self { client_id, items: Vec::new(), promo_code: None }
    }

    pub fn with_item(mut self, product_id: i64, quantity: i64, unit_price: Money) -> Self {
        self.items.push(LineItemRequest { product_id, quantity, unit_price });
        self
    }

    pub fn with_promo_code<S: Into<String>>(mut self, code: S) -> Self {
        self.promo_code = Some(code.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemRequest {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Money,
}

/// An order together with its line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}
