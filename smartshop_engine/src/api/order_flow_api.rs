use std::fmt::Debug;

use log::*;

use crate::{
    api::order_objects::{OrderRequest, OrderWithItems},
    db_types::{NewOrder, NewOrderItem, Order, OrderStatus},
    pricing::{price_order, PriceBreakdown},
    traits::{ShopDatabase, ShopError},
};

/// `OrderFlowApi` drives the order lifecycle: pricing and creating new orders, confirming fully paid ones,
/// and cancelling pending ones.
pub struct OrderFlowApi<B> {
    db: B,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> OrderFlowApi<B>
where B: ShopDatabase
{
    /// Prices and persists a new order.
    ///
    /// The client and every referenced product must exist. If any line cannot be covered by the stock on hand the
    /// whole order is persisted as a `Rejected` audit record with zeroed money fields and no further pricing is done.
    /// Otherwise the pricing engine computes the discount and VAT breakdown and the order is persisted as `Pending`
    /// with its remaining amount initialised to the total.
    pub async fn create_order(&self, request: OrderRequest) -> Result<Order, ShopError> {
        if request.items.is_empty() {
            return Err(ShopError::EmptyOrder);
        }
        for item in &request.items {
            if item.quantity <= 0 {
                return Err(ShopError::InvalidQuantity { product_id: item.product_id, quantity: item.quantity });
            }
        }
        let client = self.db.fetch_client(request.client_id).await?;
        let product_ids = request.items.iter().map(|i| i.product_id).collect::<Vec<_>>();
        let products = self.db.fetch_products(&product_ids).await?;
        let items = request
            .items
            .iter()
            .map(|i| NewOrderItem { product_id: i.product_id, quantity: i.quantity, unit_price: i.unit_price })
            .collect::<Vec<_>>();
        let shortfall = request
            .items
            .iter()
            .zip(products.iter())
            .find(|(item, product)| product.stock < item.quantity);
        let (status, breakdown) = match shortfall {
            Some((item, product)) => {
                info!(
                    "🔄️📦️ Order for client #{} requests {} of product #{} but only {} in stock. Recording as rejected",
                    client.id, item.quantity, product.id, product.stock
                );
                (OrderStatus::Rejected, PriceBreakdown::zeroed())
            },
            None => {
                let subtotal = items.iter().map(NewOrderItem::line_total).sum();
                let breakdown = price_order(subtotal, client.tier, request.promo_code.as_deref())?;
                (OrderStatus::Pending, breakdown)
            },
        };
        let order = NewOrder {
            client_id: client.id,
            status,
            subtotal: breakdown.subtotal,
            discount: breakdown.discount,
            vat: breakdown.vat,
            total: breakdown.total,
            promo_code: request.promo_code,
            items,
        };
        let order = self.db.insert_order(order).await?;
        debug!(
            "🔄️📦️ Order #{} created as {} for client #{}: subtotal {}, discount {}, VAT {}, total {}",
            order.id, order.status, order.client_id, order.subtotal, order.discount, order.vat, order.total
        );
        Ok(order)
    }

    /// Confirms a pending, fully paid order. Stock is decremented atomically for every line item; a shortfall on any
    /// line (a race with another confirmation) aborts the whole thing. On success the client's lifetime stats grow by
    /// this order and their tier is re-derived.
    pub async fn confirm_order(&self, order_id: i64) -> Result<Order, ShopError> {
        trace!("🔄️✅️ Order #{order_id} is being confirmed");
        let order = self.db.confirm_order(order_id).await?;
        debug!("🔄️✅️ Order #{order_id} confirmed");
        Ok(order)
    }

    /// Cancels a pending order. Terminal orders cannot be cancelled.
    pub async fn cancel_order(&self, order_id: i64) -> Result<Order, ShopError> {
        let order = self.db.cancel_order(order_id).await?;
        debug!("🔄️📦️ Order #{order_id} canceled");
        Ok(order)
    }

    pub async fn fetch_order(&self, order_id: i64) -> Result<Order, ShopError> {
        self.db.fetch_order(order_id).await
    }

    /// Fetches an order together with its line items.
    pub async fn order_with_items(&self, order_id: i64) -> Result<OrderWithItems, ShopError> {
        let order = self.db.fetch_order(order_id).await?;
        let items = self.db.fetch_order_items(order_id).await?;
        Ok(OrderWithItems { order, items })
    }
}
