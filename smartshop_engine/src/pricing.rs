//! The pricing engine. Pure arithmetic on an order's subtotal: tier discount, promo discount, VAT.
//!
//! All pricing happens exactly once, at order creation. The resulting breakdown is persisted on the
//! order and never recomputed, so later tier changes don't retroactively reprice anything.

use smartshop_common::Money;

use crate::{db_types::Tier, helpers::is_valid_promo_code, traits::ShopError};

/// VAT rate in basis points, applied to the discounted subtotal.
pub const VAT_RATE_BPS: i64 = 2_000;

/// Flat discount added by a valid promotional code, in basis points. Additive with the tier discount.
pub const PROMO_DISCOUNT_BPS: i64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBreakdown {
    pub subtotal: Money,
    pub discount: Money,
    pub vat: Money,
    pub total: Money,
}

impl PriceBreakdown {
    /// The breakdown recorded on rejected audit orders: all money fields zeroed.
    pub fn zeroed() -> Self {
        Self { subtotal: Money::ZERO, discount: Money::ZERO, vat: Money::ZERO, total: Money::ZERO }
    }
}

/// Prices an order.
///
/// The tier discount only applies when the subtotal reaches the tier's qualifying minimum; below it the
/// discount is skipped without complaint. A present-but-malformed promo code is a hard failure, never
/// silently ignored. The two discount rates are added and applied to the subtotal in one rounding step.
pub fn price_order(subtotal: Money, tier: Tier, promo_code: Option<&str>) -> Result<PriceBreakdown, ShopError> {
    let mut discount_bps = 0;
    if subtotal >= tier.min_qualifying_subtotal() {
        discount_bps += tier.discount_bps();
    }
    if let Some(code) = promo_code {
        if !is_valid_promo_code(code) {
            return Err(ShopError::InvalidPromoCode(code.to_string()));
        }
        discount_bps += PROMO_DISCOUNT_BPS;
    }
    let discount = subtotal.percent_bps(discount_bps);
    let taxable = subtotal - discount;
    let vat = taxable.percent_bps(VAT_RATE_BPS);
    let total = taxable + vat;
    Ok(PriceBreakdown { subtotal, discount, vat, total })
}
