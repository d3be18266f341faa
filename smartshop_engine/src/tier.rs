//! Loyalty tier rules: what each tier earns, and when a client qualifies for one.

use smartshop_common::Money;

use crate::db_types::Tier;

impl Tier {
    /// The tier's discount rate in basis points (1500 = 15%).
    pub fn discount_bps(self) -> i64 {
        match self {
            Tier::Basic => 0,
            Tier::Silver => 500,
            Tier::Gold => 1_000,
            Tier::Platinum => 1_500,
        }
    }

    /// The minimum order subtotal for the tier discount to apply. Below this the discount is silently skipped,
    /// it is not an error.
    pub fn min_qualifying_subtotal(self) -> Money {
        match self {
            Tier::Basic => Money::ZERO,
            Tier::Silver => Money::from_dh(500),
            Tier::Gold => Money::from_dh(800),
            Tier::Platinum => Money::from_dh(1_200),
        }
    }

    /// Derives the tier a client is entitled to from their lifetime confirmed-order stats.
    ///
    /// Thresholds are checked from Platinum downwards and the first match wins, so satisfying either the order-count
    /// or the spend threshold of a higher tier always beats a lower one.
    pub fn for_stats(total_orders: i64, total_spent: Money) -> Tier {
        if total_orders >= 20 || total_spent >= Money::from_dh(15_000) {
            Tier::Platinum
        } else if total_orders >= 10 || total_spent >= Money::from_dh(5_000) {
            Tier::Gold
        } else if total_orders >= 3 || total_spent >= Money::from_dh(1_000) {
            Tier::Silver
        } else {
            Tier::Basic
        }
    }
}
