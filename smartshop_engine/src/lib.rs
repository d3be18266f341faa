//! SmartShop Order Pricing & Payment Settlement Engine
//!
//! This library contains the core logic for the SmartShop retail backend: pricing new orders (tier and promo
//! discounts, VAT), walking orders through their lifecycle, settling payments against an order's ledger, and deriving
//! client loyalty tiers. It is transport-agnostic; the HTTP layer lives elsewhere.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@sqlite`]). SQLite is the supported backend. You should never need to
//!    access the database directly. Instead, use the public API provided by the engine. The exception is the data
//!    types used in the database. These are defined in the `db_types` module and are public.
//! 2. The engine public API ([`mod@api`]). This provides the public-facing functionality of the engine: order flow,
//!    payment settlement, and tier qualification. A backend needs to implement the [`traits::ShopDatabase`] trait in
//!    order to drive it.
pub mod db_types;
pub mod helpers;
pub mod pricing;
pub mod tier;
pub mod traits;

mod api;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use api::{
    order_flow_api::OrderFlowApi,
    order_objects,
    payment_objects,
    settlement_api::{SettlementApi, CASH_PAYMENT_LIMIT},
    tier_api::TierApi,
};
pub use traits::{ShopDatabase, ShopError};
