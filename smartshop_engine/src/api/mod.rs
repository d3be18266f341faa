//! # SmartShop engine public API
//!
//! The `api` module exposes the programmatic API for the engine. The API is modular, so that callers can pick and
//! choose the functionality they want:
//!
//! * [`order_flow_api`] creates, confirms and cancels orders, running the pricing engine on the way in.
//! * [`settlement_api`] records payments against an order's ledger and manages their settlement status.
//! * [`tier_api`] re-derives a client's loyalty tier from their lifetime stats.
//!
//! The pattern for using all the APIs is the same. An API instance is created by supplying a database backend that
//! implements [`crate::traits::ShopDatabase`]:
//!
//! ```rust,ignore
//! use smartshop_engine::{OrderFlowApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/shop.db", 5).await?;
//! let api = OrderFlowApi::new(db);
//! let order = api.create_order(request).await?;
//! ```

pub mod order_flow_api;
pub mod order_objects;
pub mod payment_objects;
pub mod settlement_api;
pub mod tier_api;
