//! The trait a storage backend must implement to drive the engine, plus the engine error taxonomy.
//! The SQLite implementation lives in [`crate::sqlite`].

mod shop_database;

pub use shop_database::{ShopDatabase, ShopError};
