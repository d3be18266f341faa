//! SQLite backend for the SmartShop engine.

mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
