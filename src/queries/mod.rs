//! Query modules for the price ledger.
//!
//! Each module provides a query struct that borrows from a
//! [`Connection`](crate::connection::Connection) and exposes methods
//! returning `Result<T>`.

pub mod prices;

pub use prices::PriceQuery;
