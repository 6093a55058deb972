//! SQLite-backed item store.
//!
//! One table, three statements: insert, list the most recent N, and fetch
//! by id. Every operation opens its own connection, runs a single
//! autocommit statement and closes the connection again.

pub mod error;
pub mod format;
pub mod parse;
pub mod store;

pub use error::StoreError;
pub use parse::{parse_item_id, Limit};
pub use store::ItemStore;
