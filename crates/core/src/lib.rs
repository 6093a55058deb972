pub mod config;
pub mod item;

pub use config::{Config, Transport};
pub use item::Item;
