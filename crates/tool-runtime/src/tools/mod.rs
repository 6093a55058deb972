//! Tools backed by the item store.

pub mod items;

pub use items::{register_item_tools, GetItemByIdTool, GetItemsTool, WriteItemTool};
