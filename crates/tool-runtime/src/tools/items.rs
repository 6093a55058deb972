//! The three item tools: `write_item`, `get_items` and `get_item_by_id`.
//!
//! Each tool holds a shared [`ItemStore`] handle and answers with the
//! formatted text the LLM reads back to the user.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use itembox_store::format::{format_inserted, format_item_detail, format_item_list, format_not_found};
use itembox_store::{parse_item_id, ItemStore, Limit, StoreError};

use crate::registry::{RegistryError, ToolRegistry};
use crate::tool::{Tool, ToolDefinition, ToolError, ToolResult};

impl From<StoreError> for ToolError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::InvalidLimit(_) | StoreError::InvalidId(_) => {
                ToolError::InvalidInput(e.to_string())
            }
            StoreError::Database(_) => ToolError::ExecutionFailed(e.to_string()),
        }
    }
}

/// Register all item tools against one store.
pub fn register_item_tools(
    registry: &mut ToolRegistry,
    store: Arc<ItemStore>,
) -> Result<(), RegistryError> {
    registry.register(WriteItemTool::new(store.clone()))?;
    registry.register(GetItemsTool::new(store.clone()))?;
    registry.register(GetItemByIdTool::new(store))?;
    Ok(())
}

/// Optional string argument; absent or `null` means empty.
fn optional_str<'a>(input: &'a Value, field: &str) -> Result<&'a str, ToolError> {
    match input.get(field) {
        None | Some(Value::Null) => Ok(""),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(ToolError::InvalidInput(format!(
            "'{}' must be a string, got {}",
            field, other
        ))),
    }
}

/// Insert a new item.
pub struct WriteItemTool {
    store: Arc<ItemStore>,
}

impl WriteItemTool {
    pub fn new(store: Arc<ItemStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for WriteItemTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "write_item".to_string(),
            description: "Write a new item to the database. Returns a success message with the item ID.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "Name of the item (required)"
                    },
                    "description": {
                        "type": "string",
                        "description": "Description of the item",
                        "default": ""
                    },
                    "value": {
                        "type": "string",
                        "description": "Value/price of the item",
                        "default": ""
                    }
                },
                "required": ["name"]
            }),
        }
    }

    async fn execute(&self, input: Value) -> Result<ToolResult, ToolError> {
        let name = input
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidInput("missing 'name' field".to_string()))?;
        let description = optional_str(&input, "description")?;
        let value = optional_str(&input, "value")?;

        let id = self.store.insert(name, description, value).await?;
        debug!(id, name, "write_item");
        Ok(ToolResult::text(format_inserted(id, name)))
    }
}

/// List the most recent items.
pub struct GetItemsTool {
    store: Arc<ItemStore>,
}

impl GetItemsTool {
    pub fn new(store: Arc<ItemStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for GetItemsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_items".to_string(),
            description: "Get items from the database, most recent first.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "limit": {
                        "type": ["integer", "string"],
                        "description": "Maximum number of items to return (default: 10)",
                        "default": 10
                    }
                }
            }),
        }
    }

    async fn execute(&self, input: Value) -> Result<ToolResult, ToolError> {
        let limit = match input.get("limit") {
            None | Some(Value::Null) => Limit::default(),
            Some(v) => Limit::parse(v)?,
        };

        let items = self.store.list_recent(limit).await?;
        debug!(limit = limit.get(), count = items.len(), "get_items");
        Ok(ToolResult::text(format_item_list(&items)))
    }
}

/// Fetch a single item by id.
pub struct GetItemByIdTool {
    store: Arc<ItemStore>,
}

impl GetItemByIdTool {
    pub fn new(store: Arc<ItemStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for GetItemByIdTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_item_by_id".to_string(),
            description: "Get a specific item by its ID. Returns item details or a not-found message.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "item_id": {
                        "type": ["integer", "string"],
                        "description": "The ID of the item to retrieve"
                    }
                },
                "required": ["item_id"]
            }),
        }
    }

    async fn execute(&self, input: Value) -> Result<ToolResult, ToolError> {
        let raw = input
            .get("item_id")
            .ok_or_else(|| ToolError::InvalidInput("missing 'item_id' field".to_string()))?;
        let id = parse_item_id(raw)?;

        let text = match self.store.get_by_id(id).await? {
            Some(item) => format_item_detail(&item),
            None => format_not_found(id),
        };
        Ok(ToolResult::text(text))
    }
}
