//! Drive the built `itembox-server` binary over stdio.

use std::collections::HashMap;

use serde_json::json;

use itembox_mcp::McpClient;

#[tokio::test]
async fn serves_item_tools_over_stdio() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("database.db");
    let env = HashMap::from([("RUST_LOG".to_string(), "warn".to_string())]);
    let args = vec![
        "--transport".to_string(),
        "stdio".to_string(),
        "--db-path".to_string(),
        db_path.display().to_string(),
    ];

    let client = McpClient::spawn("items", env!("CARGO_BIN_EXE_itembox-server"), &args, &env)
        .await
        .unwrap();
    assert_eq!(client.server_info().map(|i| i.name.as_str()), Some("itembox"));
    assert_eq!(client.tool_definitions().len(), 3);

    let written = client
        .call_tool("write_item", json!({"name": "Lamp", "value": "12"}))
        .await
        .unwrap();
    assert!(written.joined_text().contains("ID: 1"));

    let listed = client.call_tool("get_items", json!({"limit": 5})).await.unwrap();
    assert!(listed.joined_text().contains("Name: Lamp"));

    assert!(client.shutdown().await.unwrap());
    assert!(db_path.exists());
}
