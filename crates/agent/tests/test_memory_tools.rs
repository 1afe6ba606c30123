//! Tests for the memory tools

use serde_json::json;

use opencoder_agent::tools::{RetrieveMemoryTool, StoreMemoryTool, ToolTrait};
use opencoder_memory::MemoryStore;

#[tokio::test]
async fn test_store_then_retrieve() {
    let store = MemoryStore::new();
    let store_tool = StoreMemoryTool::new(store.clone());
    let retrieve_tool = RetrieveMemoryTool::new(store);

    let outcome = store_tool
        .execute(json!({ "key": "favorite_language", "value": "rust" }))
        .await;
    assert!(outcome.success);
    assert_eq!(outcome.payload["key"], "favorite_language");

    let outcome = retrieve_tool
        .execute(json!({ "key": "favorite_language" }))
        .await;
    assert!(outcome.success);
    assert_eq!(outcome.payload["value"], "rust");
}

#[tokio::test]
async fn test_store_accepts_structured_values() {
    let store = MemoryStore::new();
    let store_tool = StoreMemoryTool::new(store.clone());
    let retrieve_tool = RetrieveMemoryTool::new(store);

    store_tool
        .execute(json!({ "key": "plan", "value": { "steps": [1, 2, 3] } }))
        .await;

    let outcome = retrieve_tool.execute(json!({ "key": "plan" })).await;
    assert_eq!(outcome.payload["value"]["steps"], json!([1, 2, 3]));
}

#[tokio::test]
async fn test_retrieve_missing_key_fails() {
    let store = MemoryStore::new();
    let retrieve_tool = RetrieveMemoryTool::new(store);

    let outcome = retrieve_tool.execute(json!({ "key": "absent" })).await;
    assert!(!outcome.success);
    assert!(outcome.error.unwrap().contains("absent"));
}

#[tokio::test]
async fn test_tools_share_one_store() {
    let store = MemoryStore::new();
    let store_tool = StoreMemoryTool::new(store.clone());

    store_tool.execute(json!({ "key": "k", "value": 1 })).await;
    assert_eq!(store.get("k").await, Some(json!(1)));
}
