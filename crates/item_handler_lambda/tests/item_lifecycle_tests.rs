use chrono::{DateTime, Duration, TimeZone, Utc};
use item_handler_core::contract::{ErrorBody, Item, ListBody, MessageBody};
use item_handler_lambda::adapters::dynamodb_store::UnconfiguredItemStore;
use item_handler_lambda::adapters::item_store::{ItemStore, StoreError};
use item_handler_lambda::adapters::memory_store::InMemoryItemStore;
use item_handler_lambda::handlers::item::{handle_item_event, ApiGatewayResponse};
use serde_json::json;
use std::sync::Mutex;

struct UnreachableStore;

impl ItemStore for UnreachableStore {
    fn get_item(&self, _id: &str) -> Result<Option<Item>, StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    fn put_item(&self, _item: &Item) -> Result<(), StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    fn delete_item(&self, _id: &str) -> Result<(), StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    fn scan_items(&self, _limit: usize) -> Result<Vec<Item>, StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }
}

/// Reads go to a real table; every write is refused before reaching it.
struct ReadOnlyStore {
    table: InMemoryItemStore,
    reads: Mutex<Vec<String>>,
}

impl ReadOnlyStore {
    fn new() -> Self {
        Self {
            table: InMemoryItemStore::new(),
            reads: Mutex::new(Vec::new()),
        }
    }
}

impl ItemStore for ReadOnlyStore {
    fn get_item(&self, id: &str) -> Result<Option<Item>, StoreError> {
        self.reads
            .lock()
            .expect("poisoned mutex")
            .push(id.to_string());
        self.table.get_item(id)
    }

    fn put_item(&self, _item: &Item) -> Result<(), StoreError> {
        Err(StoreError::Backend("write capacity exceeded".to_string()))
    }

    fn delete_item(&self, _id: &str) -> Result<(), StoreError> {
        Err(StoreError::Backend("write capacity exceeded".to_string()))
    }

    fn scan_items(&self, limit: usize) -> Result<Vec<Item>, StoreError> {
        self.table.scan_items(limit)
    }
}

fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 14, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

fn parse_item(response: &ApiGatewayResponse) -> Item {
    serde_json::from_str(&response.body).expect("item body should parse")
}

fn parse_error(response: &ApiGatewayResponse) -> String {
    serde_json::from_str::<ErrorBody>(&response.body)
        .expect("error body should parse")
        .error
}

fn put_widget(store: &dyn ItemStore, id: &str, at: DateTime<Utc>) -> ApiGatewayResponse {
    handle_item_event(
        json!({"operation": "PUT", "id": id, "name": "Widget"}),
        store,
        at,
    )
}

#[test]
fn get_without_id_is_rejected() {
    let store = InMemoryItemStore::new();
    let response = handle_item_event(json!({"operation": "GET"}), &store, start_time());

    assert_eq!(response.status_code, 400);
    assert_eq!(parse_error(&response), "Missing id parameter");
}

#[test]
fn get_of_unknown_id_is_not_found() {
    let store = InMemoryItemStore::new();
    let response = handle_item_event(
        json!({"operation": "GET", "id": "nope"}),
        &store,
        start_time(),
    );

    assert_eq!(response.status_code, 404);
    assert_eq!(parse_error(&response), "Item not found");
}

#[test]
fn put_without_id_or_name_is_rejected() {
    let store = InMemoryItemStore::new();
    for event in [
        json!({"operation": "PUT", "name": "Widget"}),
        json!({"operation": "PUT", "id": "x1"}),
    ] {
        let response = handle_item_event(event, &store, start_time());
        assert_eq!(response.status_code, 400);
        assert_eq!(
            parse_error(&response),
            "Missing required parameters: id, name"
        );
    }
    assert!(store.is_empty());
}

#[test]
fn first_put_stamps_created_at_equal_to_updated_at() {
    let store = InMemoryItemStore::new();
    let response = put_widget(&store, "x1", start_time());

    assert_eq!(response.status_code, 200);
    let item = parse_item(&response);
    assert_eq!(item.id, "x1");
    assert_eq!(item.name, "Widget");
    assert_eq!(item.description, "");
    assert!(item.created_at.is_some());
    assert_eq!(item.created_at.as_deref(), Some(item.updated_at.as_str()));
}

#[test]
fn second_put_keeps_created_at_and_advances_updated_at() {
    let store = InMemoryItemStore::new();
    let first = parse_item(&put_widget(&store, "x1", start_time()));

    let later = start_time() + Duration::seconds(5);
    let response = handle_item_event(
        json!({"operation": "PUT", "id": "x1", "name": "Widget", "description": "blue"}),
        &store,
        later,
    );

    assert_eq!(response.status_code, 200);
    let second = parse_item(&response);
    assert_eq!(second.created_at, first.created_at);
    assert!(second.updated_at > first.updated_at);
    assert_eq!(second.description, "blue");

    let fetched = handle_item_event(json!({"operation": "GET", "id": "x1"}), &store, later);
    assert_eq!(fetched.status_code, 200);
    assert_eq!(parse_item(&fetched), second);
}

#[test]
fn delete_removes_item() {
    let store = InMemoryItemStore::new();
    put_widget(&store, "x1", start_time());

    let response = handle_item_event(
        json!({"operation": "DELETE", "id": "x1"}),
        &store,
        start_time(),
    );
    assert_eq!(response.status_code, 200);
    let body: MessageBody = serde_json::from_str(&response.body).expect("message should parse");
    assert_eq!(body.message, "Item deleted successfully");

    let fetched = handle_item_event(json!({"operation": "GET", "id": "x1"}), &store, start_time());
    assert_eq!(fetched.status_code, 404);
}

#[test]
fn delete_of_never_existing_id_succeeds() {
    let store = InMemoryItemStore::new();
    let response = handle_item_event(
        json!({"operation": "DELETE", "id": "ghost"}),
        &store,
        start_time(),
    );

    assert_eq!(response.status_code, 200);
}

#[test]
fn list_is_capped_by_limit() {
    let store = InMemoryItemStore::new();
    for id in ["a", "b", "c"] {
        put_widget(&store, id, start_time());
    }

    let response = handle_item_event(
        json!({"operation": "LIST", "limit": 2}),
        &store,
        start_time(),
    );

    assert_eq!(response.status_code, 200);
    let body: ListBody = serde_json::from_str(&response.body).expect("list body should parse");
    assert_eq!(body.items.len(), 2);
    assert_eq!(body.count, 2);
}

#[test]
fn unsupported_operation_is_named() {
    let store = InMemoryItemStore::new();
    let response = handle_item_event(
        json!({"operation": "PATCH", "id": "x1"}),
        &store,
        start_time(),
    );

    assert_eq!(response.status_code, 400);
    assert!(parse_error(&response).contains("PATCH"));
}

#[test]
fn non_string_operation_tags_are_unsupported() {
    let store = InMemoryItemStore::new();
    for (tag, expected) in [
        (json!(5), "Unsupported operation: 5"),
        (json!(null), "Unsupported operation: null"),
        (json!(true), "Unsupported operation: true"),
    ] {
        let response = handle_item_event(
            json!({"operation": tag, "id": "x1"}),
            &store,
            start_time(),
        );

        assert_eq!(response.status_code, 400);
        assert_eq!(parse_error(&response), expected);
    }
}

#[test]
fn put_write_failure_after_successful_read_is_server_error() {
    let store = ReadOnlyStore::new();
    let response = put_widget(&store, "x1", start_time());

    assert_eq!(response.status_code, 500);
    assert_eq!(parse_error(&response), "write capacity exceeded");
    assert_eq!(
        *store.reads.lock().expect("poisoned mutex"),
        vec!["x1".to_string()]
    );
    assert!(store.table.is_empty());
}

#[test]
fn store_failures_surface_as_server_errors() {
    for event in [
        json!({"operation": "GET", "id": "x1"}),
        json!({"operation": "PUT", "id": "x1", "name": "Widget"}),
        json!({"operation": "DELETE", "id": "x1"}),
        json!({"operation": "LIST"}),
    ] {
        let response = handle_item_event(event, &UnreachableStore, start_time());
        assert_eq!(response.status_code, 500);
        assert_eq!(parse_error(&response), "connection refused");
    }
}

#[test]
fn unconfigured_table_fails_only_once_the_store_is_used() {
    let missing_id = handle_item_event(
        json!({"operation": "GET"}),
        &UnconfiguredItemStore,
        start_time(),
    );
    assert_eq!(missing_id.status_code, 400);

    let lookup = handle_item_event(
        json!({"operation": "GET", "id": "x1"}),
        &UnconfiguredItemStore,
        start_time(),
    );
    assert_eq!(lookup.status_code, 500);
    assert!(parse_error(&lookup).contains("DYNAMODB_TABLE"));
}
