pub mod dynamodb_store;
pub mod item_store;
pub mod memory_store;
