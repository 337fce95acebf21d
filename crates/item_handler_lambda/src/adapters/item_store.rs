use item_handler_core::contract::Item;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("item table is not configured; set DYNAMODB_TABLE")]
    Unconfigured,
    #[error("{0}")]
    Backend(String),
    #[error("failed to decode stored item: {0}")]
    Decode(String),
}

/// The four key-value operations the handler consumes.
///
/// `scan_items` makes no ordering promise and returns at most `limit` items;
/// callers get no cursor to continue from.
pub trait ItemStore {
    fn get_item(&self, id: &str) -> Result<Option<Item>, StoreError>;
    fn put_item(&self, item: &Item) -> Result<(), StoreError>;
    fn delete_item(&self, id: &str) -> Result<(), StoreError>;
    fn scan_items(&self, limit: usize) -> Result<Vec<Item>, StoreError>;
}
