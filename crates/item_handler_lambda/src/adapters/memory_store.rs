use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use item_handler_core::contract::Item;

use crate::adapters::item_store::{ItemStore, StoreError};

/// Process-local store with the same contract as the DynamoDB table.
///
/// Backed by a `HashMap`, so scans come back in arbitrary order just like a
/// table scan would.
#[derive(Debug, Default)]
pub struct InMemoryItemStore {
    items: Mutex<HashMap<String, Item>>,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: impl IntoIterator<Item = Item>) -> Self {
        let items = items
            .into_iter()
            .map(|item| (item.id.clone(), item))
            .collect();
        Self {
            items: Mutex::new(items),
        }
    }

    /// Counts through a poisoned lock; the map itself is never left half-written.
    pub fn len(&self) -> usize {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Item>>, StoreError> {
        self.items
            .lock()
            .map_err(|_| StoreError::Backend("in-memory item store lock poisoned".to_string()))
    }
}

impl ItemStore for InMemoryItemStore {
    fn get_item(&self, id: &str) -> Result<Option<Item>, StoreError> {
        Ok(self.lock()?.get(id).cloned())
    }

    fn put_item(&self, item: &Item) -> Result<(), StoreError> {
        self.lock()?.insert(item.id.clone(), item.clone());
        Ok(())
    }

    fn delete_item(&self, id: &str) -> Result<(), StoreError> {
        self.lock()?.remove(id);
        Ok(())
    }

    fn scan_items(&self, limit: usize) -> Result<Vec<Item>, StoreError> {
        Ok(self.lock()?.values().take(limit).cloned().collect())
    }
}
