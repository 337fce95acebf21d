use std::collections::HashMap;
use std::future::Future;

use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use item_handler_core::contract::Item;

use crate::adapters::item_store::{ItemStore, StoreError};

pub const PARTITION_KEY: &str = "id";

const NAME_ATTRIBUTE: &str = "name";
const DESCRIPTION_ATTRIBUTE: &str = "description";
const CREATED_AT_ATTRIBUTE: &str = "createdAt";
const UPDATED_AT_ATTRIBUTE: &str = "updatedAt";

type Attributes = HashMap<String, AttributeValue>;

/// Item table backed by DynamoDB, addressed by the `id` partition key.
///
/// The client and table name are built once per process and shared by every
/// invocation.
#[derive(Debug, Clone)]
pub struct DynamoDbItemStore {
    client: aws_sdk_dynamodb::Client,
    table_name: String,
}

impl DynamoDbItemStore {
    pub fn new(client: aws_sdk_dynamodb::Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

fn block_on<F: Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

fn backend_error(action: &str, error: impl std::error::Error) -> StoreError {
    StoreError::Backend(format!("failed to {action}: {}", DisplayErrorContext(error)))
}

impl ItemStore for DynamoDbItemStore {
    fn get_item(&self, id: &str) -> Result<Option<Item>, StoreError> {
        let output = block_on(
            self.client
                .get_item()
                .table_name(&self.table_name)
                .key(PARTITION_KEY, AttributeValue::S(id.to_string()))
                .send(),
        )
        .map_err(|error| backend_error("get item", error))?;

        output.item().map(item_from_attributes).transpose()
    }

    fn put_item(&self, item: &Item) -> Result<(), StoreError> {
        block_on(
            self.client
                .put_item()
                .table_name(&self.table_name)
                .set_item(Some(item_to_attributes(item)))
                .send(),
        )
        .map(|_| ())
        .map_err(|error| backend_error("put item", error))
    }

    fn delete_item(&self, id: &str) -> Result<(), StoreError> {
        block_on(
            self.client
                .delete_item()
                .table_name(&self.table_name)
                .key(PARTITION_KEY, AttributeValue::S(id.to_string()))
                .send(),
        )
        .map(|_| ())
        .map_err(|error| backend_error("delete item", error))
    }

    // Single Scan page: DynamoDB caps it at `limit` items (and 1 MB), and the
    // LastEvaluatedKey is dropped.
    fn scan_items(&self, limit: usize) -> Result<Vec<Item>, StoreError> {
        let limit = i32::try_from(limit).unwrap_or(i32::MAX);
        let output = block_on(
            self.client
                .scan()
                .table_name(&self.table_name)
                .limit(limit)
                .send(),
        )
        .map_err(|error| backend_error("scan items", error))?;

        output.items().iter().map(item_from_attributes).collect()
    }
}

/// Stands in for the table when `DYNAMODB_TABLE` is unset; every call fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredItemStore;

impl ItemStore for UnconfiguredItemStore {
    fn get_item(&self, _id: &str) -> Result<Option<Item>, StoreError> {
        Err(StoreError::Unconfigured)
    }

    fn put_item(&self, _item: &Item) -> Result<(), StoreError> {
        Err(StoreError::Unconfigured)
    }

    fn delete_item(&self, _id: &str) -> Result<(), StoreError> {
        Err(StoreError::Unconfigured)
    }

    fn scan_items(&self, _limit: usize) -> Result<Vec<Item>, StoreError> {
        Err(StoreError::Unconfigured)
    }
}

pub fn item_to_attributes(item: &Item) -> Attributes {
    let mut attributes = HashMap::from([
        (PARTITION_KEY.to_string(), AttributeValue::S(item.id.clone())),
        (NAME_ATTRIBUTE.to_string(), AttributeValue::S(item.name.clone())),
        (
            DESCRIPTION_ATTRIBUTE.to_string(),
            AttributeValue::S(item.description.clone()),
        ),
        (
            UPDATED_AT_ATTRIBUTE.to_string(),
            AttributeValue::S(item.updated_at.clone()),
        ),
    ]);
    if let Some(created_at) = &item.created_at {
        attributes.insert(
            CREATED_AT_ATTRIBUTE.to_string(),
            AttributeValue::S(created_at.clone()),
        );
    }
    attributes
}

pub fn item_from_attributes(attributes: &Attributes) -> Result<Item, StoreError> {
    Ok(Item {
        id: required_string(attributes, PARTITION_KEY)?,
        name: required_string(attributes, NAME_ATTRIBUTE)?,
        description: optional_string(attributes, DESCRIPTION_ATTRIBUTE)?.unwrap_or_default(),
        created_at: optional_string(attributes, CREATED_AT_ATTRIBUTE)?,
        updated_at: required_string(attributes, UPDATED_AT_ATTRIBUTE)?,
    })
}

fn required_string(attributes: &Attributes, key: &str) -> Result<String, StoreError> {
    optional_string(attributes, key)?
        .ok_or_else(|| StoreError::Decode(format!("missing attribute '{key}'")))
}

fn optional_string(attributes: &Attributes, key: &str) -> Result<Option<String>, StoreError> {
    match attributes.get(key) {
        None | Some(AttributeValue::Null(_)) => Ok(None),
        Some(AttributeValue::S(value)) => Ok(Some(value.clone())),
        Some(_) => Err(StoreError::Decode(format!(
            "attribute '{key}' is not a string"
        ))),
    }
}
