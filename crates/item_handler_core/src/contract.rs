use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const DEFAULT_LIST_LIMIT: usize = 100;
pub const DEFAULT_OPERATION: Operation = Operation::Get;

pub const MISSING_ID_MESSAGE: &str = "Missing id parameter";
pub const MISSING_PUT_FIELDS_MESSAGE: &str = "Missing required parameters: id, name";
pub const NOT_FOUND_MESSAGE: &str = "Item not found";
pub const DELETED_MESSAGE: &str = "Item deleted successfully";

/// A persisted item, keyed by `id`.
///
/// `created_at` is optional because items written before the first-write
/// stamp existed (or by other writers) may not carry one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    pub updated_at: String,
}

/// Raw invocation payload. Every field is optional at this layer; which ones
/// are required depends on the operation tag.
///
/// `operation` is `None` only when the key is absent; an explicit `null` or a
/// non-string tag is kept as `Some` so it can be reported as unsupported.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ItemRequest {
    #[serde(default, deserialize_with = "present_value")]
    pub operation: Option<Value>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
}

fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Get,
    Put,
    Delete,
    List,
}

impl Operation {
    /// Tags are matched case-sensitively.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "GET" => Some(Self::Get),
            "PUT" => Some(Self::Put),
            "DELETE" => Some(Self::Delete),
            "LIST" => Some(Self::List),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::List => "LIST",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutItem {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// A request that passed validation and is ready to run against a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemCommand {
    Get { id: String },
    Put(PutItem),
    Delete { id: String },
    List { limit: usize },
}

impl ItemCommand {
    pub fn operation(&self) -> Operation {
        match self {
            Self::Get { .. } => Operation::Get,
            Self::Put(_) => Operation::Put,
            Self::Delete { .. } => Operation::Delete,
            Self::List { .. } => Operation::List,
        }
    }

    pub fn item_id(&self) -> Option<&str> {
        match self {
            Self::Get { id } | Self::Delete { id } => Some(id),
            Self::Put(put) => Some(&put.id),
            Self::List { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageBody {
    pub message: String,
}

/// LIST result. `items` come back in whatever order the store scanned them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListBody {
    pub items: Vec<Item>,
    pub count: usize,
}

impl ListBody {
    pub fn new(items: Vec<Item>) -> Self {
        let count = items.len();
        Self { items, count }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Why a request could not be turned into an [`ItemCommand`].
///
/// `Invalid` is the caller's fault and is reported as a client error;
/// `Malformed` covers payloads that do not fit the contract at all and is
/// reported like any other unexpected failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("{0}")]
    Invalid(ValidationError),
    #[error("{0}")]
    Malformed(String),
}

impl From<ValidationError> for RequestError {
    fn from(error: ValidationError) -> Self {
        Self::Invalid(error)
    }
}

pub fn normalize_request(request: ItemRequest) -> Result<ItemCommand, RequestError> {
    let operation = match &request.operation {
        None => DEFAULT_OPERATION,
        Some(Value::String(tag)) => Operation::parse(tag).ok_or_else(|| {
            ValidationError::new(format!("Unsupported operation: {tag}"))
        })?,
        Some(other) => {
            return Err(ValidationError::new(format!("Unsupported operation: {other}")).into());
        }
    };

    let id = non_empty(request.id);
    match operation {
        Operation::Get => id
            .map(|id| ItemCommand::Get { id })
            .ok_or_else(|| ValidationError::new(MISSING_ID_MESSAGE).into()),
        Operation::Delete => id
            .map(|id| ItemCommand::Delete { id })
            .ok_or_else(|| ValidationError::new(MISSING_ID_MESSAGE).into()),
        Operation::Put => match (id, non_empty(request.name)) {
            (Some(id), Some(name)) => Ok(ItemCommand::Put(PutItem {
                id,
                name,
                description: request.description.unwrap_or_default(),
            })),
            _ => Err(ValidationError::new(MISSING_PUT_FIELDS_MESSAGE).into()),
        },
        Operation::List => Ok(ItemCommand::List {
            limit: resolve_limit(request.limit)?,
        }),
    }
}

fn resolve_limit(limit: Option<i64>) -> Result<usize, RequestError> {
    match limit {
        None => Ok(DEFAULT_LIST_LIMIT),
        Some(value) if value > 0 => usize::try_from(value)
            .map_err(|_| RequestError::Malformed(format!("limit {value} is out of range"))),
        Some(value) => Err(RequestError::Malformed(format!(
            "limit must be a positive integer, got {value}"
        ))),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.is_empty())
}
