use chrono::{DateTime, Utc};
use item_handler_core::contract::{
    normalize_request, ErrorBody, ItemCommand, ItemRequest, ListBody, MessageBody, RequestError,
    DELETED_MESSAGE, NOT_FOUND_MESSAGE,
};
use item_handler_core::revision::{format_timestamp, next_revision};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::adapters::item_store::{ItemStore, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiGatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: Value,
    pub body: String,
}

/// Everything that ends up as a 500.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("{0}")]
    MalformedEvent(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

/// Runs one invocation against `store`.
///
/// Never fails: validation problems become 400/404 envelopes and anything
/// else is logged and folded into a 500 carrying the error text. `now` is the
/// single clock reading used for every timestamp written by this call.
pub fn handle_item_event(
    event: Value,
    store: &dyn ItemStore,
    now: DateTime<Utc>,
) -> ApiGatewayResponse {
    info!(event = %event, "received item event");

    match dispatch(event, store, now) {
        Ok(response) => {
            info!(status_code = response.status_code, "item event handled");
            response
        }
        Err(failure) => {
            error!(error = %failure, "item event failed");
            error_response(500, &failure.to_string())
        }
    }
}

fn dispatch(
    event: Value,
    store: &dyn ItemStore,
    now: DateTime<Utc>,
) -> Result<ApiGatewayResponse, HandlerError> {
    let payload = normalize_apigw_event(event)?;
    let request = serde_json::from_value::<ItemRequest>(payload)
        .map_err(|error| HandlerError::MalformedEvent(format!("Malformed request: {error}")))?;

    let command = match normalize_request(request) {
        Ok(value) => value,
        Err(RequestError::Invalid(rejection)) => {
            warn!(reason = rejection.message(), "item request rejected");
            return Ok(error_response(400, rejection.message()));
        }
        Err(RequestError::Malformed(message)) => {
            return Err(HandlerError::MalformedEvent(message));
        }
    };

    info!(
        operation = %command.operation(),
        item_id = command.item_id(),
        "dispatching item command"
    );
    execute(command, store, now)
}

fn execute(
    command: ItemCommand,
    store: &dyn ItemStore,
    now: DateTime<Utc>,
) -> Result<ApiGatewayResponse, HandlerError> {
    match command {
        ItemCommand::Get { id } => match store.get_item(&id)? {
            Some(item) => success_response(200, &item),
            None => Ok(error_response(404, NOT_FOUND_MESSAGE)),
        },
        ItemCommand::Put(put) => {
            let existing = store.get_item(&put.id)?;
            let item = next_revision(existing.as_ref(), put, &format_timestamp(now));
            store.put_item(&item)?;
            success_response(200, &item)
        }
        ItemCommand::Delete { id } => {
            store.delete_item(&id)?;
            success_response(
                200,
                &MessageBody {
                    message: DELETED_MESSAGE.to_string(),
                },
            )
        }
        ItemCommand::List { limit } => {
            let items = store.scan_items(limit)?;
            success_response(200, &ListBody::new(items))
        }
    }
}

/// Unwraps API Gateway proxy events; direct invocations pass through as-is.
fn normalize_apigw_event(event: Value) -> Result<Value, HandlerError> {
    let Some(object) = event.as_object() else {
        return Err(HandlerError::MalformedEvent(
            "Request payload must be a JSON object".to_string(),
        ));
    };

    let Some(body) = object.get("body") else {
        return Ok(event);
    };

    match body {
        Value::Null => Ok(json!({})),
        Value::Object(_) => Ok(body.clone()),
        Value::String(text) => serde_json::from_str(text)
            .map_err(|error| HandlerError::MalformedEvent(format!("Malformed JSON body: {error}"))),
        _ => Err(HandlerError::MalformedEvent(
            "Request body must be a JSON object".to_string(),
        )),
    }
}

fn success_response(
    status_code: u16,
    payload: &impl Serialize,
) -> Result<ApiGatewayResponse, HandlerError> {
    Ok(ApiGatewayResponse {
        status_code,
        headers: json_headers(),
        body: serde_json::to_string(payload)?,
    })
}

fn error_response(status_code: u16, message: &str) -> ApiGatewayResponse {
    let payload = ErrorBody {
        error: message.to_string(),
    };
    ApiGatewayResponse {
        status_code,
        headers: json_headers(),
        body: serde_json::to_string(&payload).expect("error body should serialize"),
    }
}

fn json_headers() -> Value {
    json!({"Content-Type": "application/json"})
}
