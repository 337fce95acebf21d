use chrono::Utc;
use item_handler_lambda::adapters::dynamodb_store::{DynamoDbItemStore, UnconfiguredItemStore};
use item_handler_lambda::adapters::item_store::ItemStore;
use item_handler_lambda::config::{HandlerConfig, TABLE_NAME_ENV};
use item_handler_lambda::handlers::item::{handle_item_event, ApiGatewayResponse};
use item_handler_lambda::telemetry::init_tracing;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing::{info, warn};

type SharedStore = dyn ItemStore + Send + Sync;

async fn build_store(config: &HandlerConfig) -> Box<SharedStore> {
    let Some(table_name) = config.table_name.as_deref() else {
        warn!(
            env = TABLE_NAME_ENV,
            "item table is not configured; store operations will fail"
        );
        return Box::new(UnconfiguredItemStore);
    };

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let store = DynamoDbItemStore::new(aws_sdk_dynamodb::Client::new(&aws_config), table_name);
    info!(table_name = store.table_name(), "using dynamodb item table");
    Box::new(store)
}

async fn handle_request(
    store: &SharedStore,
    event: LambdaEvent<Value>,
) -> Result<ApiGatewayResponse, Error> {
    Ok(handle_item_event(event.payload, store, Utc::now()))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = HandlerConfig::from_env();
    let store = build_store(&config).await;
    let store: &SharedStore = store.as_ref();

    lambda_runtime::run(service_fn(move |event| handle_request(store, event))).await
}
