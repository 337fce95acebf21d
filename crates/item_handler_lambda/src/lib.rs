//! AWS-oriented adapters and handlers for the item handler.
//!
//! This crate owns runtime integration details (the Lambda handler, the
//! DynamoDB store adapter, configuration and logging setup). Request
//! validation and item revision rules live in `item_handler_core`.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod telemetry;
