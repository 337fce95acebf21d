//! Shared item handler domain primitives.
//!
//! This crate owns the request/response contract and the store-free parts of
//! request handling (normalization, item revisions, timestamps). It
//! intentionally excludes AWS SDK and Lambda runtime concerns.

pub mod contract;
pub mod revision;
