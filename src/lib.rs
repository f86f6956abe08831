//! REST gateway translating simple CRUD endpoints into Elasticsearch API
//! calls.

pub mod conf;
pub mod error;
pub mod es_client;
pub mod models;
pub mod operations;
pub mod response;
pub mod server;

#[cfg(test)]
mod testing;

pub use error::{GatewayError, Result};
pub use es_client::{DocumentStore, EsClient, RequestBody};
pub use operations::Elasticsearch;
