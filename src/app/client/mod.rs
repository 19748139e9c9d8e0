//! Remote data client for the hosted data and storage service
//!
//! The rest of the crate only sees the [`RemoteDataClient`] trait: row
//! queries, single-row queries and remote procedure calls. Two
//! implementations are provided:
//! - [`RestClient`]: HTTP against the hosted REST endpoint, with rate
//!   limiting and bounded retries
//! - [`SnapshotClient`]: in-memory evaluation over an exported dataset
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client configuration and service endpoint
//! - `query`: the row query description and its rendering
//! - `http`: core HTTP operations with resilience patterns
//! - `rest`: the REST implementation
//! - `storage`: media bucket operations
//! - `snapshot`: the in-memory implementation

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::FetchResult;

pub mod config;
pub mod http;
pub mod query;
pub mod rest;
pub mod snapshot;
pub mod storage;

pub use config::{ClientConfig, ServiceEndpoint};
pub use query::{Filter, Order, RowQuery};
pub use rest::RestClient;
pub use snapshot::{SnapshotCall, SnapshotClient};
pub use storage::StorageClient;

/// Request/response contract of the hosted data service
#[async_trait]
pub trait RemoteDataClient: Send + Sync {
    /// Rows matching `query`
    async fn query_rows(&self, query: &RowQuery) -> FetchResult<Vec<Value>>;

    /// The single row matching `query`, `None` when there is not exactly one
    async fn query_single(&self, query: &RowQuery) -> FetchResult<Option<Value>>;

    /// Call a server-side procedure with JSON arguments
    async fn call_procedure(&self, name: &str, args: Value) -> FetchResult<Value>;

    /// Call a procedure that writes, sending it at most once
    ///
    /// Implementations that retry must not retry here: a failure reported
    /// after the service applied the call would apply it twice.
    async fn call_procedure_once(&self, name: &str, args: Value) -> FetchResult<Value> {
        self.call_procedure(name, args).await
    }
}
