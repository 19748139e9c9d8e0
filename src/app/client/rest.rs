//! REST implementation of the remote data client
//!
//! Row queries are `GET {base}/rest/v1/{table}` with filters rendered as
//! query parameters, single-row queries ask for an object representation,
//! and procedures are `POST {base}/rest/v1/rpc/{name}` with a JSON body.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Response, StatusCode};
use serde_json::Value;
use url::Url;

use super::config::{ClientConfig, ServiceEndpoint};
use super::http::HttpHandler;
use super::query::RowQuery;
use super::storage::StorageClient;
use super::RemoteDataClient;
use crate::constants::{http, service};
use crate::errors::{ConfigResult, FetchError, FetchResult};

/// Remote data client talking to the hosted REST endpoint
#[derive(Debug, Clone)]
pub struct RestClient {
    http: Arc<HttpHandler>,
    endpoint: ServiceEndpoint,
}

impl RestClient {
    /// Creates a new RestClient
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the HTTP client cannot be built
    pub fn new(endpoint: ServiceEndpoint, config: &ClientConfig) -> ConfigResult<Self> {
        let client = config.build_service_client(&endpoint)?;
        let http = HttpHandler::new(client, config.rate_limit_rps, config.max_retries)?;

        tracing::info!("Created REST client for {}", endpoint.base_url);

        Ok(Self {
            http: Arc::new(http),
            endpoint,
        })
    }

    /// Storage client for `bucket`, sharing this client's connection pool and limits
    pub fn storage(&self, bucket: impl Into<String>) -> StorageClient {
        StorageClient::new(Arc::clone(&self.http), self.endpoint.clone(), bucket)
    }

    pub fn endpoint(&self) -> &ServiceEndpoint {
        &self.endpoint
    }

    fn rest_url(&self, path: &str) -> FetchResult<Url> {
        let full = format!("{}/{}", service::REST_PREFIX, path);
        self.endpoint
            .base_url
            .join(&full)
            .map_err(|e| FetchError::InvalidUrl {
                url: full,
                error: e.to_string(),
            })
    }
}

/// Turn a non-success response into `FetchError::Status`
pub(crate) async fn ensure_success(response: Response) -> FetchResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(FetchError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Decode a JSON body, treating an empty body as `null`
pub(crate) async fn read_json(response: Response) -> FetchResult<Value> {
    let bytes = response.bytes().await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait]
impl RemoteDataClient for RestClient {
    async fn query_rows(&self, query: &RowQuery) -> FetchResult<Vec<Value>> {
        let url = self.rest_url(&query.table)?;
        let pairs = query.to_query_pairs();

        let response = self
            .http
            .execute(|client| client.get(url.clone()).query(&pairs))
            .await?;
        let body = read_json(ensure_success(response).await?).await?;

        match body {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            other => Ok(vec![other]),
        }
    }

    async fn query_single(&self, query: &RowQuery) -> FetchResult<Option<Value>> {
        let url = self.rest_url(&query.table)?;
        let pairs = query.to_query_pairs();

        let response = self
            .http
            .execute(|client| {
                client
                    .get(url.clone())
                    .query(&pairs)
                    .header(ACCEPT, http::SINGLE_OBJECT_ACCEPT)
            })
            .await?;

        // Zero (or several) rows for an object request
        if response.status() == StatusCode::NOT_ACCEPTABLE {
            tracing::debug!("No single row for {}", query.table);
            return Ok(None);
        }

        match read_json(ensure_success(response).await?).await? {
            Value::Null => Ok(None),
            row => Ok(Some(row)),
        }
    }

    async fn call_procedure(&self, name: &str, args: Value) -> FetchResult<Value> {
        let url = self.rest_url(&format!("rpc/{}", name))?;

        let response = self
            .http
            .execute(|client| client.post(url.clone()).json(&args))
            .await?;
        read_json(ensure_success(response).await?).await
    }

    async fn call_procedure_once(&self, name: &str, args: Value) -> FetchResult<Value> {
        let url = self.rest_url(&format!("rpc/{}", name))?;

        let response = self
            .http
            .execute_once(|client| client.post(url.clone()).json(&args))
            .await?;
        read_json(ensure_success(response).await?).await
    }
}
