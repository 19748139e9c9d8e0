//! HTTP client configuration and building logic
//!
//! This module handles the configuration and construction of the HTTP
//! client used to reach the hosted data and storage service.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{http, limits};
use crate::errors::{ConfigError, ConfigResult};

/// Where the hosted service lives and how to identify to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoint {
    /// Base URL, always ending with a slash
    pub base_url: Url,
    /// Public anonymous key
    pub anon_key: String,
}

impl ServiceEndpoint {
    /// Parse and normalize a service endpoint
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the URL is not absolute http(s) or the key is empty
    pub fn new(base_url: &str, anon_key: impl Into<String>) -> ConfigResult<Self> {
        let anon_key = anon_key.into();
        if anon_key.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "service.anon_key".to_string(),
            });
        }

        let mut normalized = base_url.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let url = Url::parse(&normalized).map_err(|e| ConfigError::InvalidValue {
            field: "service.url".to_string(),
            value: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue {
                field: "service.url".to_string(),
                value: base_url.to_string(),
                reason: "Expected an http or https URL".to_string(),
            });
        }

        Ok(Self {
            base_url: url,
            anon_key,
        })
    }
}

/// Configuration for the HTTP client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// TCP keep-alive settings
    pub tcp_keepalive: Option<Duration>,
    /// Connection pool idle timeout
    pub pool_idle_timeout: Option<Duration>,
    /// Maximum number of idle connections per host
    pub pool_max_per_host: usize,
    /// Request timeout; a hung request never holds a hook in loading forever
    pub request_timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Rate limit (requests per second)
    pub rate_limit_rps: u32,
    /// Retries after the first attempt for transient failures
    pub max_retries: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            tcp_keepalive: Some(Duration::from_secs(30)),
            pool_idle_timeout: Some(http::POOL_IDLE_TIMEOUT),
            pool_max_per_host: http::POOL_MAX_PER_HOST,
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            rate_limit_rps: limits::DEFAULT_RATE_LIMIT_RPS,
            max_retries: limits::MAX_RETRIES,
        }
    }
}

impl ClientConfig {
    /// Builds a plain HTTP client, used for image warm-up
    pub fn build_http_client(&self) -> ConfigResult<Client> {
        self.builder().build().map_err(|e| ConfigError::InvalidValue {
            field: "client".to_string(),
            value: String::new(),
            reason: e.to_string(),
        })
    }

    /// Builds an HTTP client that sends the service credentials with every request
    pub fn build_service_client(&self, endpoint: &ServiceEndpoint) -> ConfigResult<Client> {
        let invalid_key = |reason: String| ConfigError::InvalidValue {
            field: "service.anon_key".to_string(),
            value: "<redacted>".to_string(),
            reason,
        };

        let mut headers = HeaderMap::new();
        let mut api_key =
            HeaderValue::from_str(&endpoint.anon_key).map_err(|e| invalid_key(e.to_string()))?;
        api_key.set_sensitive(true);
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", endpoint.anon_key))
            .map_err(|e| invalid_key(e.to_string()))?;
        bearer.set_sensitive(true);
        headers.insert("apikey", api_key);
        headers.insert(AUTHORIZATION, bearer);

        self.builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                field: "client".to_string(),
                value: String::new(),
                reason: e.to_string(),
            })
    }

    fn builder(&self) -> reqwest::ClientBuilder {
        let mut client_builder = Client::builder()
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(http::USER_AGENT)
            .pool_max_idle_per_host(self.pool_max_per_host);

        if let Some(keepalive) = self.tcp_keepalive {
            client_builder = client_builder.tcp_keepalive(keepalive);
        }

        if let Some(idle_timeout) = self.pool_idle_timeout {
            client_builder = client_builder.pool_idle_timeout(idle_timeout);
        }

        client_builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.rate_limit_rps, limits::DEFAULT_RATE_LIMIT_RPS);
        assert_eq!(config.max_retries, limits::MAX_RETRIES);
        assert_eq!(config.request_timeout, http::DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_http_client_creation() {
        let config = ClientConfig {
            request_timeout: Duration::from_secs(5),
            ..Default::default()
        };
        assert!(config.build_http_client().is_ok());
    }

    #[test]
    fn test_endpoint_normalizes_trailing_slash() {
        let endpoint = ServiceEndpoint::new("https://example.test", "anon").unwrap();
        assert_eq!(endpoint.base_url.as_str(), "https://example.test/");
        assert_eq!(
            endpoint.base_url.join("rest/v1/articles").unwrap().as_str(),
            "https://example.test/rest/v1/articles"
        );
    }

    #[test]
    fn test_endpoint_rejects_bad_input() {
        assert!(matches!(
            ServiceEndpoint::new("https://example.test", " "),
            Err(ConfigError::MissingField { .. })
        ));
        assert!(ServiceEndpoint::new("ftp://example.test", "k").is_err());
        assert!(ServiceEndpoint::new("not a url", "k").is_err());
    }

    #[test]
    fn test_service_client_creation() {
        let endpoint = ServiceEndpoint::new("https://example.test", "anon-key").unwrap();
        let client = ClientConfig::default().build_service_client(&endpoint);
        assert!(client.is_ok());
    }
}
