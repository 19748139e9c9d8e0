//! Error types for newsdesk
//!
//! This module defines the error types for all components of the application.
//! Fetch errors are never thrown past the hook layer; they are carried in the
//! query state so callers can tell an empty result from a failed one.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while talking to the hosted data service
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport-level HTTP failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Service answered with a non-success status
    #[error("Service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body did not match the expected shape
    #[error("Failed to decode service response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Rate limit exceeded
    #[error("Rate limit exceeded. Service responded with HTTP 429")]
    RateLimitExceeded,

    /// Maximum retries exceeded
    #[error("Maximum retry attempts ({max_retries}) exceeded")]
    MaxRetriesExceeded { max_retries: u32 },

    /// Invalid URL built from configuration
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// Remote procedure returned something unusable
    #[error("Procedure {name} failed: {reason}")]
    Procedure { name: String, reason: String },

    /// Local snapshot could not answer the query
    #[error("Snapshot query failed: {reason}")]
    Snapshot { reason: String },

    /// Prefetched resource is not an image
    #[error("Not an image: {url} ({content_type})")]
    NotAnImage { url: String, content_type: String },
}

impl FetchError {
    /// Check if a retry could succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            FetchError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            FetchError::Status { status, .. } => *status >= 500,
            FetchError::RateLimitExceeded => true,
            _ => false,
        }
    }
}

/// Media bucket errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// Underlying request failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Object name is empty or contains path separators
    #[error("Invalid object name: {name}")]
    InvalidName { name: String },

    /// Local file could not be read for upload
    #[error("Failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format: {0}")]
    InvalidFormat(#[from] toml::de::Error),

    /// Missing required configuration field
    #[error("Missing required configuration field: {field}")]
    MissingField { field: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Preload bootstrap errors
#[derive(Error, Debug)]
pub enum PreloadError {
    /// Bootstrap was started twice on the same handle
    #[error("Preload already started")]
    AlreadyStarted,

    /// Ready state was published twice
    #[error("Preload already published")]
    AlreadyPublished,
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Data service error
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Media bucket error
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Preload error
    #[error(transparent)]
    Preload(#[from] PreloadError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is recoverable (transient)
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Fetch(e) | AppError::Storage(StorageError::Fetch(e)) => e.is_recoverable(),
            _ => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Fetch(_) => "fetch",
            AppError::Storage(_) => "storage",
            AppError::Config(_) => "config",
            AppError::Preload(_) => "preload",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Fetch result type alias
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Storage result type alias
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Config result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_recoverability() {
        let server = FetchError::Status {
            status: 503,
            body: String::new(),
        };
        let client = FetchError::Status {
            status: 404,
            body: String::new(),
        };
        assert!(server.is_recoverable());
        assert!(!client.is_recoverable());
        assert!(FetchError::RateLimitExceeded.is_recoverable());
    }

    #[test]
    fn test_error_categories() {
        let app_error = AppError::from(FetchError::RateLimitExceeded);
        assert_eq!(app_error.category(), "fetch");
        assert!(app_error.is_recoverable());

        let storage = AppError::from(StorageError::InvalidName {
            name: "../x".to_string(),
        });
        assert_eq!(storage.category(), "storage");
        assert!(!storage.is_recoverable());
    }
}
