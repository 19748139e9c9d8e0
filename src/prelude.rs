//! Prelude module for newsdesk
//!
//! Re-exports the items needed for typical usage with a single
//! `use newsdesk::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use newsdesk::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let endpoint = ServiceEndpoint::new("https://news.example.co", "anon-key")?;
//!     let client = Arc::new(RestClient::new(endpoint, &ClientConfig::default())?);
//!     let hooks = ArticleHooks::new(client, FeedConfig::default());
//!
//!     let trending = hooks.use_trending().settled().await;
//!     println!("{} trending", trending.data.len());
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, FetchError, FetchResult, Result};

// Essential app components
pub use crate::app::{
    Article,
    ArticleCategory,
    // Hooks
    ArticleHooks,
    ArticleRepository,
    ClientConfig,
    FeedConfig,
    // Preload
    PreloadBootstrap,
    PreloadConfig,
    PreloadHandle,
    QueryHandle,
    QueryState,
    // Clients
    RemoteDataClient,
    RestClient,
    SearchConfig,
    SearchController,
    ServiceEndpoint,
    SnapshotClient,
};

// Configuration
pub use crate::config::AppConfig;
