//! Core application logic for newsdesk
//!
//! This module contains the data-access layer of the news site: the remote
//! data client, the article models, the hooks that query them, the startup
//! preload and the debounced search.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use newsdesk::app::{ArticleHooks, FeedConfig, PreloadHandle, SnapshotClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(SnapshotClient::from_file("snapshot.json".as_ref()).await?);
//! let hooks = ArticleHooks::new(client, FeedConfig::default())
//!     .with_preload(PreloadHandle::detached());
//!
//! let mut latest = hooks.use_articles();
//! for article in latest.settled().await.data {
//!     println!("{}", article.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod articles;
pub mod client;
pub mod models;
pub mod preload;
pub mod search;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export main public API
pub use articles::{
    ArticleHooks, ArticleRepository, ArticleView, FeedConfig, QueryHandle, QueryState,
};
pub use client::{
    ClientConfig, RemoteDataClient, RestClient, RowQuery, ServiceEndpoint, SnapshotClient,
    StorageClient,
};
pub use models::{Article, ArticleCategory, ArticleStatus, CategoryRef, MediaObject};
pub use preload::{
    HttpImagePrefetcher, ImagePrefetcher, PreloadBootstrap, PreloadConfig, PreloadHandle,
    PreloadReport, SplashGate,
};
pub use search::{SearchConfig, SearchController};
