//! Application constants for newsdesk
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain for maintainability and clarity.

use std::time::Duration;

/// Environment variable names for the hosted service
pub mod env {
    /// Base URL of the hosted data/storage service
    pub const SERVICE_URL: &str = "NEWSDESK_URL";

    /// Public (anonymous) API key sent with every request
    pub const ANON_KEY: &str = "NEWSDESK_ANON_KEY";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = concat!("newsdesk/", env!("CARGO_PKG_VERSION"));

    /// Default HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum idle connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 8;

    /// Accept header asking the REST layer for exactly one object
    pub const SINGLE_OBJECT_ACCEPT: &str = "application/vnd.pgrst.object+json";
}

/// Rate limiting and retry configuration
pub mod limits {
    /// Default client-side rate limit (requests per second)
    pub const DEFAULT_RATE_LIMIT_RPS: u32 = 20;

    /// Retries after the first attempt for a failed request
    pub const MAX_RETRIES: u32 = 1;

    /// Base delay for exponential backoff (milliseconds)
    pub const RETRY_BASE_DELAY_MS: u64 = 250;

    /// Upper bound for random jitter added to each backoff (milliseconds)
    pub const RETRY_JITTER_MS: u64 = 100;

    /// Longest backoff before jitter, whatever the retry count (milliseconds)
    pub const RETRY_MAX_DELAY_MS: u64 = 30_000;
}

/// Names of tables, procedures and buckets on the hosted service
pub mod service {
    /// REST path prefix for row queries and procedures
    pub const REST_PREFIX: &str = "rest/v1";

    /// Storage path prefix for bucket operations
    pub const STORAGE_PREFIX: &str = "storage/v1";

    /// Articles table
    pub const ARTICLES_TABLE: &str = "articles";

    /// Procedure returning ranked trending article ids
    pub const TRENDING_PROCEDURE: &str = "get_trending_articles";

    /// Procedure incrementing an article's view counter
    pub const VIEW_COUNT_PROCEDURE: &str = "increment_view_count";

    /// Public bucket holding uploaded media
    pub const MEDIA_BUCKET: &str = "media";

    /// Marker object the storage service places in empty folders
    pub const EMPTY_FOLDER_PLACEHOLDER: &str = ".emptyFolderPlaceholder";

    /// Column projection for article rows, with the category joined in
    pub const ARTICLE_SELECT: &str = "id,title,slug,subtitle,excerpt,content,cover_image,status,\
        featured,author_name,published_at,created_at,\
        category:categories(id,name,slug,color,description)";
}

/// Query shapes and preload defaults
pub mod feed {
    use super::Duration;

    /// Maximum number of trending articles requested from the ranking
    pub const TRENDING_LIMIT: usize = 5;

    /// Maximum number of featured articles requested
    pub const FEATURED_LIMIT: usize = 5;

    /// Maximum number of cover images warmed during preload
    pub const IMAGE_WARM_LIMIT: usize = 8;

    /// Minimum time the splash stays up
    pub const SPLASH_MIN_DISPLAY: Duration = Duration::from_millis(1500);

    /// Number of "more stories" shown under an article
    pub const MORE_STORIES: usize = 4;

    /// How long the CLI waits for a view count increment before exiting
    pub const VIEW_RECORD_WAIT: Duration = Duration::from_secs(5);
}

/// Search behaviour
pub mod search {
    use super::Duration;

    /// Quiet period after the last keystroke before a search is dispatched
    pub const DEBOUNCE: Duration = Duration::from_millis(300);

    /// Queries shorter than this (in characters) never hit the network
    pub const MIN_QUERY_CHARS: usize = 2;

    /// Maximum number of search results
    pub const RESULT_LIMIT: usize = 10;
}

/// Configuration file locations
pub mod config {
    /// Project-local configuration file name
    pub const LOCAL_FILE: &str = "newsdesk.toml";

    /// Directory under the user config dir
    pub const APP_DIR: &str = "newsdesk";

    /// File name under the user config dir
    pub const FILE_NAME: &str = "config.toml";

    /// Log level when neither the config file nor a flag sets one
    pub const DEFAULT_LOG_LEVEL: &str = "warn";
}
