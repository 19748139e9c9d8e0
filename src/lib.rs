//! newsdesk library
//!
//! Data access and caching for a news site backed by a hosted data and
//! storage service: article queries, a one-shot startup preload shared with
//! the queries, debounced search and view tracking.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};

#[cfg(test)]
mod tests {
    use super::*;
    use constants::{env, feed, search};

    #[test]
    fn test_constants_accessible() {
        assert_eq!(feed::TRENDING_LIMIT, 5);
        assert_eq!(search::MIN_QUERY_CHARS, 2);
        assert_eq!(env::SERVICE_URL, "NEWSDESK_URL");
        assert!(constants::http::USER_AGENT.starts_with("newsdesk/"));
    }

    #[test]
    fn test_error_types() {
        let app_error = AppError::from(errors::PreloadError::AlreadyStarted);
        assert_eq!(app_error.category(), "preload");
        assert!(!app_error.is_recoverable());
    }
}
