//! Query shape configuration for the article hooks

use serde::{Deserialize, Serialize};

use crate::constants::{feed, search};

/// Limits applied to the article query shapes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Maximum number of ranked trending ids requested
    pub trending_limit: usize,
    /// Maximum number of featured articles requested
    pub featured_limit: usize,
    /// Maximum number of search results
    pub search_limit: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            trending_limit: feed::TRENDING_LIMIT,
            featured_limit: feed::FEATURED_LIMIT,
            search_limit: search::RESULT_LIMIT,
        }
    }
}

impl FeedConfig {
    /// Set the trending limit
    pub fn with_trending_limit(mut self, limit: usize) -> Self {
        self.trending_limit = limit;
        self
    }

    /// Set the featured limit
    pub fn with_featured_limit(mut self, limit: usize) -> Self {
        self.featured_limit = limit;
        self
    }

    /// Set the search result limit
    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FeedConfig::default();
        assert_eq!(config.trending_limit, 5);
        assert_eq!(config.featured_limit, 5);
        assert_eq!(config.search_limit, 10);
    }

    #[test]
    fn test_config_builder() {
        let config = FeedConfig::default()
            .with_trending_limit(3)
            .with_featured_limit(2)
            .with_search_limit(20);
        assert_eq!(config.trending_limit, 3);
        assert_eq!(config.featured_limit, 2);
        assert_eq!(config.search_limit, 20);
    }
}
