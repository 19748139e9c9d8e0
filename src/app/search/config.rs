//! Search debounce configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::search;

/// Configuration for the debounced search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Quiet period after the last change before dispatch
    pub debounce: Duration,
    /// Queries with fewer characters clear the results without a request
    pub min_query_chars: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce: search::DEBOUNCE,
            min_query_chars: search::MIN_QUERY_CHARS,
        }
    }
}

impl SearchConfig {
    /// Set the debounce quiet period
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Set the minimum query length, in characters
    pub fn with_min_query_chars(mut self, chars: usize) -> Self {
        self.min_query_chars = chars;
        self
    }

    /// Whether `text` is long enough to be dispatched
    pub fn accepts(&self, text: &str) -> bool {
        text.chars().count() >= self.min_query_chars
    }
}
