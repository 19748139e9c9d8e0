//! Preload bootstrap configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::feed;

/// Configuration for the preload bootstrap and splash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreloadConfig {
    /// Run the bootstrap before serving hooks
    pub enabled: bool,
    /// Maximum number of distinct cover images warmed
    pub image_warm_limit: usize,
    /// Minimum time the splash stays up
    pub splash_min_display: Duration,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            image_warm_limit: feed::IMAGE_WARM_LIMIT,
            splash_min_display: feed::SPLASH_MIN_DISPLAY,
        }
    }
}

impl PreloadConfig {
    /// Set the image warm-up bound
    pub fn with_image_warm_limit(mut self, limit: usize) -> Self {
        self.image_warm_limit = limit;
        self
    }

    /// Set the minimum splash display time
    pub fn with_splash_min_display(mut self, duration: Duration) -> Self {
        self.splash_min_display = duration;
        self
    }

    /// Enable or disable the bootstrap
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PreloadConfig::default();
        assert!(config.enabled);
        assert_eq!(config.image_warm_limit, 8);
        assert_eq!(config.splash_min_display, Duration::from_millis(1500));
    }

    #[test]
    fn test_config_builder() {
        let config = PreloadConfig::default()
            .with_image_warm_limit(2)
            .with_splash_min_display(Duration::ZERO)
            .with_enabled(false);
        assert_eq!(config.image_warm_limit, 2);
        assert_eq!(config.splash_min_display, Duration::ZERO);
        assert!(!config.enabled);
    }
}
