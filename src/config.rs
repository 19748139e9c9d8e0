//! Configuration management for newsdesk
//!
//! This module provides unified configuration management with multi-source
//! loading (defaults, TOML file, environment) and zero-config defaults for
//! everything except the service credentials.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::{ClientConfig, FeedConfig, PreloadConfig, SearchConfig, ServiceEndpoint};
use crate::constants::{config as paths, env, feed, http, limits, search};
use crate::errors::{AppError, ConfigError, ConfigResult, Result};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Hosted service location and credentials
    pub service: ServiceConfigToml,
    /// HTTP client settings
    pub client: ClientConfigToml,
    /// Article query limits
    pub feed: FeedConfigToml,
    /// Startup preload settings
    pub preload: PreloadConfigToml,
    /// Search box settings
    pub search: SearchConfigToml,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Where the data comes from
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ServiceConfigToml {
    /// Base URL of the hosted service
    pub url: Option<String>,
    /// Public anonymous key
    pub anon_key: Option<String>,
    /// Read from an exported JSON snapshot instead of the network
    pub snapshot: Option<PathBuf>,
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfigToml {
    /// TCP keep-alive timeout in seconds (None = disabled)
    pub tcp_keepalive_secs: Option<u64>,
    /// Connection pool idle timeout in seconds (None = no timeout)
    pub pool_idle_timeout_secs: Option<u64>,
    /// Maximum connections per host
    pub pool_max_per_host: usize,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Rate limit (requests per second)
    pub rate_limit_rps: u32,
    /// Retries after the first attempt for transient failures
    pub max_retries: u32,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        Self {
            tcp_keepalive_secs: Some(30),
            pool_idle_timeout_secs: Some(http::POOL_IDLE_TIMEOUT.as_secs()),
            pool_max_per_host: http::POOL_MAX_PER_HOST,
            request_timeout_secs: http::DEFAULT_TIMEOUT.as_secs(),
            connect_timeout_secs: http::CONNECT_TIMEOUT.as_secs(),
            rate_limit_rps: limits::DEFAULT_RATE_LIMIT_RPS,
            max_retries: limits::MAX_RETRIES,
        }
    }
}

/// TOML-friendly query limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfigToml {
    pub trending_limit: usize,
    pub featured_limit: usize,
    pub search_limit: usize,
}

impl Default for FeedConfigToml {
    fn default() -> Self {
        Self {
            trending_limit: feed::TRENDING_LIMIT,
            featured_limit: feed::FEATURED_LIMIT,
            search_limit: search::RESULT_LIMIT,
        }
    }
}

/// TOML-friendly preload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreloadConfigToml {
    /// Run the bootstrap before read commands
    pub enabled: bool,
    /// Maximum number of cover images warmed
    pub image_warm_limit: usize,
    /// Minimum splash display time in milliseconds
    pub splash_min_display_ms: u64,
}

impl Default for PreloadConfigToml {
    fn default() -> Self {
        Self {
            enabled: true,
            image_warm_limit: feed::IMAGE_WARM_LIMIT,
            splash_min_display_ms: feed::SPLASH_MIN_DISPLAY.as_millis() as u64,
        }
    }
}

/// TOML-friendly search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfigToml {
    /// Quiet period in milliseconds
    pub debounce_ms: u64,
    /// Minimum query length in characters
    pub min_query_chars: usize,
}

impl Default for SearchConfigToml {
    fn default() -> Self {
        Self {
            debounce_ms: search::DEBOUNCE.as_millis() as u64,
            min_query_chars: search::MIN_QUERY_CHARS,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level for the application
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: paths::DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl LoggingConfig {
    /// The configured level, used when no verbosity flag is given
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for an unknown level name
    pub fn parsed_level(&self) -> ConfigResult<tracing::Level> {
        self.level
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                value: self.level.clone(),
                reason: "Expected one of error, warn, info, debug, trace".to_string(),
            })
    }
}

impl AppConfig {
    /// Convert TOML-friendly configuration to runtime configuration
    pub fn to_runtime_config(&self) -> (ClientConfig, FeedConfig, PreloadConfig, SearchConfig) {
        (
            self.client.to_runtime_config(),
            self.feed.to_runtime_config(),
            self.preload.to_runtime_config(),
            self.search.to_runtime_config(),
        )
    }

    /// Load configuration with multi-source precedence:
    /// 1. Default values
    /// 2. Config file (if exists)
    /// 3. Environment variables
    pub async fn load(config_file_override: Option<PathBuf>) -> Result<Self> {
        let mut config = Self::default();

        let config_path = if let Some(ref path) = config_file_override {
            Some(path.clone())
        } else {
            Self::find_config_file()
        };

        if let Some(path) = config_path {
            if path.exists() {
                debug!("Loading config from: {}", path.display());
                config = Self::load_from_file(&path).await?;
            } else if config_file_override.is_some() {
                return Err(ConfigError::NotFound { path }.into());
            }
        }

        config.apply_overrides(
            std::env::var(env::SERVICE_URL).ok(),
            std::env::var(env::ANON_KEY).ok(),
        );
        Ok(config)
    }

    /// Apply service credentials taken from the environment
    pub fn apply_overrides(&mut self, url: Option<String>, anon_key: Option<String>) {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            debug!("Service URL taken from {}", env::SERVICE_URL);
            self.service.url = Some(url);
        }
        if let Some(key) = anon_key.filter(|k| !k.trim().is_empty()) {
            debug!("Service key taken from {}", env::ANON_KEY);
            self.service.anon_key = Some(key);
        }
    }

    /// Resolve the service endpoint
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingField` when the URL or key is not set
    pub fn service_endpoint(&self) -> Result<ServiceEndpoint> {
        let url = self
            .service
            .url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingField {
                field: format!("service.url (or {})", env::SERVICE_URL),
            })?;
        let key = self
            .service
            .anon_key
            .clone()
            .ok_or_else(|| ConfigError::MissingField {
                field: format!("service.anon_key (or {})", env::ANON_KEY),
            })?;
        Ok(ServiceEndpoint::new(url, key)?)
    }

    /// Write a commented default config file
    ///
    /// Refuses to overwrite an existing file unless `force` is set.
    pub async fn write_default(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            return Err(AppError::generic(format!(
                "Config file already exists: {} (use --force to overwrite)",
                path.display()
            )));
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::generic(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        tokio::fs::write(path, Self::generate_default_config_content())
            .await
            .map_err(|e| {
                AppError::generic(format!(
                    "Failed to write config file {}: {}",
                    path.display(),
                    e
                ))
            })?;

        info!("Wrote default configuration to {}", path.display());
        Ok(())
    }

    /// Render for display with the key masked
    pub fn to_display_toml(&self) -> Result<String> {
        let mut shown = self.clone();
        if let Some(key) = shown.service.anon_key.as_mut() {
            let visible: String = key.chars().take(4).collect();
            *key = format!("{}…", visible);
        }
        toml::to_string_pretty(&shown)
            .map_err(|e| AppError::generic(format!("Failed to render config: {}", e)))
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(format!("./{}", paths::LOCAL_FILE))];
        if let Ok(user_path) = Self::get_default_config_path() {
            search_paths.push(user_path);
        }

        for path in search_paths {
            if path.exists() {
                debug!("Found config file: {}", path.display());
                return Some(path);
            }
        }

        debug!("No config file found in standard locations");
        None
    }

    /// Get the default config file path for the current user
    pub fn get_default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| AppError::generic("Could not determine user config directory"))?;

        Ok(config_dir.join(paths::APP_DIR).join(paths::FILE_NAME))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::generic(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: AppConfig = toml::from_str(&content).map_err(ConfigError::from)?;

        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Generate default configuration content with helpful comments
    pub fn generate_default_config_content() -> String {
        format!(
            r#"# newsdesk configuration
# Any setting left out falls back to its default.

[service]
# Hosted data service. Both can also come from the environment
# ({url_var} and {key_var}, a .env file is read too).
# url = "https://your-project.example.co"
# anon_key = "public-anon-key"

# Read from an exported JSON snapshot instead of the network
# snapshot = "./snapshot.json"

[client]
tcp_keepalive_secs = 30
pool_idle_timeout_secs = {pool_idle}
pool_max_per_host = {pool_max}
request_timeout_secs = {timeout}
connect_timeout_secs = {connect}
rate_limit_rps = {rps}
max_retries = {retries}  # retries after the first attempt, transient failures only

[feed]
trending_limit = {trending}
featured_limit = {featured}
search_limit = {search_limit}

[preload]
enabled = true
image_warm_limit = {warm}
splash_min_display_ms = {splash}

[search]
debounce_ms = {debounce}
min_query_chars = {min_chars}

[logging]
level = "{log_level}"  # error, warn, info, debug, trace; -q, -v and --very-verbose override it
"#,
            url_var = env::SERVICE_URL,
            log_level = paths::DEFAULT_LOG_LEVEL,
            key_var = env::ANON_KEY,
            pool_idle = http::POOL_IDLE_TIMEOUT.as_secs(),
            pool_max = http::POOL_MAX_PER_HOST,
            timeout = http::DEFAULT_TIMEOUT.as_secs(),
            connect = http::CONNECT_TIMEOUT.as_secs(),
            rps = limits::DEFAULT_RATE_LIMIT_RPS,
            retries = limits::MAX_RETRIES,
            trending = feed::TRENDING_LIMIT,
            featured = feed::FEATURED_LIMIT,
            search_limit = search::RESULT_LIMIT,
            warm = feed::IMAGE_WARM_LIMIT,
            splash = feed::SPLASH_MIN_DISPLAY.as_millis(),
            debounce = search::DEBOUNCE.as_millis(),
            min_chars = search::MIN_QUERY_CHARS,
        )
    }
}

impl ClientConfigToml {
    /// Convert to runtime ClientConfig
    pub fn to_runtime_config(&self) -> ClientConfig {
        ClientConfig {
            tcp_keepalive: self.tcp_keepalive_secs.map(Duration::from_secs),
            pool_idle_timeout: self.pool_idle_timeout_secs.map(Duration::from_secs),
            pool_max_per_host: self.pool_max_per_host,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            rate_limit_rps: self.rate_limit_rps,
            max_retries: self.max_retries,
        }
    }
}

impl FeedConfigToml {
    /// Convert to runtime FeedConfig
    pub fn to_runtime_config(&self) -> FeedConfig {
        FeedConfig::default()
            .with_trending_limit(self.trending_limit)
            .with_featured_limit(self.featured_limit)
            .with_search_limit(self.search_limit)
    }
}

impl PreloadConfigToml {
    /// Convert to runtime PreloadConfig
    pub fn to_runtime_config(&self) -> PreloadConfig {
        PreloadConfig::default()
            .with_enabled(self.enabled)
            .with_image_warm_limit(self.image_warm_limit)
            .with_splash_min_display(Duration::from_millis(self.splash_min_display_ms))
    }
}

impl SearchConfigToml {
    /// Convert to runtime SearchConfig
    pub fn to_runtime_config(&self) -> SearchConfig {
        SearchConfig::default()
            .with_debounce(Duration::from_millis(self.debounce_ms))
            .with_min_query_chars(self.min_query_chars)
    }
}
