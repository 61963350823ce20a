use std::path::PathBuf;
use std::time::Duration;

use crate::client::storage::FileStore;
use crate::shared::config::{AppConfig, AppConfigBuilder, ConfigError};

/// Default API base URL
const DEFAULT_API_BASE: &str = "http://localhost:8000";

/// Default per-attempt request timeout
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Client configuration: file/CLI values layered over the environment.
#[derive(Debug, Clone)]
pub struct Config {
    app: AppConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app: Self::from_env(),
        }
    }
}

impl Config {
    /// Create a new configuration from the environment
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builder(builder: AppConfigBuilder) -> Result<Self, ConfigError> {
        Self::with_app_config(builder.build()?)
    }

    /// Layer `app` on top of the environment defaults
    pub fn with_app_config(app: AppConfig) -> Result<Self, ConfigError> {
        let app = Self::from_env().merge(app);
        app.validate()?;
        Ok(Self { app })
    }

    fn from_env() -> AppConfig {
        AppConfig {
            api_base: std::env::var("LEADHUB_API_BASE").ok().filter(|v| !v.is_empty()),
            storage_path: std::env::var_os("LEADHUB_STORAGE_PATH").map(PathBuf::from),
            request_timeout_secs: std::env::var("LEADHUB_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|secs| *secs > 0),
        }
    }

    pub fn api_base(&self) -> &str {
        self.app
            .api_base
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE)
            .trim_end_matches('/')
    }

    /// Get the full URL for an API path. Absolute URLs pass through.
    pub fn api_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path.starts_with('/') {
            format!("{}{}", self.api_base(), path)
        } else {
            format!("{}/{}", self.api_base(), path)
        }
    }

    pub fn storage_path(&self) -> PathBuf {
        self.app
            .storage_path
            .clone()
            .unwrap_or_else(FileStore::default_path)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.app.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}
