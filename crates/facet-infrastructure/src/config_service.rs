//! Endpoint configuration service.
//!
//! Loads `~/.config/facet/config.json` and caches it. The `FACET_ENDPOINT`
//! environment variable overrides the configured endpoint; a missing or
//! unreadable file falls back to the built-in default.

use crate::json_store::JsonStore;
use crate::paths::FacetPaths;
use facet_core::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::RwLock;

/// Endpoint used when nothing else is configured.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8787/api/chat";

/// Environment variable overriding the configured endpoint.
pub const ENDPOINT_ENV_VAR: &str = "FACET_ENDPOINT";

/// Persisted application configuration.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct AppConfig {
    /// URL of the chat endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Provider selected at startup; must name a registry entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            provider: None,
        }
    }
}

/// Configuration service that loads and caches the application config.
pub struct ConfigService {
    store: JsonStore,
    cached: RwLock<Option<AppConfig>>,
}

impl ConfigService {
    /// Creates a service reading the default config path.
    pub fn new() -> Result<Self> {
        let paths = FacetPaths::new(None)?;
        Ok(Self::with_path(paths.config_file()))
    }

    /// Creates a service reading a custom path (for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            store: JsonStore::new(path),
            cached: RwLock::new(None),
        }
    }

    /// Gets the configuration, loading from file on first access.
    ///
    /// The environment override is applied after loading so that it always
    /// wins over the file content.
    pub async fn get_config(&self) -> AppConfig {
        {
            let cached = self.cached.read().await;
            if let Some(config) = cached.as_ref() {
                return config.clone();
            }
        }

        let mut config: AppConfig = self.store.load_or_default().await;
        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV_VAR) {
            if !endpoint.trim().is_empty() {
                config.endpoint = endpoint;
            }
        }

        let mut cached = self.cached.write().await;
        *cached = Some(config.clone());
        config
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub async fn invalidate_cache(&self) {
        let mut cached = self.cached.write().await;
        *cached = None;
    }
}
