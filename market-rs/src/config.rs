use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub search: SearchConfig,
    pub analytics: AnalyticsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub listen_addr: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub database_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// TTL for cached search results, in seconds
    pub cache_ttl_seconds: u64,
    /// Maximum entries returned per facet group
    pub facet_limit: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalyticsConfig {
    /// Trending entries older than this are pruned
    pub trending_window_days: i64,
    /// Maximum entries surfaced from a per-user search history
    pub history_max_entries: usize,
    /// Retention for history/category-view logs, in days
    pub history_retention_days: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::error::MarketError::Config(e.to_string()))?;

        toml::from_str(&content)
            .map_err(|e| crate::error::MarketError::Config(e.to_string()))
    }

    pub fn default() -> Self {
        Self {
            server: ServerConfig {
                listen_addr: "0.0.0.0:8080".to_string(),
            },
            storage: StorageConfig {
                database_url: "sqlite://market.db".to_string(),
            },
            search: SearchConfig {
                cache_ttl_seconds: 300, // 5 minutes
                facet_limit: 10,
            },
            analytics: AnalyticsConfig {
                trending_window_days: 7,
                history_max_entries: 50,
                history_retention_days: 30,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}
