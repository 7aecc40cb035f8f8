// Configuration utilities
// Author: Gabriel Demetrios Lafis

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::data::DEFAULT_API_CACHE_PATH;
use crate::fetch::{DatasetDefinition, FallbackPolicy, RetryPolicy};
use super::AppError;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub cache: CacheConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub datasets: Vec<DatasetDefinition>,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    pub enable_cors: bool,
}

/// Analytics API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub fallback: FallbackPolicy,
}

/// Snapshot and response cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub api_cache_path: String,
    pub response_ttl_secs: Option<u64>,
}

/// Saved visualization storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    #[serde(rename = "type")]
    pub type_: String,
    pub path: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            workers: None,
            enable_cors: false,
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        UpstreamConfig {
            base_url: "https://analytics.topledger.xyz".to_string(),
            api_key: None,
            timeout_secs: 20,
            max_retries: 3,
            base_delay_ms: 1000,
            fallback: FallbackPolicy::Disabled,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            api_cache_path: DEFAULT_API_CACHE_PATH.to_string(),
            response_ttl_secs: Some(300),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            type_: "memory".to_string(),
            path: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
        }
    }
}

impl CacheConfig {
    pub fn response_ttl(&self) -> Option<Duration> {
        self.response_ttl_secs.map(Duration::from_secs)
    }
}

impl Config {
    /// Load configuration from a `.json`, `.yaml` or `.yml` file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let path = path.as_ref();
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or_default();

        let config = match extension {
            "json" => serde_json::from_str(&contents).map_err(|e| AppError::Config(e.to_string()))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents).map_err(|e| AppError::Config(e.to_string()))?,
            _ => {
                return Err(AppError::Config(format!(
                    "Unsupported config file format: {}",
                    path.display()
                )))
            },
        };

        Ok(config)
    }

    /// Get the log level filter
    pub fn log_level_filter(&self) -> log::LevelFilter {
        match self.logging.level.to_lowercase().as_str() {
            "off" => log::LevelFilter::Off,
            "error" => log::LevelFilter::Error,
            "warn" => log::LevelFilter::Warn,
            "info" => log::LevelFilter::Info,
            "debug" => log::LevelFilter::Debug,
            "trace" => log::LevelFilter::Trace,
            _ => log::LevelFilter::Info,
        }
    }

    /// Worker count for the HTTP server
    pub fn workers(&self) -> usize {
        self.server.workers.unwrap_or_else(num_cpus::get)
    }
}
