// API server implementation
// Author: Gabriel Demetrios Lafis

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use log::info;
use url::Url;

use crate::data::ApiCatalog;
use crate::fetch::{
    CachedFetcher, DatasetDefinition, FallbackPolicy, RemoteDataset, RowFetcher, TopLedgerClient,
};
use crate::storage::{FileStorage, MemoryStorage, VisualizationStore};
use crate::utils::{AppError, AppResult, Config};
use super::routes;

/// Dataset sharing the server's fetcher
pub type SharedDataset = RemoteDataset<Arc<dyn RowFetcher>>;

/// State shared by all handlers
pub struct AppState {
    pub catalog: Arc<ApiCatalog>,
    pub fetcher: Arc<dyn RowFetcher>,
    pub upstream: Url,
    pub store: Arc<dyn VisualizationStore + Send + Sync>,
    pub datasets: HashMap<String, SharedDataset>,
}

impl AppState {
    /// Wire up the catalog, upstream client, cache, store and datasets
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let catalog = Arc::new(ApiCatalog::load(&config.cache.api_cache_path));
        let client = TopLedgerClient::new(&config.upstream)?;
        let upstream = client.base_url().clone();

        let dataset_urls: Vec<(String, String)> = config
            .datasets
            .iter()
            .map(|def| (def.id.clone(), client.query_url(&def.query_id, def.api_key.as_deref())))
            .collect();

        let mut cached = CachedFetcher::new(client);
        if let Some(ttl) = config.cache.response_ttl() {
            cached = cached.with_ttl(ttl);
        }
        let fetcher: Arc<dyn RowFetcher> = Arc::new(cached);

        let store: Arc<dyn VisualizationStore + Send + Sync> = match config.storage.type_.as_str() {
            "file" => {
                let path = config.storage.path.clone().unwrap_or_else(|| "./visualizations".to_string());
                Arc::new(FileStorage::new(path)?)
            },
            "memory" => Arc::new(MemoryStorage::new()),
            other => return Err(AppError::Config(format!("Unknown storage type: {}", other))),
        };

        let datasets = config
            .datasets
            .iter()
            .cloned()
            .zip(dataset_urls)
            .map(|(definition, (id, url))| {
                let dataset = RemoteDataset::new(definition, fetcher.clone(), url, config.upstream.fallback);
                (id, dataset)
            })
            .collect();

        Ok(AppState {
            catalog,
            fetcher,
            upstream,
            store,
            datasets,
        })
    }

    /// State over explicit parts, without dashboard datasets
    pub fn new(
        catalog: ApiCatalog,
        fetcher: Arc<dyn RowFetcher>,
        upstream: Url,
        store: Arc<dyn VisualizationStore + Send + Sync>,
    ) -> Self {
        AppState {
            catalog: Arc::new(catalog),
            fetcher,
            upstream,
            store,
            datasets: HashMap::new(),
        }
    }

    /// Register a dashboard dataset reading from `url`
    pub fn with_dataset(mut self, definition: DatasetDefinition, url: impl Into<String>, fallback: FallbackPolicy) -> Self {
        let id = definition.id.clone();
        let dataset = RemoteDataset::new(definition, self.fetcher.clone(), url, fallback);
        self.datasets.insert(id, dataset);
        self
    }
}

/// API server configuration
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            workers: num_cpus::get(),
            enable_cors: false,
        }
    }
}

/// API server
pub struct Server {
    config: ServerConfig,
    state: web::Data<AppState>,
}

impl Server {
    /// Create a new API server
    pub fn new(state: AppState, config: ServerConfig) -> Self {
        Server {
            config,
            state: web::Data::new(state),
        }
    }

    /// Run the API server
    pub async fn run(&self) -> std::io::Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let addr = addr.parse::<SocketAddr>().map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("{}: {}", addr, e))
        })?;

        let state = self.state.clone();
        let enable_cors = self.config.enable_cors;

        info!("Starting server at http://{}", addr);

        HttpServer::new(move || {
            let cors = if enable_cors {
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600)
            } else {
                Cors::default()
            };

            App::new()
                .app_data(state.clone())
                .wrap(cors)
                .configure(routes::configure)
        })
        .workers(self.config.workers)
        .bind(addr)?
        .run()
        .await
    }
}
