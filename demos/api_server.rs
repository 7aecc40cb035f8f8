// API server example
// Author: Gabriel Demetrios Lafis

use std::sync::Arc;

use topledger_explorer::{
    api::{AppState, Server, ServerConfig},
    data::ApiCatalog,
    fetch::{CachedFetcher, DatasetDefinition, FallbackPolicy, RowFetcher, TopLedgerClient},
    storage::MemoryStorage,
    utils::{init_logging, UpstreamConfig},
};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    init_logging(log::LevelFilter::Info)?;

    // Upstream client behind a five-minute response cache
    let client = TopLedgerClient::new(&UpstreamConfig::default())?;
    let upstream = client.base_url().clone();
    let burn_url = client.query_url("12435", None);
    let fetcher: Arc<dyn RowFetcher> =
        Arc::new(CachedFetcher::new(client).with_ttl(std::time::Duration::from_secs(300)));

    let burn = DatasetDefinition {
        id: "sol-burn".to_string(),
        title: "SOL Burn".to_string(),
        query_id: "12435".to_string(),
        method: Default::default(),
        date_column: "block_date".to_string(),
        value_columns: vec!["sol_burn".to_string(), "cumulative_sol_burn".to_string()],
        api_key: None,
    };

    let state = AppState::new(
        ApiCatalog::load("public/api-cache.json"),
        fetcher,
        upstream,
        Arc::new(MemoryStorage::new()),
    )
    .with_dataset(burn, burn_url, FallbackPolicy::Placeholder);

    // Create server config
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 8080,
        workers: num_cpus::get(),
        enable_cors: true,
    };

    // Create and run server
    println!("Starting API server at http://{}:{}", config.host, config.port);
    println!("Press Ctrl+C to stop");

    Server::new(state, config).run().await?;
    Ok(())
}
