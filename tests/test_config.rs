// Configuration and utility tests
// Author: Gabriel Demetrios Lafis

use std::fs;
use std::time::Duration;

use log::Log;
use tempfile::tempdir;

use topledger_explorer::{
    data::DEFAULT_API_CACHE_PATH,
    fetch::FallbackPolicy,
    utils::{init_file_logging, validate_not_blank, validate_not_empty_list, validate_range_order, AppError, Config},
};

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.server.port, 8080);
    assert_eq!(config.upstream.base_url, "https://analytics.topledger.xyz");
    assert_eq!(config.upstream.timeout(), Duration::from_secs(20));
    assert_eq!(config.upstream.retry_policy().max_retries, 3);
    assert_eq!(config.upstream.retry_policy().base_delay, Duration::from_millis(1000));
    assert_eq!(config.upstream.fallback, FallbackPolicy::Disabled);
    assert_eq!(config.cache.api_cache_path, DEFAULT_API_CACHE_PATH);
    assert_eq!(config.cache.response_ttl(), Some(Duration::from_secs(300)));
    assert_eq!(config.storage.type_, "memory");
    assert_eq!(config.log_level_filter(), log::LevelFilter::Info);
    assert!(config.workers() >= 1);
}

#[test]
fn test_yaml_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("explorer.yaml");
    fs::write(
        &path,
        r#"
server:
  port: 9000
  workers: 2
upstream:
  api_key: secret
  max_retries: 5
  base_delay_ms: 10
  fallback: placeholder
storage:
  type: file
  path: ./saved
logging:
  level: debug
datasets:
  - id: sol-burn
    title: SOL Burn
    query_id: "12435"
    date_column: block_date
    value_columns: [sol_burn, cumulative_sol_burn]
"#,
    )
    .unwrap();

    let config = Config::from_file(&path).unwrap();

    // Unset fields keep their defaults
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.workers(), 2);
    assert_eq!(config.upstream.api_key.as_deref(), Some("secret"));
    assert_eq!(config.upstream.retry_policy().delay_for(1), Duration::from_millis(20));
    assert_eq!(config.upstream.fallback, FallbackPolicy::Placeholder);
    assert_eq!(config.storage.type_, "file");
    assert_eq!(config.log_level_filter(), log::LevelFilter::Debug);
    assert_eq!(config.datasets.len(), 1);
    assert_eq!(config.datasets[0].value_columns.len(), 2);
}

#[test]
fn test_json_config_and_errors() {
    let dir = tempdir().unwrap();

    let path = dir.path().join("explorer.json");
    fs::write(&path, r#"{"cache": {"api_cache_path": "cache.json", "response_ttl_secs": null}}"#).unwrap();
    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.cache.api_cache_path, "cache.json");
    assert_eq!(config.cache.response_ttl(), None);

    let path = dir.path().join("explorer.toml");
    fs::write(&path, "port = 1").unwrap();
    assert!(matches!(Config::from_file(&path), Err(AppError::Config(_))));

    let path = dir.path().join("broken.json");
    fs::write(&path, "{").unwrap();
    assert!(matches!(Config::from_file(&path), Err(AppError::Config(_))));

    assert!(matches!(Config::from_file(dir.path().join("missing.yaml")), Err(AppError::Io(_))));
}

#[test]
fn test_validation() {
    assert!(validate_not_blank("x", "name").is_ok());
    assert!(validate_not_blank("  ", "name").is_err());

    assert!(validate_not_empty_list(&["a".to_string()], "yColumns").is_ok());
    assert!(validate_not_empty_list(&[], "yColumns").is_err());
    assert!(validate_not_empty_list(&["a".to_string(), " ".to_string()], "yColumns").is_err());

    assert!(validate_range_order(Some("2024-01-01"), Some("2024-01-31")).is_ok());
    assert!(validate_range_order(Some("2024-01-01"), Some("2024-01-01")).is_ok());
    assert!(validate_range_order(None, Some("2024-01-01")).is_ok());
    assert!(validate_range_order(Some("2024-02-01"), Some("2024-01-31")).is_err());

    // Month and year end bounds cover their whole period
    assert!(validate_range_order(Some("2024-01-15"), Some("2024-01")).is_ok());
    assert!(validate_range_order(Some("2024-12-31"), Some("2024")).is_ok());
    assert!(validate_range_order(Some("2024"), Some("2024-01-05")).is_ok());
    assert!(validate_range_order(Some("2024-02-01"), Some("2024-01")).is_err());
    assert!(validate_range_order(Some("2025-01-01"), Some("2024")).is_err());
}

#[test]
fn test_file_logging() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("explorer.log");

    init_file_logging(log::LevelFilter::Info, &path).unwrap();
    log::info!("catalog loaded");
    log::debug!("filtered out");
    log::logger().flush();

    let contents = fs::read_to_string(&path).unwrap();
    assert!(contents.contains("INFO"));
    assert!(contents.contains("catalog loaded"));
    assert!(!contents.contains("filtered out"));
}
