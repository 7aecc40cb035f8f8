// Storage tests
// Author: Gabriel Demetrios Lafis

mod common;

use chrono::{Duration, Utc};
use serde_json::json;
use tempfile::tempdir;

use common::{api, rows};
use topledger_explorer::{
    data::{ApiCatalog, ColumnData},
    processing::{generate_joined_table, ChartConfiguration, ChartKind, DateColumnMapping, JoinedTable, VisualizationKind},
    storage::{validate_id, FileStorage, MemoryStorage, SavedVisualization, StorageError, VisualizationStore},
};

fn table() -> JoinedTable {
    let fees = api("fees", &["block_date", "fees"]);
    let catalog = ApiCatalog::from_configs(vec![fees.clone()]);
    let data = rows(json!([
        {"block_date": "2024-01-01", "fees": 10},
        {"block_date": "2024-01-02", "fees": 20},
    ]));

    let columns = vec![
        ColumnData::loaded(&fees, "block_date", data.clone()),
        ColumnData::loaded(&fees, "fees", data),
    ];
    generate_joined_table(&columns, &catalog, &DateColumnMapping::new())
}

fn configuration(name: &str) -> ChartConfiguration {
    ChartConfiguration {
        name: name.to_string(),
        description: "Daily fees".to_string(),
        kind: VisualizationKind::Chart,
        chart_type: ChartKind::Line,
        x_column: "fees_block_date".to_string(),
        y_columns: vec!["fees_fees".to_string()],
        group_by: None,
        series: Vec::new(),
        colors: Vec::new(),
    }
}

#[test]
fn test_snapshot() {
    let visualization = SavedVisualization::snapshot(configuration("Fees"), &table()).unwrap();

    assert_eq!(visualization.name, "Fees");
    assert!(validate_id(&visualization.id).is_ok());
    assert_eq!(visualization.chart_config.title, "Fees");
    assert_eq!(visualization.chart_data.keys, vec!["fees_fees".to_string()]);
    assert_eq!(visualization.chart_data.rows.len(), 2);
    assert_eq!(visualization.chart_data.rows[0]["fees_block_date"], json!("2024-01-01"));
    assert_eq!(visualization.chart_data.rows[1]["fees_fees"].as_f64(), Some(20.0));

    // Invalid configurations are not saved
    let mut invalid = configuration("Fees");
    invalid.y_columns.clear();
    assert!(SavedVisualization::snapshot(invalid, &table()).is_err());

    // Fresh ids per snapshot
    let other = SavedVisualization::snapshot(configuration("Fees"), &table()).unwrap();
    assert_ne!(visualization.id, other.id);
}

#[test]
fn test_file_storage_round_trip() {
    let dir = tempdir().unwrap();
    let storage = FileStorage::new(dir.path().join("visualizations")).unwrap();

    let visualization = SavedVisualization::snapshot(configuration("Fees"), &table()).unwrap();

    assert!(!storage.exists(&visualization.id).unwrap());
    storage.store(&visualization).unwrap();
    assert!(storage.exists(&visualization.id).unwrap());

    let loaded = storage.load(&visualization.id).unwrap();
    assert_eq!(loaded, visualization);

    let all = storage.list().unwrap();
    assert_eq!(all.len(), 1);

    // Saved snapshots are never overwritten
    let mut renamed = visualization.clone();
    renamed.name = "Renamed".to_string();
    assert!(matches!(storage.store(&renamed), Err(StorageError::AlreadyExists(_))));
    assert_eq!(storage.load(&visualization.id).unwrap().name, "Fees");

    storage.delete(&visualization.id).unwrap();
    assert!(matches!(storage.load(&visualization.id), Err(StorageError::NotFound(_))));
    assert!(matches!(storage.delete(&visualization.id), Err(StorageError::NotFound(_))));
    assert!(storage.list().unwrap().is_empty());
}

#[test]
fn test_file_storage_rejects_path_ids() {
    let dir = tempdir().unwrap();
    let storage = FileStorage::new(dir.path()).unwrap();

    assert!(matches!(storage.load("../etc/passwd"), Err(StorageError::InvalidId(_))));
    assert!(matches!(storage.exists("a/b"), Err(StorageError::InvalidId(_))));
    assert!(matches!(storage.delete(""), Err(StorageError::InvalidId(_))));

    let mut visualization = SavedVisualization::snapshot(configuration("Fees"), &table()).unwrap();
    visualization.id = "nested/id".to_string();
    assert!(storage.store(&visualization).is_err());
}

#[test]
fn test_memory_storage_lists_oldest_first() {
    let storage = MemoryStorage::new();
    let now = Utc::now();

    let mut newer = SavedVisualization::snapshot(configuration("Newer"), &table()).unwrap();
    newer.created_at = now;
    let mut older = SavedVisualization::snapshot(configuration("Older"), &table()).unwrap();
    older.created_at = now - Duration::hours(1);

    storage.store(&newer).unwrap();
    storage.store(&older).unwrap();

    let names: Vec<String> = storage.list().unwrap().into_iter().map(|v| v.name).collect();
    assert_eq!(names, vec!["Older".to_string(), "Newer".to_string()]);

    assert_eq!(storage.load(&older.id).unwrap(), older);
    assert!(matches!(storage.store(&older), Err(StorageError::AlreadyExists(_))));
    assert_eq!(storage.list().unwrap().len(), 2);

    storage.delete(&older.id).unwrap();
    assert!(!storage.exists(&older.id).unwrap());
    assert!(matches!(storage.load("missing"), Err(StorageError::NotFound(_))));
}
