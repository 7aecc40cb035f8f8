// Join benchmarks
// Author: Gabriel Demetrios Lafis

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use chrono::{Duration, NaiveDate};
use serde_json::json;

use topledger_explorer::{
    data::{normalize_date, ApiCatalog, ApiConfig, ColumnData, HttpMethod, Row},
    processing::{generate_joined_table, DateColumnMapping},
};

fn api(id: &str) -> ApiConfig {
    ApiConfig {
        id: id.to_string(),
        name: id.to_uppercase(),
        endpoint: format!("https://analytics.topledger.xyz/tl/api/queries/{}/results", id),
        method: HttpMethod::Get,
        columns: vec!["block_date".to_string(), "value".to_string()],
        chart_title: None,
        api_key: None,
        additional_options: None,
        page: None,
    }
}

fn daily_rows(days: i64, offset: i64) -> Vec<Row> {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).expect("valid start date");

    (0..days)
        .map(|day| {
            let date = start + Duration::days(day + offset);
            let mut row = Row::new();
            row.insert("block_date".to_string(), json!(format!("{}T00:00:00Z", date.format("%Y-%m-%d"))));
            row.insert("value".to_string(), json!(day * 3));
            row
        })
        .collect()
}

fn columns_for(apis: &[ApiConfig], days: i64) -> Vec<ColumnData> {
    apis.iter()
        .enumerate()
        .flat_map(|(i, api)| {
            let rows = daily_rows(days, i as i64 * 7);
            vec![
                ColumnData::loaded(api, "block_date", rows.clone()),
                ColumnData::loaded(api, "value", rows),
            ]
        })
        .collect()
}

fn bench_multi_api_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("multi_api_join");

    for days in [90i64, 365, 1460] {
        let apis: Vec<ApiConfig> = ["fees", "burn", "tps"].iter().map(|id| api(id)).collect();
        let catalog = ApiCatalog::from_configs(apis.clone());
        let columns = columns_for(&apis, days);
        let mapping = DateColumnMapping::new();

        group.bench_with_input(BenchmarkId::from_parameter(days), &columns, |b, columns| {
            b.iter(|| generate_joined_table(black_box(columns), &catalog, &mapping))
        });
    }

    group.finish();
}

fn bench_positional_join(c: &mut Criterion) {
    let fees = api("fees");
    let catalog = ApiCatalog::from_configs(vec![fees.clone()]);
    let rows = daily_rows(1460, 0);
    let columns = vec![
        ColumnData::loaded(&fees, "block_date", rows.clone()),
        ColumnData::loaded(&fees, "value", rows),
    ];
    let mapping = DateColumnMapping::new();

    c.bench_function("positional_join_1460", |b| {
        b.iter(|| generate_joined_table(black_box(&columns), &catalog, &mapping))
    });
}

fn bench_normalize_date(c: &mut Criterion) {
    let inputs = ["2024-01-15T10:20:30Z", "2024-01", "01/15/2024", "March 3, 2021", "garbage"];

    c.bench_function("normalize_date", |b| {
        b.iter(|| {
            for input in inputs {
                black_box(normalize_date(black_box(input)));
            }
        })
    });
}

criterion_group!(benches, bench_multi_api_join, bench_positional_join, bench_normalize_date);
criterion_main!(benches);
