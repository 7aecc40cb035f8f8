// API tests
// Author: Gabriel Demetrios Lafis

mod common;

use std::sync::Arc;

use actix_web::{http::StatusCode, test, web, App};
use mockall::mock;
use serde_json::{json, Value as JsonValue};
use url::Url;

use common::{api, rows, StubFetcher};
use topledger_explorer::{
    api::{configure, AppState},
    data::{ApiCatalog, HttpMethod},
    fetch::{DatasetDefinition, FallbackPolicy, FetchError},
    storage::{SavedVisualization, StorageError, VisualizationStore},
};

mock! {
    pub Store {}

    impl VisualizationStore for Store {
        fn store(&self, visualization: &SavedVisualization) -> Result<(), StorageError>;
        fn load(&self, id: &str) -> Result<SavedVisualization, StorageError>;
        fn exists(&self, id: &str) -> Result<bool, StorageError>;
        fn delete(&self, id: &str) -> Result<(), StorageError>;
        fn list(&self) -> Result<Vec<SavedVisualization>, StorageError>;
    }
}

const UPSTREAM: &str = "https://analytics.topledger.xyz";

fn stub() -> StubFetcher {
    StubFetcher::new()
        .route(
            "key-fees",
            Ok(rows(json!([
                {"block_date": "2024-01-01", "fees": 10},
                {"block_date": "2024-01-02", "fees": 20},
            ]))),
        )
        .route(
            "key-burn",
            Ok(rows(json!([
                {"block_date": "2024-01-02T00:00:00Z", "sol_burn": 2},
            ]))),
        )
        .route("key-empty", Err(FetchError::NoCachedData("No cached result found".to_string())))
        .route(
            "queries/12435/",
            Ok(rows(json!([
                {"block_date": "2024-01-01", "sol_burn": 1, "cumulative_sol_burn": 1},
                {"block_date": "2024-01-02", "sol_burn": 2, "cumulative_sol_burn": 3},
                {"block_date": "2024-01-03", "sol_burn": 3, "cumulative_sol_burn": 6},
            ]))),
        )
}

fn state(fetcher: StubFetcher, store: MockStore) -> web::Data<AppState> {
    let catalog = ApiCatalog::from_configs(vec![
        api("fees", &["block_date", "fees"]),
        api("burn", &["block_date", "sol_burn"]),
        api("empty", &["value"]),
    ]);

    let definition = DatasetDefinition {
        id: "sol-burn".to_string(),
        title: "SOL Burn".to_string(),
        query_id: "12435".to_string(),
        method: HttpMethod::Get,
        date_column: "block_date".to_string(),
        value_columns: vec!["sol_burn".to_string(), "cumulative_sol_burn".to_string()],
        api_key: None,
    };

    let state = AppState::new(catalog, Arc::new(fetcher), Url::parse(UPSTREAM).unwrap(), Arc::new(store))
        .with_dataset(
            definition,
            format!("{}/tl/api/queries/12435/results.json", UPSTREAM),
            FallbackPolicy::Disabled,
        );

    web::Data::new(state)
}

fn join_body() -> JsonValue {
    json!({
        "selections": [
            {"apiId": "fees", "columnName": "fees"},
            {"apiId": "burn", "columnName": "sol_burn"},
        ],
        "dateColumnMapping": {"fees": "block_date", "burn": "block_date"},
    })
}

#[actix_web::test]
async fn test_health_and_catalog() {
    let app = test::init_service(App::new().app_data(state(stub(), MockStore::new())).configure(configure)).await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: JsonValue = test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/v1/apis").to_request()).await;
    assert_eq!(body["count"], json!(3));
    assert_eq!(body["apis"][0]["id"], json!("fees"));

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/apis/missing").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_api_rows_and_no_data() {
    let app = test::init_service(App::new().app_data(state(stub(), MockStore::new())).configure(configure)).await;

    let body: JsonValue =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/v1/apis/fees/rows").to_request()).await;
    assert_eq!(body["count"], json!(2));

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/apis/empty/rows").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: JsonValue = test::read_body_json(resp).await;
    assert_eq!(body["kind"], json!("no_data"));
}

#[actix_web::test]
async fn test_proxy() {
    let app = test::init_service(App::new().app_data(state(stub(), MockStore::new())).configure(configure)).await;

    // Other hosts are refused
    let req = test::TestRequest::get()
        .uri("/api/proxy?url=https%3A%2F%2Fevil.example.com%2Fsteal")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Upstream targets come back in the canonical envelope
    let req = test::TestRequest::post()
        .uri("/api/proxy")
        .set_json(json!({
            "url": format!("{}/tl/api/queries/fees/results.json?api_key=key-fees", UPSTREAM),
            "parameters": {"currency": "USD"},
        }))
        .to_request();
    let body: JsonValue = test::call_and_read_body_json(&app, req).await;

    let rows = body["query_result"]["data"]["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
}

#[actix_web::test]
async fn test_explorer_join() {
    let app = test::init_service(App::new().app_data(state(stub(), MockStore::new())).configure(configure)).await;

    let req = test::TestRequest::post().uri("/api/v1/explorer/join").set_json(join_body()).to_request();
    let body: JsonValue = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["table"]["needsDateMapping"], json!(false));

    let rows = body["table"]["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["date"], json!("2024-01-01"));
    assert_eq!(rows[0]["fees_fees"], json!(10));
    assert_eq!(rows[0]["burn_sol_burn"], json!("-"));
    assert_eq!(rows[1]["burn_sol_burn"], json!(2));

    assert_eq!(body["columns"].as_array().unwrap().len(), 2);

    // Unknown APIs and empty selections are client errors
    let req = test::TestRequest::post()
        .uri("/api/v1/explorer/join")
        .set_json(json!({"selections": [{"apiId": "nope", "columnName": "x"}]}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri("/api/v1/explorer/join")
        .set_json(json!({"selections": []}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_chart_config() {
    let app = test::init_service(App::new().app_data(state(stub(), MockStore::new())).configure(configure)).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/explorer/chart-config")
        .set_json(json!({
            "name": "Fees vs burn",
            "chartType": "bar",
            "xColumn": "date",
            "yColumns": ["fees_fees", "burn_sol_burn"],
            "series": [{"field": "burn_sol_burn", "axis": "right", "type": "line"}],
        }))
        .to_request();
    let body: JsonValue = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["chartType"], json!("dual_axis"));

    let req = test::TestRequest::post()
        .uri("/api/v1/explorer/chart-config")
        .set_json(json!({"name": "Empty", "xColumn": "date", "yColumns": []}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_save_visualization() {
    let mut store = MockStore::new();
    store.expect_exists().never();
    store.expect_store().times(1).returning(|_| Ok(()));

    let app = test::init_service(App::new().app_data(state(stub(), store)).configure(configure)).await;

    let mut body = join_body();
    body["configuration"] = json!({
        "name": "Fees",
        "chartType": "line",
        "xColumn": "date",
        "yColumns": ["fees_fees"],
    });

    let req = test::TestRequest::post().uri("/api/v1/visualizations").set_json(&body).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let saved: JsonValue = test::read_body_json(resp).await;
    assert_eq!(saved["name"], json!("Fees"));
    assert_eq!(saved["chartConfig"]["chartType"], json!("line"));
    assert_eq!(saved["chartData"]["rows"].as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn test_save_visualization_id_taken() {
    let mut store = MockStore::new();
    store
        .expect_store()
        .times(1)
        .returning(|visualization| Err(StorageError::AlreadyExists(visualization.id.clone())));

    let app = test::init_service(App::new().app_data(state(stub(), store)).configure(configure)).await;

    let mut body = join_body();
    body["configuration"] = json!({
        "name": "Fees",
        "xColumn": "date",
        "yColumns": ["fees_fees"],
    });

    let req = test::TestRequest::post().uri("/api/v1/visualizations").set_json(&body).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn test_save_visualization_requires_date_mapping() {
    let mut store = MockStore::new();
    store.expect_exists().never();
    store.expect_store().never();

    let app = test::init_service(App::new().app_data(state(stub(), store)).configure(configure)).await;

    let mut body = join_body();
    body["dateColumnMapping"] = json!({"fees": "block_date"});
    body["configuration"] = json!({
        "name": "Fees",
        "xColumn": "date",
        "yColumns": ["fees_fees"],
    });

    let req = test::TestRequest::post().uri("/api/v1/visualizations").set_json(&body).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_visualization_lookup_errors() {
    let mut store = MockStore::new();
    store
        .expect_load()
        .times(1)
        .returning(|id| Err(StorageError::NotFound(id.to_string())));
    store.expect_delete().returning(|id| Err(StorageError::InvalidId(id.to_string())));
    store.expect_list().returning(|| Ok(Vec::new()));

    let app = test::init_service(App::new().app_data(state(stub(), store)).configure(configure)).await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/visualizations/missing").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = test::call_service(&app, test::TestRequest::delete().uri("/api/v1/visualizations/bad.id").to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: JsonValue =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/v1/visualizations").to_request()).await;
    assert_eq!(body["count"], json!(0));
}

#[actix_web::test]
async fn test_dataset_brushing() {
    let app = test::init_service(App::new().app_data(state(stub(), MockStore::new())).configure(configure)).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/datasets/sol-burn?start=2024-01-02&currency=USD")
        .to_request();
    let body: JsonValue = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["title"], json!("SOL Burn"));
    assert_eq!(body["result"]["state"], json!("live"));
    assert_eq!(body["fullDomain"]["start"], json!("2024-01-01"));
    assert_eq!(body["brushed"]["points"].as_array().unwrap().len(), 2);

    let legend = body["legend"].as_array().unwrap();
    assert_eq!(legend.len(), 2);
    assert_eq!(legend[0]["field"], json!("cumulative_sol_burn"));

    let req = test::TestRequest::get()
        .uri("/api/v1/datasets/sol-burn?start=2024-01-03&end=2024-01-01")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get().uri("/api/v1/datasets/unknown").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}
