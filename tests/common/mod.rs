// Shared test helpers
// Author: Gabriel Demetrios Lafis

#![allow(dead_code)]

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use topledger_explorer::data::{ApiConfig, HttpMethod, Row};
use topledger_explorer::fetch::{FetchError, RowFetcher, RowRequest};

/// Build an API descriptor pointing at a results endpoint
pub fn api(id: &str, columns: &[&str]) -> ApiConfig {
    ApiConfig {
        id: id.to_string(),
        name: format!("API {}", id),
        endpoint: format!("https://analytics.topledger.xyz/tl/api/queries/{}/results?api_key=key-{}", id, id),
        method: HttpMethod::Get,
        columns: columns.iter().map(|c| c.to_string()).collect(),
        chart_title: None,
        api_key: None,
        additional_options: None,
        page: None,
    }
}

/// Parse a JSON array of objects into rows
pub fn rows(value: JsonValue) -> Vec<Row> {
    serde_json::from_value(value).expect("rows must be an array of objects")
}

/// Fetcher answering from canned responses matched by URL fragment
#[derive(Default)]
pub struct StubFetcher {
    routes: Vec<(String, Result<Vec<Row>, FetchError>, Duration)>,
    requests: Mutex<Vec<RowRequest>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer requests whose URL contains `fragment`
    pub fn route(mut self, fragment: &str, response: Result<Vec<Row>, FetchError>) -> Self {
        self.routes.push((fragment.to_string(), response, Duration::ZERO));
        self
    }

    /// Like `route`, but only after a delay
    pub fn slow_route(mut self, fragment: &str, response: Result<Vec<Row>, FetchError>, delay: Duration) -> Self {
        self.routes.push((fragment.to_string(), response, delay));
        self
    }

    pub fn requests(&self) -> Vec<RowRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RowFetcher for StubFetcher {
    async fn fetch_rows(&self, request: &RowRequest) -> Result<Vec<Row>, FetchError> {
        self.requests.lock().unwrap().push(request.clone());

        let (response, delay) = self
            .routes
            .iter()
            .find(|(fragment, _, _)| request.url.contains(fragment.as_str()))
            .map(|(_, response, delay)| (response.clone(), *delay))
            .unwrap_or_else(|| (Err(FetchError::Http { status: 404, body: "no route".to_string() }), Duration::ZERO));

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        response
    }
}
